//! Seeded generator of synthetic goal-plan forests.
//!
//! Each tree `i` gets a goal literal `G-i` (initially false) and shares the
//! environment literals `EV-0..EV-n` (initially random). Top-level plans are
//! guarded by complementary `p / !p` pairs, so some plan of every top-level
//! goal is always applicable. Actions depend on literals established earlier
//! in their plan and flip environment literals, which is what makes
//! intentions interfere with each other.

use rand::{Rng, SeedableRng, random, rngs::StdRng};
use tracing::debug;

use crate::{
    Result,
    beliefs::{BeliefBase, Condition},
    config::GeneratorConfig,
};

use super::{ForestBuilder, ForestInstance, NodeId};

/// Produces [`ForestInstance`]s from a [`GeneratorConfig`].
pub struct SynthGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

/// Per-tree naming counters.
#[derive(Default)]
struct TreeCounters {
    tree: usize,
    goals: usize,
    plans: usize,
    actions: usize,
}

impl TreeCounters {
    fn goal_name(&mut self) -> String {
        self.goals += 1;
        format!("T{}-G{}", self.tree, self.goals - 1)
    }

    fn plan_name(&mut self) -> String {
        self.plans += 1;
        format!("T{}-P{}", self.tree, self.plans - 1)
    }

    fn action_name(&mut self) -> String {
        self.actions += 1;
        format!("T{}-A{}", self.tree, self.actions - 1)
    }
}

impl SynthGenerator {
    /// Create a generator, seeded from the config or from entropy.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(random);
        Ok(Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one forest named `name` together with its initial beliefs.
    pub fn generate(&mut self, name: &str) -> Result<ForestInstance> {
        let mut builder = ForestBuilder::new(name);

        let goal_literals: Vec<_> = (0..self.config.num_trees)
            .map(|i| builder.literal(&format!("G-{i}")))
            .collect();
        // Initial value of every environment literal.
        let environment: Vec<Condition> = (0..self.config.num_vars)
            .map(|i| {
                let literal = builder.literal(&format!("EV-{i}"));
                Condition::new(literal, self.rng.random())
            })
            .collect();

        for (tree, &goal_literal) in goal_literals.iter().enumerate() {
            let mut counters = TreeCounters {
                tree,
                ..TreeCounters::default()
            };
            let goal = builder.intention(&counters.goal_name());
            let goal_conditions = vec![Condition::positive(goal_literal)];
            builder.set_goal_conditions(goal, goal_conditions.clone())?;

            let safe = self.make_safe(&environment, self.config.plans_per_goal);
            self.populate_goal(
                &mut builder,
                &mut counters,
                &environment,
                goal,
                &goal_conditions,
                1,
                safe,
            )?;
        }

        let forest = builder.build()?;
        let mut beliefs = BeliefBase::with_len(forest.vocabulary().len());
        beliefs.apply(&environment);
        debug!(
            forest = name,
            nodes = forest.len(),
            intentions = forest.num_intentions(),
            "generated forest"
        );
        Ok(ForestInstance { forest, beliefs })
    }

    /// Pairs `p, !p` of random environment literals, at least `target` long.
    fn make_safe(&mut self, environment: &[Condition], target: usize) -> Vec<Condition> {
        let mut pool: Vec<Condition> = environment.to_vec();
        let mut safe = Vec::with_capacity(target + 1);
        while safe.len() < target && !environment.is_empty() {
            if pool.is_empty() {
                pool = environment.to_vec();
            }
            let condition = pool.remove(self.rng.random_range(0..pool.len()));
            safe.push(condition);
            safe.push(condition.negated());
        }
        safe
    }

    /// Add plans to `goal`; returns the literals its plans may establish.
    #[allow(clippy::too_many_arguments)]
    fn populate_goal(
        &mut self,
        builder: &mut ForestBuilder,
        counters: &mut TreeCounters,
        environment: &[Condition],
        goal: NodeId,
        goal_conditions: &[Condition],
        depth: usize,
        mut preconditions: Vec<Condition>,
    ) -> Result<Vec<Condition>> {
        let num_plans = if self.rng.random::<f64>() < self.config.single_plan_probability {
            1
        } else {
            self.config.plans_per_goal
        };

        if preconditions.is_empty() {
            preconditions = self.make_safe(environment, num_plans);
        }
        while preconditions.len() < num_plans {
            preconditions.extend_from_slice(&preconditions.clone());
        }

        let mut potential: Vec<Condition> = Vec::new();
        for _ in 0..num_plans {
            let precondition = preconditions.remove(self.rng.random_range(0..preconditions.len()));
            let plan = builder.plan_with(goal, &counters.plan_name(), vec![precondition])?;
            let established = self.populate_plan(
                builder,
                counters,
                environment,
                plan,
                precondition,
                goal_conditions,
                depth,
                num_plans,
            )?;
            for condition in established {
                if !potential.contains(&condition) {
                    potential.push(condition);
                }
            }
        }
        Ok(potential)
    }

    /// Fill a plan body; returns the literals the plan is certain to establish.
    #[allow(clippy::too_many_arguments)]
    fn populate_plan(
        &mut self,
        builder: &mut ForestBuilder,
        counters: &mut TreeCounters,
        environment: &[Condition],
        plan: NodeId,
        precondition: Condition,
        goal_conditions: &[Condition],
        depth: usize,
        sibling_plans: usize,
    ) -> Result<Vec<Condition>> {
        let mut internal = vec![precondition];
        let mut unsafe_pool = internal.clone();
        let flipped: Vec<Condition> = environment.iter().map(Condition::negated).collect();
        let mut effects: Vec<Condition> = flipped
            .iter()
            .copied()
            .filter(|c| !internal.contains(c))
            .collect();
        let mut certain = Vec::new();

        for i in 0..self.config.actions_per_plan {
            let pre = internal[self.rng.random_range(0..internal.len())];
            let post = self.draw(&mut effects, &flipped);
            internal.push(post);
            certain.push(post);

            let mut postcondition = vec![post];
            if depth == self.config.depth && i + 1 == self.config.actions_per_plan {
                postcondition.extend_from_slice(goal_conditions);
            }
            builder.action_with(plan, &counters.action_name(), vec![pre], postcondition)?;
        }

        if depth < self.config.depth {
            for i in 0..self.config.subgoals_per_plan {
                let preconditions = self.subgoal_preconditions(&internal, &unsafe_pool, sibling_plans);

                let condition = self.draw(&mut effects, &flipped);
                let mut conditions = vec![condition];
                if i + 1 == self.config.subgoals_per_plan {
                    conditions.extend_from_slice(goal_conditions);
                }
                let subgoal = builder.subgoal_with(plan, &counters.goal_name(), conditions.clone())?;
                let potential = self.populate_goal(
                    builder,
                    counters,
                    environment,
                    subgoal,
                    &conditions,
                    depth + 1,
                    preconditions,
                )?;
                unsafe_pool.extend(potential);

                internal.push(condition);
                certain.push(condition);
            }
        }
        Ok(certain)
    }

    /// Sub-goal plan guards: a `safety_factor` share drawn from literals the
    /// plan has established, the rest from literals that may or may not hold.
    fn subgoal_preconditions(
        &mut self,
        internal: &[Condition],
        unsafe_pool: &[Condition],
        num_plans: usize,
    ) -> Vec<Condition> {
        let num_safe = (self.config.safety_factor * num_plans as f64).ceil() as usize;
        let mut chosen = Vec::with_capacity(num_plans);

        let mut safe_bag: Vec<Condition> = internal.to_vec();
        while chosen.len() < num_safe && !internal.is_empty() {
            if safe_bag.is_empty() {
                safe_bag = internal.to_vec();
            }
            chosen.push(safe_bag.remove(self.rng.random_range(0..safe_bag.len())));
        }

        let refill = if unsafe_pool.is_empty() {
            internal
        } else {
            unsafe_pool
        };
        let mut unsafe_bag: Vec<Condition> = unsafe_pool.to_vec();
        while chosen.len() < num_plans && !refill.is_empty() {
            if unsafe_bag.is_empty() {
                unsafe_bag = refill.to_vec();
            }
            chosen.push(unsafe_bag.remove(self.rng.random_range(0..unsafe_bag.len())));
        }
        chosen
    }

    /// Take a random effect literal, refilling the pool once it runs dry.
    fn draw(&mut self, pool: &mut Vec<Condition>, refill: &[Condition]) -> Condition {
        if pool.is_empty() {
            pool.extend_from_slice(refill);
        }
        pool.remove(self.rng.random_range(0..pool.len()))
    }
}
