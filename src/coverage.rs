//! Extended coverage of goals and plans.
//!
//! Coverage estimates the probability that a goal can still be achieved from a
//! random world: a plan's extended coverage is the product of its sub-goals'
//! coverage, and a goal's coverage sums, over every non-empty subset of its
//! plans, the probability that exactly that subset is applicable times the best
//! coverage among its members.
//!
//! The estimator is exact for plans whose precondition is a single literal.
//! Multi-literal preconditions would need a model counter; such goals are
//! reported with a warning and get coverage 1.

use tracing::warn;

use crate::{
    beliefs::Condition,
    forest::{GoalPlanForest, NodeId, PlanNode, TreeNode},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageCalculator;

impl CoverageCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute and store `Bc`/`Ec` for every plan and goal of every intention.
    pub fn annotate(&self, forest: &mut GoalPlanForest) {
        let roots = forest.roots().to_vec();
        for root in roots {
            self.annotate_goal(forest, root);
        }
    }

    fn annotate_goal(&self, forest: &mut GoalPlanForest, goal: NodeId) -> f64 {
        let plans: Vec<NodeId> = forest.plans_of(goal).map(|(id, _)| id).collect();
        for plan in plans {
            let subgoals: Vec<NodeId> = forest
                .plan(plan)
                .map(|p| p.body().to_vec())
                .unwrap_or_default()
                .into_iter()
                .filter(|&step| forest.goal(step).is_some())
                .collect();
            let extended = subgoals
                .into_iter()
                .map(|subgoal| self.annotate_goal(forest, subgoal))
                .product::<f64>();
            let basic = forest
                .plan(plan)
                .map(|p| self.basic_coverage(p))
                .unwrap_or(1.0);
            if let TreeNode::Plan(node) = forest.node_mut(plan) {
                node.basic_coverage = basic;
                node.extended_coverage = extended;
            }
        }

        let coverage = self.goal_coverage(forest, goal);
        if let TreeNode::Goal(node) = forest.node_mut(goal) {
            node.extended_coverage = coverage;
        }
        coverage
    }

    /// `1 / 2^|precondition|`.
    pub fn basic_coverage(&self, plan: &PlanNode) -> f64 {
        let count = plan.precondition.len();
        if count > 1 {
            warn!(
                plan = %plan.name,
                literals = count,
                "plan precondition has more than one literal; basic coverage needs a model counter"
            );
        }
        1.0 / 2f64.powi(count as i32)
    }

    /// Product of the stored coverage of the sub-goals in the plan body.
    pub fn plan_coverage(&self, forest: &GoalPlanForest, plan: NodeId) -> f64 {
        forest
            .plan(plan)
            .map(|p| {
                p.body()
                    .iter()
                    .filter_map(|&step| forest.goal(step))
                    .map(|goal| goal.extended_coverage())
                    .product()
            })
            .unwrap_or(1.0)
    }

    /// Coverage of `goal` from the stored coverage of its plans.
    pub fn goal_coverage(&self, forest: &GoalPlanForest, goal: NodeId) -> f64 {
        let plans: Vec<NodeId> = forest.plans_of(goal).map(|(id, _)| id).collect();
        if self.has_multi_literal_plan(forest, goal) {
            return 1.0;
        }
        (1..=plans.len())
            .map(|k| self.comb_coverage(forest, &plans, k))
            .sum()
    }

    /// Sum of subset contributions over every subset of `plans` of size `k`.
    pub fn comb_coverage(&self, forest: &GoalPlanForest, plans: &[NodeId], k: usize) -> f64 {
        let nodes: Vec<&PlanNode> = plans.iter().filter_map(|&id| forest.plan(id)).collect();
        combinations(nodes.len(), k)
            .iter()
            .map(|subset| subset_coverage(&nodes, subset))
            .sum()
    }

    /// Closed-form shortcut: `Ec(P1)` when two plans have opposite
    /// preconditions, else `(2^n - 1) / 2^n * Ec(P1)`.
    ///
    /// Agrees with [`goal_coverage`](Self::goal_coverage) for depth-one goals
    /// whose plans use distinct literals or complementary pairs.
    pub fn quick_goal_coverage(&self, forest: &GoalPlanForest, goal: NodeId) -> f64 {
        let plans: Vec<&PlanNode> = forest.plans_of(goal).map(|(_, plan)| plan).collect();
        let Some(first) = plans.first() else {
            return 0.0;
        };
        let first_ec = first.extended_coverage();

        let mut checked: Vec<Condition> = Vec::new();
        for plan in &plans {
            let Some(&condition) = plan.precondition.first() else {
                continue;
            };
            if checked.iter().any(|seen| seen.is_opposite(&condition)) {
                return first_ec;
            }
            checked.push(condition);
        }

        let total = 2f64.powi(plans.len() as i32);
        (total - 1.0) / total * first_ec
    }

    fn has_multi_literal_plan(&self, forest: &GoalPlanForest, goal: NodeId) -> bool {
        let offending = forest
            .plans_of(goal)
            .find(|(_, plan)| plan.precondition.len() > 1);
        if let Some((_, plan)) = offending {
            warn!(
                goal = forest.node(goal).name(),
                plan = %plan.name,
                "multi-literal plan precondition; goal coverage approximated as 1"
            );
            return true;
        }
        false
    }
}

/// Probability that exactly the plans in `selected` are applicable, scaled by
/// the best extended coverage among them.
fn subset_coverage(plans: &[&PlanNode], selected: &[usize]) -> f64 {
    let mut env: Vec<Condition> = Vec::new();

    for (i, plan) in plans.iter().enumerate() {
        let precondition = plan.precondition.first().copied();
        if selected.contains(&i) {
            // An unconditional member constrains nothing.
            let Some(condition) = precondition else {
                continue;
            };
            if env.iter().any(|c| c.is_opposite(&condition)) {
                return 0.0;
            }
            env.push(condition);
        } else {
            // An unconditional plan can never be inapplicable.
            let Some(condition) = precondition else {
                return 0.0;
            };
            if env.iter().any(|c| c.is_same(&condition)) {
                return 0.0;
            }
            env.push(condition.negated());
        }
    }

    let mut literals: Vec<_> = env.iter().map(Condition::literal).collect();
    literals.sort_unstable();
    literals.dedup();

    let max_ec = selected
        .iter()
        .map(|&i| plans[i].extended_coverage())
        .fold(0.0, f64::max);

    max_ec / 2f64.powi(literals.len() as i32)
}

/// Every `k`-element subset of `0..n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            extend(i + 1, n, k, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    extend(0, n, k, &mut Vec::with_capacity(k), &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestBuilder;

    fn single_goal(preconditions: &[&[&str]]) -> (GoalPlanForest, NodeId) {
        let mut builder = ForestBuilder::new("cov");
        let goal = builder.intention("G");
        for (i, pre) in preconditions.iter().enumerate() {
            let plan = builder.plan(goal, &format!("P{i}"), pre).unwrap();
            builder.action(plan, &format!("a{i}"), &[], &["Done"]).unwrap();
        }
        (builder.build().unwrap(), goal)
    }

    #[test]
    fn combinations_enumerate_in_order() {
        assert_eq!(
            combinations(3, 2),
            vec![vec![0, 1], vec![0, 2], vec![1, 2]]
        );
        assert!(combinations(2, 3).is_empty());
        assert!(combinations(2, 0).is_empty());
    }

    #[test]
    fn complementary_plans_cover_everything() {
        let (forest, goal) = single_goal(&[&["A"], &["!A"]]);
        let ec = forest.goal(goal).unwrap().extended_coverage();
        assert!((ec - 1.0).abs() < 1e-12);
    }

    #[test]
    fn independent_plans_cover_three_quarters() {
        let (forest, goal) = single_goal(&[&["A"], &["B"]]);
        let calculator = CoverageCalculator::new();
        let plans = forest.goal(goal).unwrap().plans().to_vec();

        assert!((calculator.comb_coverage(&forest, &plans, 1) - 0.5).abs() < 1e-12);
        assert!((calculator.comb_coverage(&forest, &plans, 2) - 0.25).abs() < 1e-12);
        assert!((forest.goal(goal).unwrap().extended_coverage() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn unconditional_single_plan_is_fully_covered() {
        let (forest, goal) = single_goal(&[&[]]);
        assert_eq!(forest.goal(goal).unwrap().extended_coverage(), 1.0);

        let (forest, goal) = single_goal(&[&["A"]]);
        assert_eq!(forest.goal(goal).unwrap().extended_coverage(), 0.5);
    }

    #[test]
    fn multi_literal_preconditions_fall_back_to_one() {
        let (forest, goal) = single_goal(&[&["A", "B"], &["C"]]);
        let plan = forest.goal(goal).unwrap().plans()[0];

        assert_eq!(forest.goal(goal).unwrap().extended_coverage(), 1.0);
        assert_eq!(forest.plan(plan).unwrap().basic_coverage(), 0.25);
    }

    #[test]
    fn nested_goals_multiply_into_plan_coverage() {
        let mut builder = ForestBuilder::new("nested");
        let top = builder.intention("G");
        let plan = builder.plan(top, "P", &[]).unwrap();
        let sub = builder.subgoal(plan, "S").unwrap();
        for (name, pre) in [("S1", "A"), ("S2", "B")] {
            let p = builder.plan(sub, name, &[pre]).unwrap();
            builder.action(p, "a", &[], &["X"]).unwrap();
        }
        let forest = builder.build().unwrap();
        let calculator = CoverageCalculator::new();

        let plan_ec = forest.plan(plan).unwrap().extended_coverage();
        assert!((plan_ec - 0.75).abs() < 1e-12);
        assert!((calculator.plan_coverage(&forest, plan) - 0.75).abs() < 1e-12);
        assert!((forest.goal(top).unwrap().extended_coverage() - 0.75).abs() < 1e-12);
        assert_eq!(forest.plan(plan).unwrap().basic_coverage(), 1.0);
    }

    #[test]
    fn closed_form_matches_enumeration_on_depth_one_goals() {
        let calculator = CoverageCalculator::new();
        for preconditions in [
            vec![&["A"][..], &["B"][..]],
            vec![&["A"][..], &["!A"][..]],
            vec![&["A"][..], &["B"][..], &["C"][..]],
            vec![&["A"][..]],
        ] {
            let (forest, goal) = single_goal(&preconditions);
            let exact = calculator.goal_coverage(&forest, goal);
            let quick = calculator.quick_goal_coverage(&forest, goal);
            assert!(
                (exact - quick).abs() < 1e-12,
                "{preconditions:?}: {exact} vs {quick}"
            );
        }
    }
}
