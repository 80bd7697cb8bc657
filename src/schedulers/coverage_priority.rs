//! Coverage-driven scheduling (C0 / C1).
//!
//! Intentions whose remaining goals have the lowest extended coverage are the
//! most likely to be blocked by later world changes, so they are progressed
//! first.

use std::{any::Any, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    Error, Result,
    ports::{MatchBinding, MatchContext, Scheduler, scheduler::bound},
    state::{Decision, State},
};

use super::move_with_plan;

/// Whether the scheduler keeps its focus between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageType {
    /// Stay with the focused intention while it is progressable.
    C0,
    /// Re-rank every turn.
    C1,
}

impl fmt::Display for CoverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageType::C0 => write!(f, "C0"),
            CoverageType::C1 => write!(f, "C1"),
        }
    }
}

impl FromStr for CoverageType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "C0" => Ok(CoverageType::C0),
            "C1" => Ok(CoverageType::C1),
            _ => Err(Error::ParseSchedulerKind {
                input: s.to_string(),
                expected: "C0, C1".to_string(),
            }),
        }
    }
}

/// Product of the extended coverage of every goal still ahead of the
/// intention's current step. Completed intentions have coverage 0.
pub fn intention_coverage(state: &State, intention: usize) -> f64 {
    let Some(step) = state.current_step(intention) else {
        return 0.0;
    };
    let forest = state.forest();
    forest
        .remaining_steps(step)
        .filter_map(|id| forest.goal(id))
        .map(|goal| goal.extended_coverage())
        .product()
}

/// Coverage of every intention of `state`.
pub(crate) fn coverage_vector(state: &State) -> Vec<f64> {
    let coverage: Vec<f64> = (0..state.num_intentions())
        .map(|i| intention_coverage(state, i))
        .collect();
    trace!(?coverage, "intention coverage");
    coverage
}

/// Ranks the agent's intentions by ascending coverage and progresses the first
/// one that can move, always with its first applicable plan.
pub struct CScheduler {
    name: String,
    coverage_type: CoverageType,
    binding: Option<MatchBinding>,
    focus: Option<usize>,
}

impl CScheduler {
    pub fn new(name: impl Into<String>, coverage_type: CoverageType) -> Self {
        Self {
            name: name.into(),
            coverage_type,
            binding: None,
            focus: None,
        }
    }

    pub fn c0() -> Self {
        Self::new("C0", CoverageType::C0)
    }

    pub fn c1() -> Self {
        Self::new("C1", CoverageType::C1)
    }

    pub fn coverage_type(&self) -> CoverageType {
        self.coverage_type
    }

    /// The intention currently focused by a C0 scheduler.
    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    fn select(state: &State, available: &[bool]) -> Option<usize> {
        let coverage = coverage_vector(state);
        let mut ranked: Vec<usize> = (0..state.num_intentions())
            .filter(|&i| available.get(i).copied().unwrap_or(false))
            .collect();
        // Stable, so equal coverage keeps index order.
        ranked.sort_by(|&a, &b| coverage[a].total_cmp(&coverage[b]));
        ranked.into_iter().find(|&i| state.progressable(i))
    }
}

impl Scheduler for CScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self) {
        self.focus = None;
    }

    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool) {
        self.binding = Some(MatchBinding::new(context, agent, mirror));
    }

    fn decide(&mut self, state: &State) -> Result<Decision> {
        let binding = bound(&self.binding, &self.name)?;

        let keep_focus = self.coverage_type == CoverageType::C0
            && self.focus.is_some_and(|i| state.progressable(i));
        if !keep_focus {
            self.focus = Self::select(state, binding.available());
        }

        Ok(match self.focus {
            Some(intention) => Decision::progress(move_with_plan(state, intention, |plans| {
                plans.first().copied()
            })),
            None => Decision::forced(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        beliefs::BeliefBase,
        forest::ForestBuilder,
        schedulers::test_support::{bind, ladder},
    };

    /// Intention 0 has coverage 1 (unconditional plan), intention 2 has
    /// coverage 3/4 (two independent single-literal plans).
    fn ranked_state() -> State {
        let mut builder = ForestBuilder::new("ranked");
        for i in 0..4 {
            let goal = builder.intention(&format!("G{i}"));
            if i == 2 {
                for (name, pre) in [("Px", "X"), ("Py", "Y")] {
                    let plan = builder.plan(goal, name, &[pre]).unwrap();
                    builder.action(plan, "a", &[], &["Z"]).unwrap();
                }
            } else {
                let plan = builder.plan(goal, "P", &[]).unwrap();
                builder.action(plan, "a", &[], &["Z"]).unwrap();
                builder.action(plan, "b", &[], &["W"]).unwrap();
            }
        }
        let y = builder.literal("Y");
        let forest = builder.build().unwrap();
        let mut beliefs = BeliefBase::with_len(forest.vocabulary().len());
        beliefs.set(y, true);
        State::new(Arc::new(forest), beliefs, 0)
    }

    #[test]
    fn lowest_coverage_intention_goes_first() {
        let state = ranked_state();
        assert!((intention_coverage(&state, 0) - 1.0).abs() < 1e-12);
        assert!((intention_coverage(&state, 2) - 0.75).abs() < 1e-12);

        let mut scheduler = CScheduler::c1();
        bind(&mut scheduler, 4, 0);
        let decision = scheduler.decide(&state).unwrap();
        // Only plan Py (index 1) is applicable.
        assert_eq!(decision.intention, Some(2));
        assert_eq!(decision.plan, Some(1));
    }

    #[test]
    fn completed_intentions_have_zero_coverage() {
        let mut state = ranked_state();
        state.set_current_step(1, None);
        assert_eq!(intention_coverage(&state, 1), 0.0);
    }

    #[test]
    fn c0_keeps_focus_and_c1_reranks() {
        let mut c0 = CScheduler::c0();
        let mut c1 = CScheduler::c1();
        bind(&mut c0, 4, 0);
        bind(&mut c1, 4, 0);

        // Equal coverage everywhere: index order decides.
        let state = ladder(&[2]);
        assert_eq!(c0.decide(&state).unwrap().intention, Some(2));
        assert_eq!(c0.focus(), Some(2));

        let state = ladder(&[0, 2]);
        assert_eq!(c0.decide(&state).unwrap().intention, Some(2));
        assert_eq!(c1.decide(&state).unwrap().intention, Some(0));
    }

    #[test]
    fn forced_pass_when_nothing_owned_can_move() {
        let mut scheduler = CScheduler::c1();
        bind(&mut scheduler, 4, 1);
        assert!(scheduler.decide(&ladder(&[0, 2])).unwrap().forced_pass);
    }
}
