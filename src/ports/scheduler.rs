//! Scheduler port - the contract every intention-scheduling policy implements
//!
//! A match binds each scheduler to an agent slot before play starts. The
//! binding carries the ownership masks of every agent, so a policy can tell
//! which intentions it may progress and, for look-ahead policies, which ones
//! the other agents may progress.

use std::any::Any;

use crate::{
    Error, Result,
    simulation::AllianceType,
    state::{Decision, State},
};

/// Match-wide settings a scheduler sees when it is bound to an agent slot.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub name: String,
    pub num_intentions: usize,
    pub num_agents: usize,
    pub alliance: AllianceType,
    pub assumed_politeness: f64,
    /// Per-agent, per-intention values used for scoring.
    pub intention_values: Vec<Vec<f64>>,
}

impl MatchContext {
    /// Agent that owns `intention`: round-robin assignment, shifted by one in
    /// mirror matches.
    pub fn owner(&self, intention: usize, mirror: bool) -> usize {
        owner_of(intention, self.num_agents, mirror)
    }
}

pub(crate) fn owner_of(intention: usize, num_agents: usize, mirror: bool) -> usize {
    if num_agents == 0 {
        return 0;
    }
    if mirror {
        (intention + 1) % num_agents
    } else {
        intention % num_agents
    }
}

/// A scheduler's view of the match it was bound to.
#[derive(Debug, Clone)]
pub struct MatchBinding {
    pub agent: usize,
    pub mirror: bool,
    pub num_agents: usize,
    pub alliance: AllianceType,
    pub assumed_politeness: f64,
    available: Vec<Vec<bool>>,
    values: Vec<Vec<f64>>,
}

impl MatchBinding {
    pub fn new(context: &MatchContext, agent: usize, mirror: bool) -> Self {
        let available = (0..context.num_agents)
            .map(|a| {
                (0..context.num_intentions)
                    .map(|i| context.owner(i, mirror) == a)
                    .collect()
            })
            .collect();
        let values = (0..context.num_agents)
            .map(|a| {
                (0..context.num_intentions)
                    .map(|i| {
                        context
                            .intention_values
                            .get(a)
                            .and_then(|row| row.get(i))
                            .copied()
                            .unwrap_or(1.0)
                    })
                    .collect()
            })
            .collect();

        Self {
            agent,
            mirror,
            num_agents: context.num_agents,
            alliance: context.alliance,
            assumed_politeness: context.assumed_politeness,
            available,
            values,
        }
    }

    pub fn num_intentions(&self) -> usize {
        self.available.first().map_or(0, Vec::len)
    }

    /// Ownership mask of the bound agent.
    pub fn available(&self) -> &[bool] {
        self.available_for(self.agent)
    }

    /// Ownership mask of any agent in the match. Empty for unknown agents.
    pub fn available_for(&self, agent: usize) -> &[bool] {
        self.available.get(agent).map_or(&[], Vec::as_slice)
    }

    /// Intention values of the bound agent.
    pub fn values(&self) -> &[f64] {
        self.values_for(self.agent)
    }

    pub fn values_for(&self, agent: usize) -> &[f64] {
        self.values.get(agent).map_or(&[], Vec::as_slice)
    }
}

/// Scheduler trait - unified interface for all intention-scheduling policies
///
/// The match engine drives a scheduler through this sequence:
/// 1. `reset()` before a fresh match
/// 2. `load_match_details(...)` to bind it to an agent slot
/// 3. `decide(state)` once per turn the agent is asked to act
///
/// Implementations must be `Send` so that MCTS rollouts can run on worker
/// threads.
pub trait Scheduler: Send {
    /// Display name used in logs and reports.
    fn name(&self) -> &str;

    /// Clear any focus or memory carried over from an earlier match.
    fn reset(&mut self) {}

    /// Bind to an agent slot of the match described by `context`.
    fn load_match_details(&mut self, context: &MatchContext, agent: usize, mirror: bool);

    /// Choose what to do with the state on this agent's turn.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundScheduler`] when called before
    /// `load_match_details`, or any error raised while searching.
    fn decide(&mut self, state: &State) -> Result<Decision>;

    /// Intentions that count toward this scheduler's score. `None` means the
    /// agent's ownership mask.
    fn scoring_mask(&self) -> Option<&[bool]> {
        None
    }

    /// Reseed the internal random number generator. Deterministic policies
    /// ignore it.
    fn set_rng_seed(&mut self, _seed: u64) {}

    /// Enable downcasting to concrete types.
    fn as_any(&self) -> &dyn Any;
}

/// Borrow the binding of a scheduler or report that it was never bound.
pub(crate) fn bound<'a>(binding: &'a Option<MatchBinding>, name: &str) -> Result<&'a MatchBinding> {
    binding.as_ref().ok_or_else(|| Error::UnboundScheduler {
        scheduler: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(num_intentions: usize, num_agents: usize) -> MatchContext {
        MatchContext {
            name: "ctx".to_string(),
            num_intentions,
            num_agents,
            alliance: AllianceType::Neutral,
            assumed_politeness: 0.0,
            intention_values: vec![vec![2.0; num_intentions]],
        }
    }

    #[test]
    fn ownership_is_round_robin_and_shifts_in_mirror_matches() {
        let ctx = context(4, 2);
        let normal = MatchBinding::new(&ctx, 0, false);
        let mirror = MatchBinding::new(&ctx, 0, true);

        assert_eq!(normal.available(), &[true, false, true, false]);
        assert_eq!(normal.available_for(1), &[false, true, false, true]);
        assert_eq!(mirror.available(), &[false, true, false, true]);
        assert_eq!(normal.num_intentions(), 4);
    }

    #[test]
    fn missing_values_default_to_one() {
        let ctx = context(2, 2);
        let binding = MatchBinding::new(&ctx, 1, false);
        assert_eq!(binding.values_for(0), &[2.0, 2.0]);
        assert_eq!(binding.values(), &[1.0, 1.0]);
        assert!(binding.available_for(7).is_empty());
    }
}
