use std::{fmt, time::Duration};

use serde::Serialize;

use crate::state::State;

/// Why a match stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every intention finished.
    Completed,
    /// No agent had anything it could do.
    Stalemate,
    /// Too many deliberate passes in a row.
    Repetition,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Termination::Completed => "completed",
            Termination::Stalemate => "stalemate",
            Termination::Repetition => "repetition",
        };
        f.write_str(name)
    }
}

/// Outcome for one agent slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResult {
    pub name: String,
    /// Sum of intention values over the completed intentions the agent
    /// scores.
    pub score: f64,
    /// Completed intentions the agent owns.
    pub completed: usize,
}

/// Everything known about a finished match.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub match_name: String,
    pub forest_name: String,
    pub assumed_politeness: f64,
    pub mirror: bool,
    pub final_state: State,
    pub termination: Termination,
    /// Turns in which an agent acted or deliberately passed.
    pub turns: usize,
    pub duration: Duration,
    pub agents: Vec<AgentResult>,
}

impl MatchReport {
    pub fn total_completed(&self) -> usize {
        self.agents.iter().map(|a| a.completed).sum()
    }

    /// Index of the agent with the highest score; `None` on a tie.
    pub fn winner(&self) -> Option<usize> {
        let best = self
            .agents
            .iter()
            .map(|a| a.score)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut leaders = self
            .agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.score == best);
        match (leaders.next(), leaders.next()) {
            (Some((i, _)), None) => Some(i),
            _ => None,
        }
    }
}
