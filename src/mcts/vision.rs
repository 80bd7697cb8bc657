use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// How much of the other agents' intentions an MCTS agent can see.
///
/// An agent always sees its own intentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionType {
    /// Every intention is visible.
    #[default]
    Full,
    /// Only the agent's own intentions are visible.
    Unaware,
    /// Every other round of ownership assignment is visible: intention `i` is
    /// visible when `(i / num_agents) % 2 == 0`.
    PartiallyAware,
}

impl VisionType {
    /// Visibility mask for `agent`, given the owner of every intention.
    pub fn visible_mask(
        self,
        num_intentions: usize,
        num_agents: usize,
        agent: usize,
        owner: impl Fn(usize) -> usize,
    ) -> Vec<bool> {
        (0..num_intentions)
            .map(|i| {
                owner(i) == agent
                    || match self {
                        VisionType::Full => true,
                        VisionType::PartiallyAware => (i / num_agents.max(1)) % 2 == 0,
                        VisionType::Unaware => false,
                    }
            })
            .collect()
    }
}

impl fmt::Display for VisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VisionType::Full => "full",
            VisionType::Unaware => "unaware",
            VisionType::PartiallyAware => "partially_aware",
        };
        f.write_str(name)
    }
}

impl FromStr for VisionType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "full" | "fully_aware" => Ok(VisionType::Full),
            "unaware" => Ok(VisionType::Unaware),
            "partial" | "partially_aware" => Ok(VisionType::PartiallyAware),
            _ => Err(Error::ParseVisionType {
                input: s.to_string(),
                expected: "full, partially_aware, unaware".to_string(),
            }),
        }
    }
}
