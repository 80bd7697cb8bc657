use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Relationship between the agents of a match. It labels the match; policies
/// express cooperation through their assumed politeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllianceType {
    Allied,
    #[default]
    Neutral,
    Adversarial,
}

impl fmt::Display for AllianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AllianceType::Allied => "allied",
            AllianceType::Neutral => "neutral",
            AllianceType::Adversarial => "adversarial",
        };
        f.write_str(name)
    }
}

impl FromStr for AllianceType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allied" => Ok(AllianceType::Allied),
            "neutral" => Ok(AllianceType::Neutral),
            "adversarial" => Ok(AllianceType::Adversarial),
            _ => Err(Error::ParseAllianceType {
                input: s.to_string(),
                expected: "allied, neutral, adversarial".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_strings() {
        for alliance in [
            AllianceType::Allied,
            AllianceType::Neutral,
            AllianceType::Adversarial,
        ] {
            assert_eq!(alliance.to_string().parse::<AllianceType>().unwrap(), alliance);
        }
        assert!("hostile".parse::<AllianceType>().is_err());
    }
}
