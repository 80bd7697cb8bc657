//! Match engine: agents take turns progressing the intentions they own over
//! a shared belief base until every intention is done, nobody can move, or
//! the agents keep passing.

pub mod alliance;
pub mod engine;
pub mod report;

pub use alliance::AllianceType;
pub use engine::{MAX_CONSECUTIVE_PASSES, Match, MatchConfig};
pub use report::{AgentResult, MatchReport, Termination};
