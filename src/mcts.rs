//! Monte-Carlo tree search scheduling.

pub mod node;
pub mod search;
pub mod vision;

pub use node::{MctsArena, MctsNode};
pub use search::{MctsScheduler, SearchSummary};
pub use vision::VisionType;
