//! Ports (trait boundaries) between the match engine and its collaborators.
//!
//! Scheduling policies plug into matches through [`Scheduler`]; experiment
//! drivers report results through [`MatchObserver`].

pub mod observer;
pub mod scheduler;

pub use observer::MatchObserver;
pub use scheduler::{MatchBinding, MatchContext, Scheduler};
