//! Experiment pipeline abstractions
//!
//! This module provides:
//! - The roster of scheduler kinds and how to build them
//! - The experiment driver that pairs them under every alliance mode
//! - Observers that record progress and summary statistics

pub mod experiment;
pub mod observers;
pub mod roster;

pub use experiment::{AgentPlan, ExperimentRunner, ExperimentSummary, MatchPlan, initial_state};
pub use observers::{ProgressObserver, SchedulerStats, SummaryObserver};
pub use roster::SchedulerKind;

pub use crate::ports::MatchObserver;
