//! Multi-agent intention scheduling
//!
//! This crate provides:
//! - Goal-plan forests over a shared boolean belief base, loaded from JSON or
//!   generated synthetically
//! - Coverage annotations that estimate how safe a plan or goal is to pursue
//! - Scheduling policies, from FIFO and coverage priority to an MCTS agent
//! - A turn-based match engine with alliance modes and mirror matches
//! - An experiment pipeline pairing every scheduler with CSV result export

pub mod beliefs;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod export;
pub mod forest;
pub mod mcts;
pub mod pipeline;
pub mod ports;
pub mod schedulers;
pub mod simulation;
pub mod state;

pub use beliefs::{BeliefBase, Condition, Literal, Vocabulary};
pub use error::{Error, Result};
pub use forest::{ForestInstance, ForestSpec, GoalPlanForest, NodeId};
pub use state::{Decision, Move, State};
