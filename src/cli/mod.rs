//! CLI infrastructure for the intention scheduler
//!
//! This module provides the command-line interface for playing matches,
//! running full experiments, inspecting coverage and generating forests.

pub mod commands;
pub mod output;
