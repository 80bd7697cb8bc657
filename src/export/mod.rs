//! Export of experiment results for offline analysis.
//!
//! Currently supports appending match results to a CSV table.

mod results_csv;

pub use results_csv::{CLONE_SUFFIX, MatchResultsWriter};
