//! Observer port - abstraction for experiment observation and data collection
//!
//! Experiment drivers report finished matches through this trait, so result
//! persistence, progress display and summary statistics stay out of the match
//! loop itself.

use crate::{Result, simulation::MatchReport};

/// Observer trait for monitoring experiments
///
/// # Event Sequence
///
/// 1. `on_experiment_start(total_matches)` - once at the beginning
/// 2. `on_match_end(report)` - after every match, mirror matches included
/// 3. `on_experiment_end()` - once at the end
///
/// # Examples
///
/// ```no_run
/// use intention_scheduler::{ports::MatchObserver, simulation::MatchReport};
///
/// struct CompletionCounter {
///     completed: usize,
/// }
///
/// impl MatchObserver for CompletionCounter {
///     fn on_match_end(&mut self, report: &MatchReport) -> intention_scheduler::Result<()> {
///         self.completed += report.agents.iter().map(|a| a.completed).sum::<usize>();
///         Ok(())
///     }
/// }
/// ```
pub trait MatchObserver: Send {
    /// Called before the first match.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn on_experiment_start(&mut self, _total_matches: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each match with its report.
    fn on_match_end(&mut self, report: &MatchReport) -> Result<()>;

    /// Called after the last match. Use this to flush outputs or print summaries.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    fn on_experiment_end(&mut self) -> Result<()> {
        Ok(())
    }
}
