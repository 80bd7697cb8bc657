//! Observers for experiment runs
//!
//! Observers allow composable data collection during experiments without
//! coupling the pairing loops to specific output formats.

use std::collections::BTreeMap;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::{Result, export::CLONE_SUFFIX, ports::MatchObserver, simulation::MatchReport};

/// Progress bar observer - Shows experiment progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    matches: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            matches: 0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchObserver for ProgressObserver {
    fn on_experiment_start(&mut self, total_matches: usize) -> Result<()> {
        let pb = ProgressBar::new(total_matches as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} matches {msg}")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_match_end(&mut self, report: &MatchReport) -> Result<()> {
        self.matches += 1;
        if let Some(pb) = &self.progress_bar {
            pb.set_position(self.matches as u64);
            pb.set_message(report.match_name.clone());
        }
        Ok(())
    }

    fn on_experiment_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message("done");
        }
        Ok(())
    }
}

/// Per-scheduler aggregate over all matches it played.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchedulerStats {
    pub matches: usize,
    pub total_score: f64,
    pub completed: usize,
}

impl SchedulerStats {
    pub fn mean_score(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.total_score / self.matches as f64
        }
    }

    pub fn mean_completed(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.completed as f64 / self.matches as f64
        }
    }
}

/// Summary observer - Tracks per-scheduler scores and completions
///
/// Statistics are keyed by alliance mode and scheduler name; the `_clone`
/// copy of a self-pairing counts toward the same scheduler.
#[derive(Debug, Default)]
pub struct SummaryObserver {
    stats: BTreeMap<(String, String), SchedulerStats>,
}

impl SummaryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics keyed by `(alliance prefix, scheduler name)`.
    pub fn stats(&self) -> &BTreeMap<(String, String), SchedulerStats> {
        &self.stats
    }

    pub fn get(&self, mode: &str, scheduler: &str) -> Option<&SchedulerStats> {
        self.stats.get(&(mode.to_string(), scheduler.to_string()))
    }

    /// One line per mode and scheduler, sorted.
    pub fn table(&self) -> String {
        let mut lines = vec![format!(
            "{:<12} {:<24} {:>8} {:>10} {:>10}",
            "mode", "scheduler", "matches", "score", "completed"
        )];
        for ((mode, name), stats) in &self.stats {
            lines.push(format!(
                "{:<12} {:<24} {:>8} {:>10.3} {:>10.3}",
                mode,
                name,
                stats.matches,
                stats.mean_score(),
                stats.mean_completed()
            ));
        }
        lines.join("\n")
    }
}

impl MatchObserver for SummaryObserver {
    fn on_match_end(&mut self, report: &MatchReport) -> Result<()> {
        let mode = report
            .match_name
            .split('_')
            .next()
            .unwrap_or_default()
            .to_string();
        for agent in &report.agents {
            let name = agent.name.replace(CLONE_SUFFIX, "");
            let entry = self.stats.entry((mode.clone(), name)).or_default();
            entry.matches += 1;
            entry.total_score += agent.score;
            entry.completed += agent.completed;
        }
        Ok(())
    }
}
