//! Match results as CSV, one row per match.
//!
//! The file is appended to, so several experiment runs can share one results
//! table. The header is written only when the file does not exist yet.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{Error, Result, ports::MatchObserver, simulation::MatchReport};

/// Suffix that marks the second copy of a scheduler in a self-play pairing.
pub const CLONE_SUFFIX: &str = "_clone";

/// Appends [`MatchReport`]s to a CSV file.
pub struct MatchResultsWriter {
    path: PathBuf,
    rows_written: usize,
    failures: usize,
}

impl MatchResultsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows_written: 0,
            failures: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Header for a match with `num_agents` agents.
    pub fn header(num_agents: usize) -> Vec<String> {
        let mut header: Vec<String> = [
            "MatchName",
            "ForestName",
            "AssumedPoliteness",
            "MatchTimeMillis",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        for agent in 1..=num_agents {
            header.push(format!("P{agent}Name"));
            header.push(format!("P{agent}Score"));
            header.push(format!("P{agent}IntentionsComplete"));
        }
        header
    }

    /// The row written for `report`.
    pub fn record(report: &MatchReport) -> Vec<String> {
        let mut row = vec![
            report.match_name.clone(),
            report.forest_name.clone(),
            report.assumed_politeness.to_string(),
            report.duration.as_millis().to_string(),
        ];
        for agent in &report.agents {
            row.push(agent.name.replace(CLONE_SUFFIX, ""));
            row.push(agent.score.to_string());
            row.push(agent.completed.to_string());
        }
        row
    }

    /// Append one row, creating the file (with header) if needed.
    pub fn append(&mut self, report: &MatchReport) -> Result<()> {
        let first_write = !self.path.exists();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::io(format!("create results directory {}", parent.display()), e)
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(format!("open results file {}", self.path.display()), e))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(file);
        if first_write {
            writer.write_record(Self::header(report.agents.len()))?;
        }
        writer.write_record(Self::record(report))?;
        writer
            .flush()
            .map_err(|e| Error::io(format!("flush results file {}", self.path.display()), e))?;

        self.rows_written += 1;
        Ok(())
    }
}

impl MatchObserver for MatchResultsWriter {
    /// A failed write is logged and the experiment carries on.
    fn on_match_end(&mut self, report: &MatchReport) -> Result<()> {
        if let Err(error) = self.append(report) {
            self.failures += 1;
            warn!(
                path = %self.path.display(),
                %error,
                "could not record match result"
            );
        }
        Ok(())
    }

    fn on_experiment_end(&mut self) -> Result<()> {
        if self.failures > 0 {
            warn!(
                failures = self.failures,
                written = self.rows_written,
                "some match results were not recorded"
            );
        }
        Ok(())
    }
}
