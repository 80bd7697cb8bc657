//! Experiment pipeline: pairing plan, forest sources and result export.

mod common;

use std::{
    fs,
    sync::{Arc, Mutex},
};

use intention_scheduler::{
    config::{ExperimentConfig, MctsConfig},
    export::{CLONE_SUFFIX, MatchResultsWriter},
    forest::SynthGenerator,
    pipeline::{
        ExperimentRunner, MatchObserver, SchedulerKind, SummaryObserver, initial_state,
    },
    simulation::MatchReport,
};
use rand::{SeedableRng, rngs::StdRng};

/// Collects match names in playing order.
#[derive(Clone, Default)]
struct NameLog(Arc<Mutex<Vec<String>>>);

impl MatchObserver for NameLog {
    fn on_match_end(&mut self, report: &MatchReport) -> intention_scheduler::Result<()> {
        self.0.lock().unwrap().push(report.match_name.clone());
        Ok(())
    }
}

fn small_experiment(seed: u64) -> ExperimentConfig {
    ExperimentConfig::default()
        .with_roster(vec![SchedulerKind::Fifo, SchedulerKind::Pass])
        .with_generator(common::tiny_generator(seed))
        .with_seed(seed)
}

/// Test a full run over generated forests
#[test]
fn test_experiment_plays_every_pairing_twice() {
    let log = NameLog::default();
    let mut runner = ExperimentRunner::new(small_experiment(3).with_repetitions(2))
        .unwrap()
        .with_observer(Box::new(log.clone()));

    let summary = runner.run().unwrap();

    // 3 pairings x (allied, neutral, adversarial) x 2 sides x 2 forests
    assert_eq!(summary.forests, 2);
    assert_eq!(summary.matches, 36);
    let names = log.0.lock().unwrap();
    assert_eq!(names.len(), 36);
    assert_eq!(names[0], "allied_FIFO_and_FIFO");
    assert_eq!(names[1], "allied_FIFO_and_FIFO");
    assert_eq!(names[17], "adversarial_Pass_vs_Pass");
}

/// Keeps every report for inspection after the run.
#[derive(Clone, Default)]
struct ReportLog(Arc<Mutex<Vec<MatchReport>>>);

impl MatchObserver for ReportLog {
    fn on_match_end(&mut self, report: &MatchReport) -> intention_scheduler::Result<()> {
        self.0.lock().unwrap().push(report.clone());
        Ok(())
    }
}

/// Test that every scheduler kind plays generated forests to the end
#[test]
fn test_full_roster_finishes_with_bounded_scores() {
    let log = ReportLog::default();
    let config = small_experiment(0)
        .with_roster(SchedulerKind::ALL.to_vec())
        .with_mcts(MctsConfig::default().with_alpha(8).with_beta(2));
    let mut runner = ExperimentRunner::new(config)
        .unwrap()
        .with_observer(Box::new(log.clone()));
    let plans = runner.plan().len();

    let summary = runner.run().unwrap();

    assert_eq!(summary.matches, 2 * plans);
    let reports = log.0.lock().unwrap();
    assert_eq!(reports.len(), summary.matches);
    for report in reports.iter() {
        // Default intention values are 1, so no agent can exceed the count.
        let ceiling = report.final_state.num_intentions() as f64;
        for agent in &report.agents {
            assert!(
                (0.0..=ceiling).contains(&agent.score),
                "{}: {} scored {}",
                report.match_name,
                agent.name,
                agent.score
            );
        }
        assert!(report.total_completed() <= report.final_state.num_intentions());
    }
    for kind in SchedulerKind::ALL {
        let name = kind.name();
        assert!(
            reports
                .iter()
                .any(|r| r.agents.iter().any(|a| a.name.trim_end_matches(CLONE_SUFFIX) == name)),
            "{name} never played"
        );
    }
}

#[test]
fn test_pass_roster_completes_nothing() {
    let config = small_experiment(5).with_roster(vec![SchedulerKind::Pass]);
    let mut runner = ExperimentRunner::new(config).unwrap();
    let summary = runner.run().unwrap();

    assert_eq!(summary.matches, 6);
    assert_eq!(summary.completed_intentions, 0);
}

#[test]
fn test_results_csv_has_header_and_one_row_per_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results").join("matches.csv");
    let config = small_experiment(9);
    let mut runner = ExperimentRunner::new(config)
        .unwrap()
        .with_observer(Box::new(MatchResultsWriter::new(&path)));
    let summary = runner.run().unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&path)
        .unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "MatchName");
    assert_eq!(&headers[4], "P1Name");
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), summary.matches);
    // Self-play rows record the scheduler name without the clone suffix.
    assert_eq!(&rows[0][4], "FIFO");
    assert_eq!(&rows[0][7], "FIFO");
    assert_eq!(&rows[0][1], "random_0");
}

#[test]
fn test_results_are_appended_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matches.csv");
    for seed in [1, 2] {
        let config = small_experiment(seed).with_roster(vec![SchedulerKind::Fifo]);
        ExperimentRunner::new(config)
            .unwrap()
            .with_observer(Box::new(MatchResultsWriter::new(&path)))
            .run()
            .unwrap();
    }

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    // One header, then 3 modes x 2 sides per run.
    assert_eq!(lines.len(), 1 + 12);
    assert_eq!(lines.iter().filter(|l| l.starts_with("MatchName")).count(), 1);
}

#[test]
fn test_summary_merges_clone_rows() {
    let runner = ExperimentRunner::new(small_experiment(4)).unwrap();
    let plans = runner.plan();
    assert_eq!(plans.len(), 9);

    let mut generator = SynthGenerator::new(runner.config().generator.clone()).unwrap();
    let initial = initial_state(generator.generate("random_0").unwrap());
    let mut rng = StdRng::seed_from_u64(4);
    let mut summary = SummaryObserver::new();
    for plan in &plans {
        for report in runner.play(plan, &initial, &mut rng).unwrap() {
            summary.on_match_end(&report).unwrap();
        }
    }

    let fifo = summary.get("allied", "FIFO").unwrap();
    // FIFO vs FIFO (both copies) and FIFO vs Pass, two sides each.
    assert_eq!(fifo.matches, 6);
    assert!(summary.get("allied", "FIFO_clone").is_none());
    assert!(summary.table().contains("adversarial"));
}

#[test]
fn test_experiment_config_loads_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experiment.json");
    fs::write(
        &path,
        r#"{ "repetitions": 4, "roster": ["FIFO", "c0", "MCTS_unaware"], "seed": 12 }"#,
    )
    .unwrap();

    let config = ExperimentConfig::load(&path).unwrap();
    assert_eq!(config.repetitions, 4);
    assert_eq!(
        config.roster,
        vec![SchedulerKind::Fifo, SchedulerKind::C0, SchedulerKind::MctsUnaware]
    );
    assert_eq!(config.seed, Some(12));
    assert_eq!(config.mcts.alpha, 100);

    fs::write(&path, r#"{ "roster": ["Nobody"] }"#).unwrap();
    assert!(ExperimentConfig::load(&path).is_err());
}
