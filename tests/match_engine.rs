//! Match engine: termination, mirror matches and scoring.

mod common;

use intention_scheduler::{
    Error,
    ports::{MatchContext, Scheduler},
    schedulers::{CScheduler, FifoScheduler, PassScheduler},
    simulation::{AllianceType, MAX_CONSECUTIVE_PASSES, Match, MatchConfig, Termination},
    state::{Decision, State},
};

fn fifo_pair() -> Vec<Box<dyn Scheduler>> {
    vec![
        Box::new(FifoScheduler::new("first")),
        Box::new(FifoScheduler::new("second")),
    ]
}

/// Passes deliberately on every turn.
struct Stubborn;

impl Scheduler for Stubborn {
    fn name(&self) -> &str {
        "Stubborn"
    }

    fn load_match_details(
        &mut self,
        _context: &MatchContext,
        _agent: usize,
        _mirror: bool,
    ) {
    }

    fn decide(&mut self, _state: &State) -> intention_scheduler::Result<Decision> {
        Ok(Decision::pass())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn test_independent_intentions_all_complete() {
    let state = common::independent(4);
    let mut game = Match::new(MatchConfig::new("fifo", 4), state, fifo_pair()).unwrap();
    let report = game.run(false).unwrap();

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.turns, 4);
    assert_eq!(report.total_completed(), 4);
    for agent in &report.agents {
        assert_eq!(agent.completed, 2);
        assert_eq!(agent.score, 2.0);
    }
    assert_eq!(report.winner(), None);
}

#[test]
fn test_blocked_forest_is_a_stalemate() {
    let state = common::state(common::BLOCKED);
    let mut game = Match::new(MatchConfig::new("blocked", 2), state, fifo_pair()).unwrap();
    let report = game.run(false).unwrap();

    assert_eq!(report.termination, Termination::Stalemate);
    assert_eq!(report.turns, 0);
    assert_eq!(report.total_completed(), 0);
}

#[test]
fn test_repeated_passes_end_the_match() {
    let state = common::independent(2);
    let schedulers: Vec<Box<dyn Scheduler>> = vec![Box::new(Stubborn), Box::new(Stubborn)];
    let mut game = Match::new(MatchConfig::new("passes", 2), state, schedulers).unwrap();
    let report = game.run(false).unwrap();

    assert_eq!(report.termination, Termination::Repetition);
    assert_eq!(report.turns, MAX_CONSECUTIVE_PASSES);
}

#[test]
fn test_forced_passes_hand_the_turn_over() {
    let state = common::independent(2);
    let schedulers: Vec<Box<dyn Scheduler>> = vec![
        Box::new(PassScheduler::default()),
        Box::new(FifoScheduler::default()),
    ];
    let mut game = Match::new(MatchConfig::new("pass_vs_fifo", 2), state, schedulers).unwrap();
    let report = game.run(false).unwrap();

    // FIFO finishes its own intention, then nobody can move.
    assert_eq!(report.termination, Termination::Stalemate);
    assert_eq!(report.agents[0].completed, 0);
    assert_eq!(report.agents[1].completed, 1);
    assert_eq!(report.winner(), Some(1));
}

#[test]
fn test_mirror_match_swaps_ownership() {
    let state = common::independent(3);
    let mut game = Match::new(MatchConfig::new("mirror", 3), state, fifo_pair()).unwrap();
    let [normal, mirrored] = game.run_two_sided_series().unwrap();

    assert!(!normal.mirror);
    assert!(mirrored.mirror);
    assert_eq!(normal.agents[0].completed, 2);
    assert_eq!(normal.agents[1].completed, 1);
    assert_eq!(mirrored.agents[0].completed, 1);
    assert_eq!(mirrored.agents[1].completed, 2);
    // The series leaves the configured first mover untouched.
    assert_eq!(game.initial_state().player_turn, 0);
}

#[test]
fn test_first_mover_wins_the_contested_resource() {
    let state = common::state(common::CONTESTED);
    let mut game = Match::new(MatchConfig::new("contested", 2), state, fifo_pair()).unwrap();
    let [normal, mirrored] = game.run_two_sided_series().unwrap();

    // Agent 0 moves first and owns intention 0.
    assert_eq!(normal.agents[0].score, 1.0);
    assert_eq!(normal.agents[1].score, 0.0);
    // In the mirror agent 1 moves first and owns intention 0.
    assert_eq!(mirrored.agents[0].score, 0.0);
    assert_eq!(mirrored.agents[1].score, 1.0);
}

#[test]
fn test_intention_values_weight_scores() {
    let state = common::independent(2);
    let config = MatchConfig::new("values", 2)
        .with_alliance(AllianceType::Allied)
        .with_intention_values(vec![vec![3.0, 0.0], vec![0.0, 0.5]]);
    let mut game = Match::new(config, state, fifo_pair()).unwrap();
    let report = game.run(false).unwrap();

    assert_eq!(report.agents[0].score, 3.0);
    assert_eq!(report.agents[1].score, 0.5);
}

#[test]
fn test_coverage_scheduler_prefers_the_riskier_intention() {
    // G0 has complementary plans (coverage 1), G1 a single plan (coverage 0.5).
    let state = common::state(
        r#"{
            "name": "risk",
            "beliefs": { "A": true, "B": true },
            "intentions": [
                { "name": "G0", "plans": [
                    { "name": "PA", "precondition": ["A"], "body": [
                        { "action": { "name": "a0", "postcondition": ["X"] } }
                    ] },
                    { "name": "PnA", "precondition": ["!A"], "body": [
                        { "action": { "name": "a1", "postcondition": ["X"] } }
                    ] }
                ] },
                { "name": "G1", "plans": [
                    { "name": "PB", "precondition": ["B"], "body": [
                        { "action": { "name": "b0", "postcondition": ["Y"] } }
                    ] }
                ] }
            ]
        }"#,
    );
    let context = MatchContext {
        name: "risk".to_string(),
        num_intentions: 2,
        num_agents: 1,
        alliance: AllianceType::Neutral,
        assumed_politeness: 0.0,
        intention_values: Vec::new(),
    };
    let mut scheduler = CScheduler::c1();
    scheduler.load_match_details(&context, 0, false);
    let decision = scheduler.decide(&state).unwrap();
    assert_eq!(decision.intention, Some(1));
    assert_eq!(decision.plan, Some(0));

    let schedulers: Vec<Box<dyn Scheduler>> = vec![Box::new(scheduler)];
    let mut game = Match::new(MatchConfig::new("single", 2), state, schedulers).unwrap();
    let report = game.run(false).unwrap();
    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.turns, 2);
}

#[test]
fn test_c0_adopts_the_plan_whose_precondition_holds() {
    let state = common::state(
        r#"{
            "name": "either",
            "beliefs": { "A": true },
            "intentions": [
                { "name": "G", "plans": [
                    { "name": "PA", "precondition": ["A"], "body": [
                        { "action": { "name": "viaA", "precondition": ["A"], "postcondition": ["Done"] } }
                    ] },
                    { "name": "PnA", "precondition": ["!A"], "body": [
                        { "action": { "name": "viaNotA", "precondition": ["!A"], "postcondition": ["Done"] } }
                    ] }
                ] }
            ]
        }"#,
    );
    let schedulers: Vec<Box<dyn Scheduler>> = vec![Box::new(CScheduler::c0())];
    let mut game = Match::new(MatchConfig::new("either", 1), state.clone(), schedulers).unwrap();
    let context = game.context();

    let mut c0 = CScheduler::c0();
    c0.load_match_details(&context, 0, false);
    let decision = c0.decide(&state).unwrap();
    assert_eq!(decision.intention, Some(0));
    assert_eq!(decision.plan, Some(0));

    let report = game.run(false).unwrap();
    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.turns, 1);
}

#[test]
fn test_match_validation() {
    let state = common::independent(2);
    let err = Match::new(MatchConfig::new("empty", 2), state.clone(), Vec::new());
    assert!(matches!(err, Err(Error::InvalidMatch { .. })));

    let err = Match::new(MatchConfig::new("size", 3), state.clone(), fifo_pair());
    assert!(matches!(err, Err(Error::InvalidMatch { .. })));

    let config = MatchConfig::new("names", 2).with_agent_names(vec!["only".to_string()]);
    assert!(Match::new(config, state, fifo_pair()).is_err());
}
