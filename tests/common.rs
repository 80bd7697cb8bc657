//! Common fixtures for the intention-scheduler test suite.
//!
//! Forests are written as JSON so the fixtures also exercise the loader.

#![allow(dead_code)]

use intention_scheduler::{
    ForestSpec, State,
    config::GeneratorConfig,
    forest::ForestInstance,
    pipeline::initial_state,
};

pub fn instance(json: &str) -> ForestInstance {
    ForestSpec::from_json(json).unwrap().build().unwrap()
}

pub fn state(json: &str) -> State {
    initial_state(instance(json))
}

/// `n` intentions that each complete with a single unconditional move.
pub fn independent(n: usize) -> State {
    let intentions: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{ "name": "G{i}", "plans": [
                    {{ "name": "P{i}", "body": [
                        {{ "action": {{ "name": "a{i}", "postcondition": ["Done{i}"] }} }}
                    ] }}
                ] }}"#
            )
        })
        .collect();
    state(&format!(
        r#"{{ "name": "independent", "intentions": [{}] }}"#,
        intentions.join(",")
    ))
}

/// Two intentions that both need `Free`; whoever acts first blocks the other.
pub const CONTESTED: &str = r#"{
    "name": "contested",
    "beliefs": { "Free": true },
    "intentions": [
        { "name": "G0", "plans": [
            { "name": "P0", "body": [
                { "action": { "name": "a0", "precondition": ["Free"], "postcondition": ["!Free"] } }
            ] }
        ] },
        { "name": "G1", "plans": [
            { "name": "P1", "body": [
                { "action": { "name": "a1", "precondition": ["Free"], "postcondition": ["!Free"] } }
            ] }
        ] }
    ]
}"#;

/// Intentions whose only action needs a literal that is never true.
pub const BLOCKED: &str = r#"{
    "name": "blocked",
    "intentions": [
        { "name": "G0", "plans": [
            { "name": "P0", "body": [
                { "action": { "name": "a0", "precondition": ["Key"], "postcondition": ["Done0"] } }
            ] }
        ] },
        { "name": "G1", "plans": [
            { "name": "P1", "body": [
                { "action": { "name": "a1", "precondition": ["Key"], "postcondition": ["Done1"] } }
            ] }
        ] }
    ]
}"#;

/// Small generated forests that play quickly.
pub fn tiny_generator(seed: u64) -> GeneratorConfig {
    GeneratorConfig::default()
        .with_depth(2)
        .with_num_trees(3)
        .with_num_vars(8)
        .with_actions_per_plan(2)
        .with_seed(seed)
}
