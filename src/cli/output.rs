//! Output formatting for CLI

use crate::simulation::MatchReport;

/// Width of the key column in key-value listings.
const KEY_WIDTH: usize = 18;

/// Title underlined to its own width.
fn section(title: &str) -> String {
    format!("\n{title}\n{}", "-".repeat(title.chars().count()))
}

fn key_value(key: &str, value: &str) -> String {
    format!("  {:<width$} {value}", format!("{key}:"), width = KEY_WIDTH)
}

pub fn print_section(title: &str) {
    println!("{}", section(title));
}

pub fn print_kv(key: &str, value: &str) {
    println!("{}", key_value(key, value));
}

/// Print one finished match.
pub fn print_report(report: &MatchReport) {
    let side = if report.mirror { "mirror" } else { "normal" };
    println!(
        "\n{} ({side}) on {}: {} after {} turns, {} ms",
        report.match_name,
        report.forest_name,
        report.termination,
        report.turns,
        report.duration.as_millis()
    );
    for agent in &report.agents {
        println!(
            "  {:24} score {:>6.2}  completed {}",
            agent.name, agent.score, agent.completed
        );
    }
}
