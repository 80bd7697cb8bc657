use anyhow::Result;
use clap::Parser;

use crate::{
    cli::output::{print_kv, print_section},
    coverage::CoverageCalculator,
    forest::GoalPlanForest,
};

use super::ForestArgs;

#[derive(Parser, Debug)]
#[command(about = "Show the coverage annotations of a forest")]
pub struct CoverageArgs {
    #[command(flatten)]
    pub source: ForestArgs,

    /// Also list every plan with its basic and extended coverage
    #[arg(long)]
    pub plans: bool,
}

pub fn execute(args: CoverageArgs) -> Result<()> {
    let instance = args.source.load("random_0")?;
    let forest = &instance.forest;
    let calculator = CoverageCalculator::new();

    print_section(&format!("Coverage of {}", forest.name()));
    print_kv("Intentions", &forest.num_intentions().to_string());
    print_kv("Literals", &forest.vocabulary().len().to_string());
    println!(
        "\n  {:<4} {:<16} {:>6} {:>10} {:>10}",
        "#", "goal", "depth", "coverage", "quick"
    );
    for (index, &root) in forest.roots().iter().enumerate() {
        let Some(goal) = forest.goal(root) else {
            continue;
        };
        println!(
            "  {:<4} {:<16} {:>6} {:>10.4} {:>10.4}",
            index,
            goal.name,
            forest.depth(root),
            goal.extended_coverage(),
            calculator.quick_goal_coverage(forest, root)
        );
    }

    if args.plans {
        print_plans(forest);
    }
    Ok(())
}

fn print_plans(forest: &GoalPlanForest) {
    println!("\n  {:<16} {:<16} {:>8} {:>10}", "goal", "plan", "basic", "extended");
    for goal_id in forest.goal_ids() {
        let Some(goal) = forest.goal(goal_id) else {
            continue;
        };
        for (_, plan) in forest.plans_of(goal_id) {
            println!(
                "  {:<16} {:<16} {:>8.4} {:>10.4}",
                goal.name,
                plan.name,
                plan.basic_coverage(),
                plan.extended_coverage()
            );
        }
    }
}
