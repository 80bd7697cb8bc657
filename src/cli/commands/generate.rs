use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{print_kv, print_section},
    forest::SynthGenerator,
};

use super::ForestArgs;

#[derive(Parser, Debug)]
#[command(about = "Generate synthetic forests and save them as JSON")]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: ForestArgs,

    /// Number of forests to generate
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,

    /// Output directory
    #[arg(long, short = 'o', default_value = "forests")]
    pub output: PathBuf,
}

pub fn execute(args: GenerateArgs) -> Result<()> {
    let config = args.source.generator_config();
    let mut generator = SynthGenerator::new(config)?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    print_section("Generate");
    for index in 0..args.count {
        let name = format!("random_{index}");
        let instance = generator.generate(&name)?;
        let path = args.output.join(format!("{name}.json"));
        instance
            .to_spec()
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        print_kv(&name, &path.display().to_string());
    }
    Ok(())
}
