//! Health Microsim CLI
//!
//! Runs both treatment arms of each requested model framework over a cohort
//! and writes traces, outcomes and the treatment-effect table.
//!
//! ```bash
//! # Both frameworks, default inputs
//! health_microsim
//!
//! # Social framework only, custom parameters
//! RUST_LOG=info health_microsim --framework framework --params params.json --out results
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use health_microsim::assumptions::loader::DEFAULT_LIFE_TABLE_PATH;
use health_microsim::cohort::loader::DEFAULT_COHORT_PATH;
use health_microsim::cohort::load_cohort;
use health_microsim::output::{write_arm, write_effects, RunManifest};
use health_microsim::{ModelFramework, ModelParameters, ScenarioRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FrameworkArg {
    Standard,
    Framework,
    Both,
}

impl FrameworkArg {
    fn frameworks(self) -> Vec<ModelFramework> {
        match self {
            FrameworkArg::Standard => vec![ModelFramework::Standard],
            FrameworkArg::Framework => vec![ModelFramework::SocialFramework],
            FrameworkArg::Both => ModelFramework::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "health_microsim")]
#[command(about = "Run the two-arm microsimulation over a cohort")]
#[command(version)]
struct Args {
    /// Cohort CSV (id,seed,starting_age,race,sex,insurance,place)
    #[arg(short, long, default_value = DEFAULT_COHORT_PATH)]
    cohort: PathBuf,

    /// Directory with NonHispanic{Black,White}{Female,Male}.csv life tables
    #[arg(short, long, default_value = DEFAULT_LIFE_TABLE_PATH)]
    life_tables: PathBuf,

    /// JSON parameter overrides; missing fields keep their defaults
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "results")]
    out: PathBuf,

    /// Which model framework(s) to run
    #[arg(short, long, value_enum, default_value = "both")]
    framework: FrameworkArg,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let parameters = match &args.params {
        Some(path) => ModelParameters::from_json_path(path)
            .with_context(|| format!("reading parameters from {}", path.display()))?,
        None => ModelParameters::default(),
    };

    let cohort = load_cohort(&args.cohort)
        .with_context(|| format!("loading cohort from {}", args.cohort.display()))?;
    println!("Loaded {} individuals from {}", cohort.len(), args.cohort.display());

    let runner = ScenarioRunner::from_csv_path(&args.life_tables, parameters.clone())
        .with_context(|| format!("loading life tables from {}", args.life_tables.display()))?;

    let frameworks = args.framework.frameworks();
    for &framework in &frameworks {
        let run_start = Instant::now();
        let paired = runner
            .run_paired(framework, &cohort)
            .with_context(|| format!("running {} framework", framework.code()))?;
        println!("{} framework simulated in {:?}", framework.code(), run_start.elapsed());

        write_arm(&args.out, &paired.sc)?;
        write_arm(&args.out, &paired.nt)?;
        let effects_path = write_effects(&args.out, framework, &paired.effects)?;
        println!("  treatment effect written to {}", effects_path.display());
    }

    let manifest = RunManifest::new(cohort.len(), frameworks, &args.life_tables, parameters);
    let manifest_path = manifest.write(&args.out)?;
    println!("Manifest written to {}", manifest_path.display());
    println!("Done in {:?}", start.elapsed());
    Ok(())
}
