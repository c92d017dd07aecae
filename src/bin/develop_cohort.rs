//! Generate a synthetic cohort and write it to cohort.csv
//!
//! Proportions come either from one JSON object holding all six values or
//! from a directory of single-value survey input files.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use health_microsim::cohort::generator::DEFAULT_MASTER_SEED;
use health_microsim::cohort::loader::DEFAULT_COHORT_PATH;
use health_microsim::cohort::{generate_cohort, write_cohort, CohortProportions};
use health_microsim::ModelParameters;

#[derive(Parser, Debug)]
#[command(name = "develop_cohort")]
#[command(about = "Generate a seeded synthetic cohort")]
#[command(version)]
struct Args {
    /// Cohort size
    #[arg(short = 'n', long)]
    cohort_size: usize,

    /// JSON object with prop_black, prop_female, insured_prop_nhb,
    /// insured_prop_nhw, place_prop_insured, place_prop_uninsured
    #[arg(long, conflicts_with = "input_dir")]
    proportions: Option<PathBuf>,

    /// Directory of single-value files (prop_black.json, ...)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Master seed for all cohort draws
    #[arg(short, long, default_value_t = DEFAULT_MASTER_SEED)]
    seed: u64,

    /// Age at cohort entry
    #[arg(short = 'a', long)]
    starting_age: Option<u32>,

    /// Output CSV path
    #[arg(short, long, default_value = DEFAULT_COHORT_PATH)]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let proportions = match (&args.proportions, &args.input_dir) {
        (Some(path), _) => CohortProportions::from_json_path(path)
            .with_context(|| format!("reading proportions from {}", path.display()))?,
        (None, Some(dir)) => CohortProportions::from_input_dir(dir)
            .with_context(|| format!("reading survey inputs from {}", dir.display()))?,
        (None, None) => bail!("either --proportions or --input-dir is required"),
    };

    let starting_age = args.starting_age.unwrap_or(ModelParameters::default().starting_age);
    let cohort = generate_cohort(args.cohort_size, starting_age, &proportions, args.seed)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    write_cohort(&args.out, &cohort).with_context(|| format!("writing {}", args.out.display()))?;
    println!("Wrote {} individuals to {}", cohort.len(), args.out.display());
    Ok(())
}
