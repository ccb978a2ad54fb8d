//! birthday: Probability that at least `target` of N people share one slot.
//!
//! Adds one person per step until the shared-slot probability reaches the
//! threshold, printing one row per step.

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use exact_odds::constants::{DEFAULT_SHARED_TARGET, DEFAULT_SLOTS, DEFAULT_THRESHOLD};
use exact_odds::driver::Run;
use exact_odds::env_config;
use exact_odds::models::birthday::BirthdayModel;
use exact_odds::report;
use exact_odds::types::RunConfig;

#[derive(Debug, Parser)]
#[command(name = "birthday")]
#[command(about = "Probability to have at least one shared birthday among N people")]
struct Args {
    /// Number of slots (i.e. days in a year)
    #[arg(short, long, default_value_t = DEFAULT_SLOTS)]
    slots: u32,

    /// Number of people that must share one slot
    #[arg(short, long, default_value_t = DEFAULT_SHARED_TARGET)]
    target: u32,

    /// Probability threshold at which to stop
    #[arg(short = 'p', long, default_value_t = DEFAULT_THRESHOLD)]
    probability_threshold: f64,

    /// Step bound [default: EXACT_ODDS_MAX_STEPS or 100000]
    #[arg(long)]
    max_steps: Option<usize>,

    /// Write `people,prob` rows to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the run as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_config::init_logging();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    env_config::init_rayon_threads();

    let model = BirthdayModel::new(args.slots, args.target)?;
    let config = RunConfig {
        threshold: args.probability_threshold,
        max_steps: args.max_steps.unwrap_or_else(env_config::default_max_steps),
        keep_history: false,
    };

    let mut run = Run::new(&model, config.clone());
    let mut observations = Vec::new();
    for obs in &mut run {
        let obs = obs?;
        if !args.json {
            println!("{} {}", obs.step, obs.prob);
        }
        observations.push(obs);
    }
    let outcome = run
        .outcome()
        .ok_or("run ended without a terminal outcome")?;

    if args.json {
        println!("{}", report::run_json(outcome, &config, &observations)?);
    }
    log::info!(
        "{} after {} people",
        report::outcome_label(outcome),
        run.step()
    );

    if let Some(path) = &args.output {
        let mut file = BufWriter::new(File::create(path)?);
        report::write_observations_csv(&mut file, "people", &observations)?;
        file.flush()?;
        log::info!("wrote {} rows to {}", observations.len(), path.display());
    }
    Ok(())
}
