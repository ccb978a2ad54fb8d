//! win-prob: Exact win probability of one lineup against another, extra innings included.
//!
//! Plays regulation, then extra innings until the tie probability falls to the
//! tolerance, printing the cumulative win/tie/loss after each.

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;

use exact_odds::constants::{
    DEFAULT_BASELINE_INNINGS, DEFAULT_MAX_EXTRA_INNINGS, DEFAULT_MAX_INNING_RUNS,
    DEFAULT_TIE_TOLERANCE,
};
use exact_odds::env_config;
use exact_odds::models::innings::{play_to_decision, InningsModel, Lineup};
use exact_odds::report;

#[derive(Debug, Parser)]
#[command(name = "win-prob")]
#[command(about = "Exact win probability from per-plate-appearance on-base rates")]
struct Args {
    /// On-base probability of the team and of the opponent
    #[arg(long, num_args = 2, required = true)]
    on_base_prob: Vec<f64>,

    /// Runners stranded per inning by the team and by the opponent
    #[arg(long, num_args = 2, required = true)]
    offset: Vec<u32>,

    /// Innings per side in regulation
    #[arg(long, default_value_t = DEFAULT_BASELINE_INNINGS)]
    baseline_innings: u32,

    /// Runs per inning tracked exactly
    #[arg(long, default_value_t = DEFAULT_MAX_INNING_RUNS)]
    max_runs: u32,

    /// Stop once the tie probability is at most this
    #[arg(long, default_value_t = DEFAULT_TIE_TOLERANCE)]
    tie_tolerance: f64,

    /// Bound on extra innings
    #[arg(long, default_value_t = DEFAULT_MAX_EXTRA_INNINGS)]
    max_extra: usize,

    /// Print rows as JSON instead of a table
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
    let lineup = |i: usize| Lineup {
        on_base_prob: args.on_base_prob[i],
        offset: args.offset[i],
    };
    let model =
        InningsModel::from_lineups(lineup(0), lineup(1), args.baseline_innings, args.max_runs)?;
    let (rows, outcome) = play_to_decision(&model, args.tie_tolerance, args.max_extra)?;
    log::info!(
        "{} after {} innings",
        report::outcome_label(outcome),
        rows.last().map_or(args.baseline_innings, |r| r.innings)
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", report::render_innings(&rows));
    }
    Ok(())
}
