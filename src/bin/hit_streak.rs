//! hit-streak: Exact hit-streak and batting-average probabilities over a season.
//!
//! Plays `--num-games` games of `--num-abs` at-bats each and reports, at every
//! game checkpoint, the probability of having reached the streak target, of
//! batting at or above the average target, and of both.

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use exact_odds::constants::{
    DEFAULT_AT_BATS, DEFAULT_BA_TARGET, DEFAULT_GAME_CHECKS, DEFAULT_HIT_PROB,
    DEFAULT_STREAK_TARGET,
};
use exact_odds::env_config;
use exact_odds::models::hit_streak::{play_season, state_rows, summarize, HitStreakModel};
use exact_odds::report;

#[derive(Debug, Parser)]
#[command(name = "hit-streak")]
#[command(about = "Exact hit-streak and batting-average probabilities")]
struct Args {
    /// Number of games to play
    #[arg(long)]
    num_games: usize,

    /// Per-at-bat hit probability
    #[arg(long, default_value_t = DEFAULT_HIT_PROB)]
    hit_prob: f64,

    /// At-bats per game
    #[arg(long, default_value_t = DEFAULT_AT_BATS)]
    num_abs: u32,

    /// Batting-average target
    #[arg(long, default_value_t = DEFAULT_BA_TARGET)]
    ba_target: f64,

    /// Consecutive games with a hit
    #[arg(short = 't', long, default_value_t = DEFAULT_STREAK_TARGET)]
    streak_target: u32,

    /// Games at which to report summaries [default: 60 162]
    #[arg(long, num_args = 1..)]
    game_checks: Vec<usize>,

    /// Write the full per-game state table to this CSV file
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Write `games,prob` streak observations to this CSV file
    #[arg(long)]
    observations: Option<PathBuf>,
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

    let model = HitStreakModel::new(args.num_abs, args.hit_prob, args.streak_target)?;
    let mut game_checks = if args.game_checks.is_empty() {
        DEFAULT_GAME_CHECKS.to_vec()
    } else {
        args.game_checks.clone()
    };
    game_checks.sort_unstable();
    game_checks.dedup();
    for &g in game_checks.iter().filter(|&&g| g > args.num_games) {
        log::warn!("game check {g} is past the last game ({})", args.num_games);
    }

    let mut state_table = match &args.output_path {
        Some(path) => {
            let mut w = BufWriter::new(File::create(path)?);
            report::write_state_header(&mut w)?;
            Some(w)
        }
        None => None,
    };

    let mut summaries = Vec::new();
    let observations = play_season(&model, args.num_games, |game, dist| {
        log::debug!("game {game} of {}: {} states", args.num_games, dist.len());
        if game_checks.binary_search(&game).is_ok() {
            summaries.push(summarize(dist, game, args.num_abs, args.ba_target));
        }
        if let Some(w) = state_table.as_mut() {
            report::append_state_rows(&mut *w, &state_rows(dist, game, args.num_abs))?;
        }
        Ok::<_, Box<dyn Error>>(())
    })?;
    if let Some(last) = observations.last() {
        log::info!("P(streak of {}) after {} games = {}", args.streak_target, last.step, last.prob);
    }

    print!("{}", report::render_summaries(&summaries));

    if let Some(mut w) = state_table {
        w.flush()?;
    }
    if let Some(path) = &args.observations {
        let mut file = BufWriter::new(File::create(path)?);
        report::write_observations_csv(&mut file, "games", &observations)?;
        file.flush()?;
        log::info!("wrote {} rows to {}", observations.len(), path.display());
    }
    Ok(())
}
