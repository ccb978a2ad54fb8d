//! Rendering and export of run output: delimited rows, JSON, aligned tables.
//!
//! These subscribe to the driver's observation stream; nothing here feeds back
//! into propagation.

use std::io::{self, Write};

use serde::Serialize;

use crate::driver::RunOutcome;
use crate::models::hit_streak::{HitSummary, StateRow};
use crate::models::innings::InningsRow;
use crate::types::{Observation, RunConfig};

/// Write observations as CSV with header `<step_column>,prob`.
pub fn write_observations_csv<W: Write>(
    mut w: W,
    step_column: &str,
    observations: &[Observation],
) -> io::Result<()> {
    writeln!(w, "{step_column},prob")?;
    for obs in observations {
        writeln!(w, "{},{}", obs.step, obs.prob)?;
    }
    Ok(())
}

/// Write the full hit-streak state table as CSV.
pub fn write_state_rows_csv<W: Write>(mut w: W, rows: &[StateRow]) -> io::Result<()> {
    write_state_header(&mut w)?;
    append_state_rows(w, rows)
}

pub fn write_state_header<W: Write>(mut w: W) -> io::Result<()> {
    writeln!(
        w,
        "games,hits,current_streak,did_reach_streak_target,prob,total_ab,ba"
    )
}

/// Append state rows without a header, for tables streamed one game at a time.
pub fn append_state_rows<W: Write>(mut w: W, rows: &[StateRow]) -> io::Result<()> {
    for r in rows {
        let ba = r.ba.map(|v| v.to_string()).unwrap_or_default();
        writeln!(
            w,
            "{},{},{},{},{},{},{}",
            r.games, r.hits, r.current_streak, r.did_reach_streak_target, r.prob, r.total_ab, ba
        )?;
    }
    Ok(())
}

/// Human-readable table of observations, right-aligned.
pub fn render_observations(step_column: &str, observations: &[Observation]) -> String {
    let width = step_column.len().max(
        observations
            .last()
            .map(|o| o.step.to_string().len())
            .unwrap_or(1),
    );
    let mut out = format!("{step_column:>width$}  prob\n");
    for obs in observations {
        out.push_str(&format!("{:>width$}  {:.6}\n", obs.step, obs.prob));
    }
    out
}

/// Human-readable table of hit-streak summaries.
pub fn render_summaries(summaries: &[HitSummary]) -> String {
    let mut out = format!(
        "{:>6}  {:>12}  {:>12}  {:>12}\n",
        "games", "streak", "ba", "both"
    );
    for s in summaries {
        out.push_str(&format!(
            "{:>6}  {:>12.4e}  {:>12.4e}  {:>12.4e}\n",
            s.games, s.streak, s.batting_average, s.both
        ));
    }
    out
}

/// Human-readable table of cumulative win/tie/loss by innings played.
pub fn render_innings(rows: &[InningsRow]) -> String {
    let mut out = format!(
        "{:>7}  {:>10}  {:>10}  {:>10}  {:>10}\n",
        "innings", "win", "tie", "loss", "relative"
    );
    for r in rows {
        let relative = r
            .relative_win()
            .map(|v| format!("{v:.6}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>7}  {:>10.6}  {:>10.3e}  {:>10.6}  {:>10}\n",
            r.innings, r.win, r.tie, r.loss, relative
        ));
    }
    out
}

/// JSON envelope for one run.
#[derive(Debug, Serialize)]
pub struct RunJson<'a> {
    pub outcome: &'static str,
    pub config: &'a RunConfig,
    pub observations: &'a [Observation],
}

pub fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Converged => "CONVERGED",
        RunOutcome::StepLimitReached => "STEP_LIMIT_REACHED",
    }
}

/// Serialize a run as pretty JSON.
pub fn run_json(
    outcome: RunOutcome,
    config: &RunConfig,
    observations: &[Observation],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RunJson {
        outcome: outcome_label(outcome),
        config,
        observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> Vec<Observation> {
        vec![
            Observation { step: 1, prob: 0.0 },
            Observation {
                step: 2,
                prob: 0.25,
            },
        ]
    }

    #[test]
    fn test_observations_csv() {
        let mut buf = Vec::new();
        write_observations_csv(&mut buf, "people", &obs()).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "people,prob\n1,0\n2,0.25\n");
    }

    #[test]
    fn test_state_rows_csv_leaves_missing_ba_empty() {
        let rows = [StateRow {
            games: 0,
            hits: 0,
            current_streak: 0,
            did_reach_streak_target: 0,
            prob: 1.0,
            total_ab: 0,
            ba: None,
        }];
        let mut buf = Vec::new();
        write_state_rows_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some("0,0,0,0,1,0,"));
    }

    #[test]
    fn test_render_observations() {
        let table = render_observations("people", &obs());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "people  prob");
        assert_eq!(lines[2], "     2  0.250000");
    }

    #[test]
    fn test_render_innings_marks_undecided() {
        let rows = [
            InningsRow {
                innings: 9,
                win: 0.0,
                tie: 1.0,
                loss: 0.0,
            },
            InningsRow {
                innings: 10,
                win: 0.25,
                tie: 0.5,
                loss: 0.25,
            },
        ];
        let table = render_innings(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].trim_end().ends_with("0.500000"));
    }

    #[test]
    fn test_run_json_shape() {
        let config = RunConfig {
            max_steps: 40,
            ..RunConfig::default()
        };
        let json = run_json(RunOutcome::Converged, &config, &obs()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"], "CONVERGED");
        assert_eq!(value["config"]["threshold"], 0.5);
        assert_eq!(value["config"]["max_steps"], 40);
        assert_eq!(value["observations"][1]["step"], 2);
        assert_eq!(value["observations"][1]["prob"], 0.25);
    }
}
