//! Report rendering for batch simulation results.

use colored::Colorize;
use gridfall_game::BatchStats;
use serde::Serialize;

/// One labeled batch run in a report.
#[derive(Debug, Clone, Serialize)]
pub struct LabeledRun {
    pub label: String,
    pub stats: BatchStats,
}

/// Render runs as an aligned console table with colored loss rates.
#[must_use]
pub fn render_console(runs: &[LabeledRun]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<18} {:>6} {:>10} {:>10} {:>10} {:>10} {:>8} {:>9} {:>9} {:>6}\n",
        "run", "games", "moves", "dur(s)", "p50(s)", "p90(s)", "clears", "cl/min", "no-move", "well"
    ));
    for run in runs {
        let s = &run.stats;
        out.push_str(&format!(
            "{:<18} {:>6} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>8.1} {:>9.2} {:>9} {:>6}\n",
            run.label.bold(),
            s.games,
            s.mean_moves,
            s.mean_duration_sec,
            s.p50_duration_sec,
            s.p90_duration_sec,
            s.mean_clears,
            s.clears_per_minute,
            colorize_rate(s.no_move_loss_rate),
            colorize_rate(s.well_overflow_rate),
        ));
    }
    out
}

/// Render runs as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error when serialization fails (it cannot for these types,
/// but the caller handles it uniformly with its other I/O).
pub fn render_json(runs: &[LabeledRun]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(runs)
}

fn colorize_rate(rate: f32) -> String {
    let text = format!("{rate:.2}");
    if rate >= 0.5 {
        text.red().to_string()
    } else if rate >= 0.2 {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}
