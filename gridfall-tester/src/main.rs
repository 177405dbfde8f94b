mod reports;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use gridfall_game::{BalanceConfig, DifficultyLevel, DifficultyTag, run_batch};
use reports::{LabeledRun, render_console, render_json};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl DifficultyArg {
    const fn level(self) -> DifficultyLevel {
        match self {
            Self::Easy => DifficultyLevel::Easy,
            Self::Medium => DifficultyLevel::Medium,
            Self::Hard => DifficultyLevel::Hard,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "gridfall-tester", version)]
#[command(about = "Headless balance validation for the Gridfall puzzle core")]
struct Args {
    /// Number of simulated games per batch
    #[arg(long, default_value_t = 200)]
    games: u32,

    /// Batch seed; a fixed (config, games, seed) triple reproduces exactly
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Difficulty tier to simulate
    #[arg(long, value_enum, default_value_t = DifficultyArg::Medium)]
    difficulty: DifficultyArg,

    /// Apply the no-mercy modifier on top of the tier
    #[arg(long)]
    no_mercy: bool,

    /// Run every difficulty tier side by side instead of a single batch
    #[arg(long)]
    compare: bool,

    /// Optional balance config JSON; falls back to built-in defaults on
    /// any load or parse problem
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref());
    let start = Instant::now();
    let runs = run_requested_batches(&args, &config);
    let elapsed = start.elapsed();

    let rendered = match args.report.as_str() {
        "json" => render_json(&runs).context("serializing report")?,
        _ => render_console(&runs),
    };

    if let Some(path) = &args.output {
        fs::write(path, &rendered)
            .with_context(|| format!("writing report to {}", path.display()))?;
        println!("report written to {}", path.display().to_string().bold());
    } else {
        print!("{rendered}");
    }

    log::info!(
        "simulated {} batch(es) in {:.2}s",
        runs.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> BalanceConfig {
    let Some(path) = path else {
        return BalanceConfig::default();
    };
    match fs::read_to_string(path) {
        Ok(text) => match BalanceConfig::from_json(&text) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "balance config {} rejected ({err}); using defaults",
                    path.display()
                );
                BalanceConfig::default()
            }
        },
        Err(err) => {
            log::warn!(
                "balance config {} unreadable ({err}); using defaults",
                path.display()
            );
            BalanceConfig::default()
        }
    }
}

fn run_requested_batches(args: &Args, config: &BalanceConfig) -> Vec<LabeledRun> {
    if args.compare {
        let mut runs = Vec::new();
        for arg in [DifficultyArg::Easy, DifficultyArg::Medium, DifficultyArg::Hard] {
            let tag = DifficultyTag::new(arg.level(), args.no_mercy);
            runs.push(LabeledRun {
                label: tag_label(arg, args.no_mercy),
                stats: run_batch(config, tag, args.games, args.seed),
            });
        }
        runs
    } else {
        let tag = DifficultyTag::new(args.difficulty.level(), args.no_mercy);
        vec![LabeledRun {
            label: tag_label(args.difficulty, args.no_mercy),
            stats: run_batch(config, tag, args.games, args.seed),
        }]
    }
}

fn tag_label(difficulty: DifficultyArg, no_mercy: bool) -> String {
    let base = match difficulty {
        DifficultyArg::Easy => "easy",
        DifficultyArg::Medium => "medium",
        DifficultyArg::Hard => "hard",
    };
    if no_mercy {
        format!("{base}+no-mercy")
    } else {
        String::from(base)
    }
}
