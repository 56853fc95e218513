//! Market Simulation Binary
//!
//! Runs one seeded simulation and prints its trajectory, optionally followed
//! by a seed sweep.
//!
//! ## Usage
//! ```bash
//! cargo run --bin simulate --release -- --periods 300 --runs 100
//! ```

use anyhow::Result;
use clap::Parser;
use fraud_game_simulation::cli::{init_tracing, CommonArgs};
use fraud_game_simulation::monte_carlo::sweep_simulation;
use fraud_game_simulation::run_simulation;
use tracing::info;

#[derive(Parser)]
#[command(name = "simulate")]
#[command(about = "Period-stepped fraud game simulation", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of periods (overrides the config file)
    #[arg(long)]
    periods: Option<usize>,

    /// Jobs per period (overrides the config file)
    #[arg(long)]
    jobs: Option<usize>,

    /// Share of always-honest providers (overrides the config file)
    #[arg(long)]
    honest_fraction: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Print every n-th period
    #[arg(long, default_value = "10")]
    every: usize,

    /// Also run a seed sweep with this many runs
    #[arg(long)]
    runs: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.common.log_level);
    let run = cli.common.resolve()?;

    let mut config = run.simulation;
    if let Some(periods) = cli.periods {
        config.n_periods = periods;
    }
    if let Some(jobs) = cli.jobs {
        config.n_jobs_per_period = jobs;
    }
    if let Some(honest_fraction) = cli.honest_fraction {
        config.honest_fraction = honest_fraction;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    info!(?config, "running simulation");
    let result = run_simulation(&run.params, &config);
    let sweep = cli.runs.map(|runs| sweep_simulation(&run.params, &config, runs));

    if cli.common.json {
        let out = serde_json::json!({ "simulation": result, "sweep": sweep });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("=======================================================");
    println!("  Fraud Game Simulation");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!(
        "  Periods: {}, Jobs/period: {}, Honest fraction: {:.2}, Seed: {}",
        config.n_periods, config.n_jobs_per_period, config.honest_fraction, config.seed
    );
    println!();

    println!("| Period | Fraud  | Detect | Audit  | Rep   | Welfare   |");
    println!("|--------|--------|--------|--------|-------|-----------|");
    let every = cli.every.max(1);
    for p in result
        .periods
        .iter()
        .filter(|p| p.period % every == 0 || p.period + 1 == config.n_periods)
    {
        println!(
            "| {:6} | {:5.1}% | {:5.1}% | {:5.2}% | {:5.1} | {:9.0} |",
            p.period,
            p.fraud_rate * 100.0,
            p.detection_rate * 100.0,
            p.audit_rate * 100.0,
            p.reputation,
            p.welfare,
        );
    }
    println!();

    println!("Summary:");
    println!("{}", "-".repeat(50));
    result.print();
    println!();

    if let Some(sweep) = sweep {
        println!("Seed sweep:");
        println!("{}", "-".repeat(50));
        sweep.print();
    }

    Ok(())
}
