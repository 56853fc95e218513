//! Attack Scenario Binary
//!
//! Compares each attack against the honest baseline and prints a severity
//! table, with optional seed sweeps and closed-form profitability.
//!
//! ## Usage
//! ```bash
//! cargo run --bin attacks --release -- --periods 300 --runs 50 --profitability
//! ```

use anyhow::Result;
use clap::Parser;
use fraud_game_simulation::attack::{analyze_profitability, evaluate_attack, AttackProfitability};
use fraud_game_simulation::cli::{init_tracing, CommonArgs};
use fraud_game_simulation::monte_carlo::sweep_attack;
use fraud_game_simulation::AttackType;

#[derive(Parser)]
#[command(name = "attacks")]
#[command(about = "Attack scenario evaluation", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Only evaluate this attack (reputation_farming, no_stake_floor, sybil, collusion, censorship)
    #[arg(long)]
    attack: Option<AttackType>,

    /// Number of periods (overrides the config file)
    #[arg(long)]
    periods: Option<usize>,

    /// Also run a seed sweep with this many runs per attack
    #[arg(long)]
    runs: Option<usize>,

    /// Print closed-form profitability where one exists
    #[arg(long)]
    profitability: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.common.log_level);
    let run = cli.common.resolve()?;

    let mut config = run.attack;
    if let Some(periods) = cli.periods {
        config.n_periods = periods;
    }

    let attacks = match cli.attack {
        Some(attack) => vec![attack],
        None => AttackType::all(),
    };

    let results: Vec<_> = attacks
        .iter()
        .map(|&attack| evaluate_attack(&run.params, attack, &config))
        .collect();
    let sweeps: Vec<_> = match cli.runs {
        Some(runs) => attacks
            .iter()
            .map(|&attack| sweep_attack(&run.params, attack, &config, runs))
            .collect(),
        None => Vec::new(),
    };
    let profitability: Vec<AttackProfitability> = if cli.profitability {
        attacks
            .iter()
            .filter_map(|&attack| analyze_profitability(&run.params, attack))
            .collect()
    } else {
        Vec::new()
    };

    if cli.common.json {
        let out = serde_json::json!({
            "config": config,
            "attacks": results,
            "sweeps": sweeps,
            "profitability": profitability,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("=======================================================");
    println!("  Attack Scenario Evaluation");
    println!("=======================================================");
    println!();
    println!("Parameters:");
    println!(
        "  Periods: {}, Jobs/period: {}, Seeds: {}/{}",
        config.n_periods, config.n_jobs_per_period, config.baseline_seed, config.attack_seed
    );
    println!();

    for result in &results {
        println!("Attack: {}", result.name);
        println!("  {}", result.description);
        println!("{}", "-".repeat(50));
        result.print();
        println!();
    }

    println!("| Attack             | Fraud chg | Welfare loss | Attacker | Severity |");
    println!("|--------------------|-----------|--------------|----------|----------|");
    for r in &results {
        println!(
            "| {:18} | {:+8.2}pp | {:12.0} | {:8.0} | {:8} |",
            r.attack.tag(),
            r.fraud_rate_change * 100.0,
            r.welfare_loss,
            r.attacker_profit,
            r.severity.name(),
        );
    }
    println!();

    for sweep in &sweeps {
        println!("Seed sweep: {}", sweep.attack.name());
        println!("{}", "-".repeat(50));
        sweep.print();
        println!();
    }

    for p in &profitability {
        print_profitability(p);
        println!();
    }

    Ok(())
}

fn print_profitability(p: &AttackProfitability) {
    match p {
        AttackProfitability::ReputationFarming {
            cheat_profit,
            honest_profit,
            attack_advantage,
            farming_cost,
            net_attack_profit,
        } => {
            println!("Closed form: Reputation Farming");
            println!("{}", "-".repeat(50));
            println!("  Cheat profit:            {:.2}", cheat_profit);
            println!("  Honest profit:           {:.2}", honest_profit);
            println!("  Advantage:               {:+.2}", attack_advantage);
            println!("  Farming cost:            {:.2}", farming_cost);
            println!("  Net attack profit:       {:+.2}", net_attack_profit);
        }
        AttackProfitability::NoStakeFloor {
            cheat_profit,
            honest_profit,
            attack_advantage,
            min_viable_stake,
            disputing_viable,
        } => {
            println!("Closed form: No Stake Floor");
            println!("{}", "-".repeat(50));
            println!("  Cheat profit:            {:.2}", cheat_profit);
            println!("  Honest profit:           {:.2}", honest_profit);
            println!("  Advantage:               {:+.2}", attack_advantage);
            println!("  Min viable stake:        {:.2}", min_viable_stake);
            println!("  Disputing viable:        {}", disputing_viable);
        }
        AttackProfitability::Censorship {
            original_q_star,
            new_q_star,
            fraud_rate_increase,
            original_delta,
            new_delta,
        } => {
            println!("Closed form: Censorship");
            println!("{}", "-".repeat(50));
            println!("  q* before/after:         {:.4} / {:.4}", original_q_star, new_q_star);
            println!("  Fraud rate increase:     {:+.4}", fraud_rate_increase);
            println!("  Delta before/after:      {:.2} / {:.2}", original_delta, new_delta);
        }
    }
}
