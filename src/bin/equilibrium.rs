//! Equilibrium Report Binary
//!
//! Prints the closed-form equilibrium for a parameter set, and optionally a
//! one-parameter sensitivity sweep or the minimum-viable-stake curve.
//!
//! ## Usage
//! ```bash
//! cargo run --bin equilibrium --release -- --sweep p_w --from 0.5 --to 1.0 --steps 11
//! ```

use anyhow::Result;
use clap::Parser;
use fraud_game_simulation::cli::{init_tracing, CommonArgs};
use fraud_game_simulation::equilibrium::{
    compute_dispute_value, compute_equilibrium, linspace, sensitivity_analysis, stake_thresholds,
};
use fraud_game_simulation::{ParamField, ProtocolParams};

#[derive(Parser)]
#[command(name = "equilibrium")]
#[command(about = "Closed-form fraud game equilibrium", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Parameter to sweep (symbol like S_P or field name like stake)
    #[arg(long)]
    sweep: Option<ParamField>,

    #[arg(long, default_value = "10.0")]
    from: f64,

    #[arg(long, default_value = "500.0")]
    to: f64,

    #[arg(long, default_value = "10")]
    steps: usize,

    /// Print S_P^min over payments from --from to --to
    #[arg(long)]
    stake_curve: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.common.log_level);
    let params = cli.common.resolve()?.params;

    let eq = compute_equilibrium(&params);

    if cli.common.json {
        let sweep = cli
            .sweep
            .map(|field| sensitivity_analysis(&params, field, &linspace(cli.from, cli.to, cli.steps)));
        let curve = cli
            .stake_curve
            .then(|| stake_thresholds(&params, &linspace(cli.from, cli.to, cli.steps)));
        let out = serde_json::json!({
            "params": params,
            "equilibrium": eq,
            "dispute_value": compute_dispute_value(&params),
            "sensitivity": sweep,
            "stake_thresholds": curve,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("=======================================================");
    println!("  Fraud Game Equilibrium");
    println!("=======================================================");
    println!();
    print_params(&params);
    println!();

    println!("Equilibrium:");
    println!("{}", "-".repeat(50));
    println!("  Audit probability v*:    {:.4}", eq.v_star);
    println!("  Cheat probability q*:    {:.4}", eq.q_star);
    println!("  IC threshold theta:      {:.4}", eq.theta);
    println!("  Dispute surplus Delta:   {:.2}", eq.delta);
    println!("  Belief threshold mu*:    {:.4}", eq.mu_star);
    println!("  Min viable stake:        {:.2}", eq.s_p_min);
    println!("  Dispute value (EV):      {:.2}", compute_dispute_value(&params));
    println!("  Enforcement viable:      {}", eq.is_enforcement_viable);
    println!("  IC satisfied:            {}", eq.is_ic_satisfied);
    println!("  E[provider utility]:     {:.2}", eq.expected_provider_utility);
    println!("  E[client utility]:       {:.2}", eq.expected_client_utility);
    println!();

    if let Some(field) = cli.sweep {
        let values = linspace(cli.from, cli.to, cli.steps);
        let result = sensitivity_analysis(&params, field, &values);

        println!("Sensitivity to {}:", field);
        println!("| {:>10} | {:>8} | {:>8} | {:>9} | {:>9} |", field.symbol(), "q*", "v*", "Delta", "S_P^min");
        println!("|------------|----------|----------|-----------|-----------|");
        for i in 0..result.len() {
            println!(
                "| {:>10.3} | {:>8.4} | {:>8.4} | {:>9.2} | {:>9.2} |",
                result.values[i], result.q_star[i], result.v_star[i], result.delta[i], result.s_p_min[i]
            );
        }
        println!();
    }

    if cli.stake_curve {
        let result = stake_thresholds(&params, &linspace(cli.from, cli.to, cli.steps));

        println!("Minimum viable stake by payment:");
        println!("| {:>8} | {:>9} | {:>8} | {:>8} |", "P_set", "S_P^min", "q*@min", "v*@min");
        println!("|----------|-----------|----------|----------|");
        for i in 0..result.payment.len() {
            println!(
                "| {:>8.2} | {:>9.2} | {:>8.4} | {:>8.4} |",
                result.payment[i], result.s_p_min[i], result.q_star_at_min[i], result.v_star_at_min[i]
            );
        }
    }

    Ok(())
}

fn print_params(params: &ProtocolParams) {
    println!("Parameters:");
    for field in ParamField::all() {
        println!("  {:<8} {}", field.symbol(), params.get(field));
    }
}
