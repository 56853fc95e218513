//! Monte Carlo Seed Sweeps
//!
//! A single simulation is one draw from the market's dynamics. Sweeping the
//! seed turns it into a distribution and lets us measure tail risk.
//!
//! ## Metrics
//! - Fraud rate percentiles (50%, 95%, 99%) and expected shortfall at 95%
//! - Gap between the mean simulated fraud rate and the theoretical q*
//! - Attack welfare loss VaR at 95%, 99% and CVaR at 95%
//! - Share of runs in which an attack did not reduce fraud

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::attack::{evaluate_attack, AttackConfig, AttackType, Severity};
use crate::equilibrium::compute_q_star;
use crate::params::ProtocolParams;
use crate::simulation::{run_simulation, SimulationConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSweep {
    pub runs: usize,
    pub q_star: f64,

    pub fraud_rates: Vec<f64>,
    pub welfares: Vec<f64>,

    pub mean_fraud_rate: f64,
    pub std_fraud_rate: f64,
    pub fraud_rate_p50: f64,
    pub fraud_rate_p95: f64,
    pub fraud_rate_p99: f64,
    pub fraud_rate_cvar_95: f64,
    pub convergence_gap: f64,

    pub mean_welfare: f64,
    pub min_welfare: f64,
}

impl SimulationSweep {
    pub fn print(&self) {
        println!("  Runs:                    {}", self.runs);
        println!("  Mean fraud rate:         {:.2}%", self.mean_fraud_rate * 100.0);
        println!("  Std fraud rate:          {:.2}%", self.std_fraud_rate * 100.0);
        println!("  Fraud rate p50:          {:.2}%", self.fraud_rate_p50 * 100.0);
        println!("  Fraud rate p95:          {:.2}%", self.fraud_rate_p95 * 100.0);
        println!("  Fraud rate p99:          {:.2}%", self.fraud_rate_p99 * 100.0);
        println!("  Fraud rate CVaR 95%:     {:.2}%", self.fraud_rate_cvar_95 * 100.0);
        println!("  Gap to q*:               {:+.2}pp", self.convergence_gap * 100.0);
        println!("  Mean welfare:            {:.0}", self.mean_welfare);
        println!("  Min welfare:             {:.0}", self.min_welfare);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSweep {
    pub attack: AttackType,
    pub runs: usize,

    pub welfare_losses: Vec<f64>,
    pub fraud_rate_changes: Vec<f64>,

    pub mean_welfare_loss: f64,
    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub mean_fraud_rate_change: f64,
    pub non_negative_change_share: f64,
    pub worst_severity: Severity,
}

impl AttackSweep {
    pub fn print(&self) {
        println!("  Runs:                    {}", self.runs);
        println!("  Mean welfare loss:       {:.0}", self.mean_welfare_loss);
        println!("  Welfare loss VaR 95%:    {:.0}", self.var_95);
        println!("  Welfare loss VaR 99%:    {:.0}", self.var_99);
        println!("  Welfare loss CVaR 95%:   {:.0}", self.cvar_95);
        println!("  Mean fraud change:       {:+.2}pp", self.mean_fraud_rate_change * 100.0);
        println!("  Runs with change >= 0:   {:.1}%", self.non_negative_change_share * 100.0);
        println!("  Worst severity:          {}", self.worst_severity);
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn expected_shortfall(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let cutoff_idx = (((sorted.len() as f64) * p).ceil() as usize).min(sorted.len());
    let tail = &sorted[cutoff_idx..];
    if tail.is_empty() {
        return *sorted.last().unwrap_or(&0.0);
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Runs the simulation with seeds `config.seed .. config.seed + runs`.
pub fn sweep_simulation(params: &ProtocolParams, config: &SimulationConfig, runs: usize) -> SimulationSweep {
    let results: Vec<_> = (0..runs as u64)
        .map(|i| {
            let seeded = SimulationConfig {
                seed: config.seed.wrapping_add(i),
                ..*config
            };
            run_simulation(params, &seeded)
        })
        .collect();

    let q_star = compute_q_star(params);
    let fraud_rates: Vec<f64> = results.iter().map(|r| r.final_fraud_rate).collect();
    let welfares: Vec<f64> = results.iter().map(|r| r.social_welfare).collect();

    let mean_fraud_rate = mean(&fraud_rates);
    let variance = if fraud_rates.is_empty() {
        0.0
    } else {
        fraud_rates.iter().map(|f| (f - mean_fraud_rate).powi(2)).sum::<f64>() / fraud_rates.len() as f64
    };

    let sorted_fraud = sorted(&fraud_rates);
    let min_welfare = welfares.iter().cloned().reduce(f64::min).unwrap_or(0.0);

    info!(runs, mean_fraud_rate, q_star, "simulation sweep complete");

    SimulationSweep {
        runs,
        q_star,
        mean_fraud_rate,
        std_fraud_rate: variance.sqrt(),
        fraud_rate_p50: percentile(&sorted_fraud, 0.50),
        fraud_rate_p95: percentile(&sorted_fraud, 0.95),
        fraud_rate_p99: percentile(&sorted_fraud, 0.99),
        fraud_rate_cvar_95: expected_shortfall(&sorted_fraud, 0.95),
        convergence_gap: mean_fraud_rate - q_star,
        mean_welfare: mean(&welfares),
        min_welfare,
        fraud_rates,
        welfares,
    }
}

/// Evaluates `attack` over seed pairs `(baseline_seed + 2i, attack_seed + 2i)`.
pub fn sweep_attack(
    params: &ProtocolParams,
    attack: AttackType,
    config: &AttackConfig,
    runs: usize,
) -> AttackSweep {
    let results: Vec<_> = (0..runs as u64)
        .map(|i| {
            let seeded = AttackConfig {
                baseline_seed: config.baseline_seed.wrapping_add(2 * i),
                attack_seed: config.attack_seed.wrapping_add(2 * i),
                ..*config
            };
            evaluate_attack(params, attack, &seeded)
        })
        .collect();

    let welfare_losses: Vec<f64> = results.iter().map(|r| r.welfare_loss).collect();
    let fraud_rate_changes: Vec<f64> = results.iter().map(|r| r.fraud_rate_change).collect();

    let sorted_losses = sorted(&welfare_losses);
    let non_negative = fraud_rate_changes.iter().filter(|&&c| c >= 0.0).count();
    let worst_severity = results
        .iter()
        .map(|r| r.severity)
        .max()
        .unwrap_or(Severity::Low);

    let non_negative_change_share = if runs > 0 {
        non_negative as f64 / runs as f64
    } else {
        0.0
    };

    info!(
        attack = attack.tag(),
        runs,
        non_negative_change_share,
        "attack sweep complete"
    );

    AttackSweep {
        attack,
        runs,
        mean_welfare_loss: mean(&welfare_losses),
        var_95: percentile(&sorted_losses, 0.95),
        var_99: percentile(&sorted_losses, 0.99),
        cvar_95: expected_shortfall(&sorted_losses, 0.95),
        mean_fraud_rate_change: mean(&fraud_rate_changes),
        non_negative_change_share,
        worst_severity,
        welfare_losses,
        fraud_rate_changes,
    }
}
