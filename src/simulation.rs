//! Period-Stepped Fraud Simulation
//!
//! Agent-based dynamics of the fraud game under an adaptive client audit
//! policy. Each period draws `n_jobs_per_period` independent jobs; each job
//! is served by either an always-honest provider or a rational one who
//! compares the utility of cheating against a reputation-discounted guess of
//! the audit rate.
//!
//! ## Feedback Loop
//! 1. Rational providers cheat more when reputation lowers perceived scrutiny
//! 2. Clients observe a smoothed fraud rate over the last 5 periods
//! 3. Audit probability moves toward `v* * sqrt(observed / q*)`
//! 4. Detected fraud slashes reputation, closing the loop
//!
//! Runs are pure functions of their inputs plus a generator they own.

use std::collections::VecDeque;

use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::equilibrium::{compute_equilibrium, EquilibriumValues};
use crate::params::ProtocolParams;
use crate::rng::Lcg;

const INITIAL_REPUTATION: f64 = 50.0;
const MAX_REPUTATION: f64 = 100.0;
const REPUTATION_GAIN_HONEST: f64 = 0.1;
const REPUTATION_LOSS_DETECTED: f64 = 5.0;
const REPUTATION_SENSITIVITY: f64 = 0.01;

const FRAUD_WINDOW: usize = 5;
const AUDIT_LEARNING_RATE: f64 = 0.3;

const CLEAR_CHEAT_GAP: f64 = 1.0;
const CLEAR_CHEAT_PROB: f64 = 0.8;

// Upfront allocation for the period series; longer runs grow it on demand.
const MAX_PREALLOCATED_PERIODS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub n_periods: usize,
    pub n_jobs_per_period: usize,
    /// Probability a job goes to an always-honest provider
    pub honest_fraction: f64,
    pub seed: u64,
    /// Std dev of per-job client loss around `L`; 0 keeps the loss fixed
    pub loss_std: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_periods: 100,
            n_jobs_per_period: 20,
            honest_fraction: 0.6,
            seed: 42,
            loss_std: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodObservation {
    pub period: usize,
    pub fraud_rate: f64,
    pub detection_rate: f64,
    pub audit_rate: f64,
    pub reputation: f64,
    pub provider_profit: f64,
    pub client_loss: f64,
    pub welfare: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub config: SimulationConfig,
    pub equilibrium: EquilibriumValues,
    pub periods: Vec<PeriodObservation>,

    pub total_jobs: usize,
    pub total_frauds: usize,
    pub total_detected: usize,
    pub final_fraud_rate: f64,
    pub final_detection_rate: f64,
    pub social_welfare: f64,
}

impl SimulationResult {
    pub fn fraud_rates(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.fraud_rate).collect()
    }

    pub fn detection_rates(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.detection_rate).collect()
    }

    pub fn audit_rates(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.audit_rate).collect()
    }

    pub fn reputations(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.reputation).collect()
    }

    pub fn provider_profits(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.provider_profit).collect()
    }

    pub fn client_losses(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.client_loss).collect()
    }

    pub fn welfare(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.welfare).collect()
    }

    pub fn print(&self) {
        println!("  Periods:                 {}", self.periods.len());
        println!("  Total jobs:              {}", self.total_jobs);
        println!("  Total frauds:            {}", self.total_frauds);
        println!("  Frauds detected:         {}", self.total_detected);
        println!("  Fraud rate:              {:.2}%", self.final_fraud_rate * 100.0);
        println!("  Detection rate:          {:.2}%", self.final_detection_rate * 100.0);
        println!("  Theoretical q*:          {:.2}%", self.equilibrium.q_star * 100.0);
        println!("  Theoretical v*:          {:.2}%", self.equilibrium.v_star * 100.0);
        if let Some(last) = self.periods.last() {
            println!("  Final audit rate:        {:.2}%", last.audit_rate * 100.0);
            println!("  Final reputation:        {:.1}", last.reputation);
            println!("  Provider profit:         {:.0}", last.provider_profit);
            println!("  Client loss:             {:.0}", last.client_loss);
        }
        println!("  Social welfare:          {:.0}", self.social_welfare);
    }
}

/// Jobs in a run. Saturates instead of overflowing on absurd configs.
fn job_count(config: &SimulationConfig) -> usize {
    config.n_periods.saturating_mul(config.n_jobs_per_period)
}

// Keeps a probability inside [lo, hi] without panicking on NaN or lo > hi.
fn bound(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

struct MarketState {
    avg_reputation: f64,
    cum_provider_profit: f64,
    cum_client_loss: f64,
    adaptive_audit_prob: f64,
    fraud_window: VecDeque<f64>,
}

impl MarketState {
    fn new(equilibrium: &EquilibriumValues, audit_floor: f64) -> Self {
        Self {
            avg_reputation: INITIAL_REPUTATION,
            cum_provider_profit: 0.0,
            cum_client_loss: 0.0,
            adaptive_audit_prob: bound(equilibrium.v_star, audit_floor, 1.0),
            fraud_window: VecDeque::with_capacity(FRAUD_WINDOW),
        }
    }

    /// Audit probability a rational provider believes it faces.
    fn perceived_audit_prob(&self) -> f64 {
        self.adaptive_audit_prob
            * (-REPUTATION_SENSITIVITY * (self.avg_reputation - INITIAL_REPUTATION)).exp()
    }

    fn observe_fraud_rate(&mut self, fraud_rate: f64) -> f64 {
        if self.fraud_window.len() == FRAUD_WINDOW {
            self.fraud_window.pop_front();
        }
        self.fraud_window.push_back(fraud_rate);
        self.fraud_window.iter().sum::<f64>() / self.fraud_window.len() as f64
    }

    fn update_audit_prob(&mut self, observed_fraud_rate: f64, eq: &EquilibriumValues, audit_floor: f64) {
        let fraud_ratio = if eq.q_star > 0.0 {
            observed_fraud_rate / eq.q_star
        } else {
            1.0
        };
        let target = eq.v_star * fraud_ratio.sqrt();
        self.adaptive_audit_prob += AUDIT_LEARNING_RATE * (target - self.adaptive_audit_prob);
        self.adaptive_audit_prob = bound(self.adaptive_audit_prob, audit_floor, 1.0);
    }
}

fn decides_to_cheat(
    params: &ProtocolParams,
    eq: &EquilibriumValues,
    state: &MarketState,
    rng: &mut impl Rng,
) -> bool {
    let estimated_audit_prob = state.perceived_audit_prob();
    let u_honest = params.payment - params.cost_honest;
    let u_cheat = params.payment
        - params.cost_cheat
        - estimated_audit_prob * (params.payment + params.stake);

    let gap = u_cheat - u_honest;
    if gap > CLEAR_CHEAT_GAP {
        rng.gen::<f64>() < CLEAR_CHEAT_PROB
    } else if gap > -CLEAR_CHEAT_GAP {
        rng.gen::<f64>() < eq.q_star
    } else {
        false
    }
}

pub fn run_simulation(params: &ProtocolParams, config: &SimulationConfig) -> SimulationResult {
    simulate_with_rng(params, config, Lcg::seed_from_u64(config.seed))
}

pub fn simulate_with_rng<R: Rng>(
    params: &ProtocolParams,
    config: &SimulationConfig,
    mut rng: R,
) -> SimulationResult {
    let eq = compute_equilibrium(params);
    let audit_floor = params.audit_floor;
    // v* stays unclamped in the equilibrium; reported rates must be probabilities.
    let fallback_detection_rate = bound(eq.v_star, 0.0, 1.0);
    let loss_noise = if config.loss_std > 0.0 {
        Normal::new(0.0, config.loss_std).ok()
    } else {
        None
    };

    debug!(
        n_periods = config.n_periods,
        n_jobs = config.n_jobs_per_period,
        honest_fraction = config.honest_fraction,
        seed = config.seed,
        q_star = eq.q_star,
        v_star = eq.v_star,
        "starting simulation"
    );

    let mut state = MarketState::new(&eq, audit_floor);
    let mut periods = Vec::with_capacity(config.n_periods.min(MAX_PREALLOCATED_PERIODS));
    let mut total_frauds = 0;
    let mut total_detected = 0;

    for period in 0..config.n_periods {
        let mut period_frauds = 0;
        let mut period_detected = 0;

        for _ in 0..config.n_jobs_per_period {
            let honest_type = rng.gen::<f64>() < config.honest_fraction;
            let cheats = !honest_type && decides_to_cheat(params, &eq, &state, &mut rng);

            if !cheats {
                state.cum_provider_profit += params.payment - params.cost_honest;
                state.avg_reputation =
                    (state.avg_reputation + REPUTATION_GAIN_HONEST).min(MAX_REPUTATION);
                continue;
            }

            period_frauds += 1;
            let effective_audit_prob = audit_floor.max(state.adaptive_audit_prob);

            if rng.gen::<f64>() < effective_audit_prob {
                period_detected += 1;
                if rng.gen::<f64>() < params.enforcement_prob {
                    let reward = params.dispute_reward();
                    state.cum_provider_profit -= reward;
                    state.cum_client_loss -= reward - params.dispute_cost();
                    state.avg_reputation = (state.avg_reputation - REPUTATION_LOSS_DETECTED).max(0.0);
                } else {
                    state.cum_client_loss += params.cost_safe + params.challenge_bond;
                }
            } else {
                state.cum_provider_profit += params.payment - params.cost_cheat;
                let loss = match &loss_noise {
                    Some(noise) => (params.client_loss + noise.sample(&mut rng)).max(0.0),
                    None => params.client_loss,
                };
                state.cum_client_loss += loss;
            }
        }

        total_frauds += period_frauds;
        total_detected += period_detected;

        let fraud_rate = if config.n_jobs_per_period > 0 {
            period_frauds as f64 / config.n_jobs_per_period as f64
        } else {
            0.0
        };
        let observed = state.observe_fraud_rate(fraud_rate);
        state.update_audit_prob(observed, &eq, audit_floor);

        let detection_rate = if period_frauds > 0 {
            period_detected as f64 / period_frauds as f64
        } else {
            periods
                .last()
                .map(|p: &PeriodObservation| p.detection_rate)
                .unwrap_or(fallback_detection_rate)
        };

        let observation = PeriodObservation {
            period,
            fraud_rate,
            detection_rate,
            audit_rate: state.adaptive_audit_prob,
            reputation: state.avg_reputation,
            provider_profit: state.cum_provider_profit,
            client_loss: state.cum_client_loss,
            welfare: state.cum_provider_profit - state.cum_client_loss,
        };
        trace!(?observation, observed_fraud_rate = observed, "period complete");
        periods.push(observation);
    }

    let total_jobs = job_count(config);
    let final_fraud_rate = if total_jobs > 0 {
        total_frauds as f64 / total_jobs as f64
    } else {
        0.0
    };
    let final_detection_rate = if total_frauds > 0 {
        total_detected as f64 / total_frauds as f64
    } else {
        fallback_detection_rate
    };
    let social_welfare = periods.last().map(|p| p.welfare).unwrap_or(0.0);

    debug!(
        total_jobs,
        total_frauds,
        total_detected,
        final_fraud_rate,
        social_welfare,
        "simulation complete"
    );

    SimulationResult {
        config: *config,
        equilibrium: eq,
        periods,
        total_jobs,
        total_frauds,
        total_detected,
        final_fraud_rate,
        final_detection_rate,
        social_welfare,
    }
}
