//! Attack Scenario Evaluation
//!
//! Each attack is a deterministic perturbation of the protocol parameters
//! and/or the honest-provider share. An evaluation runs the simulation twice,
//! once on the baseline and once on the perturbed market, and reports the
//! difference in fraud and welfare.
//!
//! | Attack             | Parameter change  | Honest fraction |
//! |--------------------|-------------------|-----------------|
//! | reputation_farming | none              | 0.4             |
//! | no_stake_floor     | `S_P = 5`         | unchanged       |
//! | sybil              | none              | 0.3             |
//! | collusion          | `C_safe` doubled  | 0.4             |
//! | censorship         | `p_w` scaled 0.7  | unchanged       |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::equilibrium::{compute_delta, compute_equilibrium, compute_min_viable_stake, compute_q_star};
use crate::error::{Error, Result};
use crate::params::ProtocolParams;
use crate::simulation::{run_simulation, SimulationConfig};

/// Share of welfare loss attributed to the attacker. A heuristic, not derived
/// from agent accounting.
pub const ATTACKER_PROFIT_SHARE: f64 = 0.4;

pub const NO_STAKE_FLOOR_STAKE: f64 = 5.0;
pub const CENSORSHIP_ENFORCEMENT_FACTOR: f64 = 0.7;
pub const COLLUSION_VERIFICATION_FACTOR: f64 = 2.0;

const CRITICAL_WELFARE_LOSS: f64 = 5000.0;
const HIGH_WELFARE_LOSS: f64 = 2000.0;
const MEDIUM_WELFARE_LOSS: f64 = 500.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    ReputationFarming,
    NoStakeFloor,
    Sybil,
    Collusion,
    Censorship,
}

impl AttackType {
    pub fn all() -> Vec<Self> {
        vec![
            Self::ReputationFarming,
            Self::NoStakeFloor,
            Self::Sybil,
            Self::Collusion,
            Self::Censorship,
        ]
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::ReputationFarming => "reputation_farming",
            Self::NoStakeFloor => "no_stake_floor",
            Self::Sybil => "sybil",
            Self::Collusion => "collusion",
            Self::Censorship => "censorship",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReputationFarming => "Reputation Farming",
            Self::NoStakeFloor => "No Stake Floor",
            Self::Sybil => "Sybil Attack",
            Self::Collusion => "Collusion",
            Self::Censorship => "Censorship",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ReputationFarming => {
                "Build reputation on cheap honest jobs, then cheat while clients audit less"
            }
            Self::NoStakeFloor => {
                "Provider posts a minimal stake so slashing barely hurts when caught"
            }
            Self::Sybil => "Many cheap identities dilute the honest provider population",
            Self::Collusion => {
                "Provider and client share the savings of skipped verification"
            }
            Self::Censorship => "Dispute transactions are censored before the challenge deadline",
        }
    }

    pub fn parameter_change(&self) -> &'static str {
        match self {
            Self::ReputationFarming => "honest fraction 0.6 -> 0.4",
            Self::NoStakeFloor => "S_P -> 5",
            Self::Sybil => "honest fraction 0.6 -> 0.3",
            Self::Collusion => "C_safe x2, honest fraction 0.6 -> 0.4",
            Self::Censorship => "p_w x0.7",
        }
    }

    /// Perturbed `(params, honest_fraction)` for this attack.
    pub fn apply(&self, params: &ProtocolParams, honest_fraction: f64) -> (ProtocolParams, f64) {
        match self {
            Self::ReputationFarming => (*params, 0.4),
            Self::NoStakeFloor => (
                ProtocolParams {
                    stake: NO_STAKE_FLOOR_STAKE,
                    ..*params
                },
                honest_fraction,
            ),
            Self::Sybil => (*params, 0.3),
            Self::Collusion => (
                ProtocolParams {
                    cost_safe: params.cost_safe * COLLUSION_VERIFICATION_FACTOR,
                    ..*params
                },
                0.4,
            ),
            Self::Censorship => (
                ProtocolParams {
                    enforcement_prob: params.enforcement_prob * CENSORSHIP_ENFORCEMENT_FACTOR,
                    ..*params
                },
                honest_fraction,
            ),
        }
    }
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for AttackType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().replace('-', "_").to_lowercase();
        Self::all()
            .into_iter()
            .find(|attack| attack.tag() == tag)
            .ok_or_else(|| Error::UnknownAttack(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Step function over welfare loss; every boundary is exclusive.
    pub fn from_welfare_loss(welfare_loss: f64) -> Self {
        if welfare_loss > CRITICAL_WELFARE_LOSS {
            Self::Critical
        } else if welfare_loss > HIGH_WELFARE_LOSS {
            Self::High
        } else if welfare_loss > MEDIUM_WELFARE_LOSS {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    pub n_periods: usize,
    pub n_jobs_per_period: usize,
    pub baseline_honest_fraction: f64,
    pub baseline_seed: u64,
    pub attack_seed: u64,
    pub attacker_profit_share: f64,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            n_periods: 100,
            n_jobs_per_period: 20,
            baseline_honest_fraction: 0.6,
            baseline_seed: 42,
            attack_seed: 43,
            attacker_profit_share: ATTACKER_PROFIT_SHARE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    pub attack: AttackType,
    pub name: String,
    pub description: String,
    pub parameter_change: String,

    pub baseline_fraud_rate: f64,
    pub attack_fraud_rate: f64,
    pub fraud_rate_change: f64,
    pub detection_rate_change: f64,

    pub baseline_social_welfare: f64,
    pub attack_social_welfare: f64,
    pub welfare_loss: f64,
    pub attacker_profit: f64,
    pub severity: Severity,
}

impl AttackResult {
    pub fn print(&self) {
        println!("  Change:                  {}", self.parameter_change);
        println!("  Baseline fraud rate:     {:.2}%", self.baseline_fraud_rate * 100.0);
        println!("  Attack fraud rate:       {:.2}%", self.attack_fraud_rate * 100.0);
        println!("  Fraud rate change:       {:+.2}pp", self.fraud_rate_change * 100.0);
        println!("  Detection rate change:   {:+.2}pp", self.detection_rate_change * 100.0);
        println!("  Welfare loss:            {:.0}", self.welfare_loss);
        println!("  Attacker profit (est.):  {:.0}", self.attacker_profit);
        println!("  Severity:                {}", self.severity);
    }
}

/// Evaluates `attack` with the default configuration over `n_periods`.
pub fn simulate_attack(params: &ProtocolParams, attack: AttackType, n_periods: usize) -> AttackResult {
    let config = AttackConfig {
        n_periods,
        ..AttackConfig::default()
    };
    evaluate_attack(params, attack, &config)
}

pub fn evaluate_attack(params: &ProtocolParams, attack: AttackType, config: &AttackConfig) -> AttackResult {
    let baseline_config = SimulationConfig {
        n_periods: config.n_periods,
        n_jobs_per_period: config.n_jobs_per_period,
        honest_fraction: config.baseline_honest_fraction,
        seed: config.baseline_seed,
        ..SimulationConfig::default()
    };
    let baseline = run_simulation(params, &baseline_config);

    let (attack_params, attack_honest_fraction) = attack.apply(params, config.baseline_honest_fraction);
    let attack_config = SimulationConfig {
        honest_fraction: attack_honest_fraction,
        seed: config.attack_seed,
        ..baseline_config
    };
    let attacked = run_simulation(&attack_params, &attack_config);

    let fraud_rate_change = attacked.final_fraud_rate - baseline.final_fraud_rate;
    let welfare_loss = baseline.social_welfare - attacked.social_welfare;
    let severity = Severity::from_welfare_loss(welfare_loss);

    debug!(
        attack = attack.tag(),
        fraud_rate_change,
        welfare_loss,
        severity = severity.name(),
        "attack evaluated"
    );

    AttackResult {
        attack,
        name: attack.name().to_string(),
        description: attack.description().to_string(),
        parameter_change: attack.parameter_change().to_string(),
        baseline_fraud_rate: baseline.final_fraud_rate,
        attack_fraud_rate: attacked.final_fraud_rate,
        fraud_rate_change,
        detection_rate_change: attacked.final_detection_rate - baseline.final_detection_rate,
        baseline_social_welfare: baseline.social_welfare,
        attack_social_welfare: attacked.social_welfare,
        welfare_loss,
        attacker_profit: config.attacker_profit_share * welfare_loss,
        severity,
    }
}

pub fn simulate_all_attacks(params: &ProtocolParams, config: &AttackConfig) -> Vec<AttackResult> {
    AttackType::all()
        .into_iter()
        .map(|attack| evaluate_attack(params, attack, config))
        .collect()
}

/// Closed-form profitability of an attack, without simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attack", rename_all = "snake_case")]
pub enum AttackProfitability {
    ReputationFarming {
        cheat_profit: f64,
        honest_profit: f64,
        attack_advantage: f64,
        farming_cost: f64,
        net_attack_profit: f64,
    },
    NoStakeFloor {
        cheat_profit: f64,
        honest_profit: f64,
        attack_advantage: f64,
        min_viable_stake: f64,
        disputing_viable: bool,
    },
    Censorship {
        original_q_star: f64,
        new_q_star: f64,
        fraud_rate_increase: f64,
        original_delta: f64,
        new_delta: f64,
    },
}

const FARMING_AUDIT_DISCOUNT: f64 = 0.5;
const FARMING_WARMUP_JOBS: f64 = 20.0;
const FARMING_EXPLOIT_JOBS: f64 = 5.0;

/// `None` for sybil and collusion, which only have simulated outcomes.
pub fn analyze_profitability(params: &ProtocolParams, attack: AttackType) -> Option<AttackProfitability> {
    let eq = compute_equilibrium(params);
    let honest_profit = params.payment - params.cost_honest;

    match attack {
        AttackType::ReputationFarming => {
            let reduced_v = eq.v_star * FARMING_AUDIT_DISCOUNT;
            let cheat_profit =
                params.payment - params.cost_cheat - reduced_v * (params.payment + params.stake);
            let farming_cost = params.cost_honest * FARMING_WARMUP_JOBS;
            let attack_advantage = cheat_profit - honest_profit;
            Some(AttackProfitability::ReputationFarming {
                cheat_profit,
                honest_profit,
                attack_advantage,
                farming_cost,
                net_attack_profit: attack_advantage - farming_cost / FARMING_EXPLOIT_JOBS,
            })
        }
        AttackType::NoStakeFloor => {
            let (attacked, _) = attack.apply(params, 0.0);
            let min_viable_stake = compute_min_viable_stake(params);
            let disputing_viable = attacked.stake >= min_viable_stake;
            // Below the viable stake nobody disputes, so cheating is free.
            let cheat_profit = if disputing_viable {
                params.payment - params.cost_cheat - eq.v_star * (params.payment + attacked.stake)
            } else {
                params.payment - params.cost_cheat
            };
            Some(AttackProfitability::NoStakeFloor {
                cheat_profit,
                honest_profit,
                attack_advantage: cheat_profit - honest_profit,
                min_viable_stake,
                disputing_viable,
            })
        }
        AttackType::Censorship => {
            let (attacked, _) = attack.apply(params, 0.0);
            let new_q_star = compute_q_star(&attacked);
            Some(AttackProfitability::Censorship {
                original_q_star: eq.q_star,
                new_q_star,
                fraud_rate_increase: new_q_star - eq.q_star,
                original_delta: eq.delta,
                new_delta: compute_delta(&attacked),
            })
        }
        AttackType::Sybil | AttackType::Collusion => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_tags_round_trip() {
        for attack in AttackType::all() {
            assert_eq!(attack.tag().parse::<AttackType>().unwrap(), attack);
        }
        assert_eq!("no-stake-floor".parse::<AttackType>().unwrap(), AttackType::NoStakeFloor);
        assert!(matches!("griefing".parse::<AttackType>(), Err(Error::UnknownAttack(_))));
    }

    #[test]
    fn test_transforms() {
        let p = ProtocolParams::default();

        assert_eq!(AttackType::ReputationFarming.apply(&p, 0.6), (p, 0.4));
        assert_eq!(AttackType::Sybil.apply(&p, 0.6), (p, 0.3));

        let (no_floor, h) = AttackType::NoStakeFloor.apply(&p, 0.6);
        assert_eq!(no_floor.stake, 5.0);
        assert_eq!(h, 0.6);

        let (collusion, h) = AttackType::Collusion.apply(&p, 0.6);
        assert_eq!(collusion.cost_safe, 16.0);
        assert_eq!(h, 0.4);

        let (censored, h) = AttackType::Censorship.apply(&p, 0.6);
        assert!((censored.enforcement_prob - 0.665).abs() < 1e-12);
        assert_eq!(h, 0.6);
    }

    #[test]
    fn test_severity_boundaries_are_exclusive() {
        assert_eq!(Severity::from_welfare_loss(-100.0), Severity::Low);
        assert_eq!(Severity::from_welfare_loss(500.0), Severity::Low);
        assert_eq!(Severity::from_welfare_loss(500.01), Severity::Medium);
        assert_eq!(Severity::from_welfare_loss(2000.0), Severity::Medium);
        assert_eq!(Severity::from_welfare_loss(2000.01), Severity::High);
        assert_eq!(Severity::from_welfare_loss(5000.0), Severity::High);
        assert_eq!(Severity::from_welfare_loss(5000.01), Severity::Critical);
    }

    #[test]
    fn test_attack_result_accounting() {
        let p = ProtocolParams::default();
        for attack in AttackType::all() {
            let r = simulate_attack(&p, attack, 50);

            assert_eq!(r.attack, attack);
            assert!((r.fraud_rate_change - (r.attack_fraud_rate - r.baseline_fraud_rate)).abs() < 1e-12);
            assert!((r.welfare_loss - (r.baseline_social_welfare - r.attack_social_welfare)).abs() < 1e-9);
            assert!((r.attacker_profit - ATTACKER_PROFIT_SHARE * r.welfare_loss).abs() < 1e-9);
            assert_eq!(r.severity, Severity::from_welfare_loss(r.welfare_loss));
        }
    }

    #[test]
    fn test_baseline_run_matches_direct_simulation() {
        let p = ProtocolParams::default();
        let r = simulate_attack(&p, AttackType::Sybil, 100);
        let baseline = run_simulation(&p, &SimulationConfig::default());
        assert_eq!(r.baseline_fraud_rate, baseline.final_fraud_rate);
        assert_eq!(r.baseline_social_welfare, baseline.social_welfare);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let p = ProtocolParams::default();
        let a = simulate_all_attacks(&p, &AttackConfig::default());
        let b = simulate_all_attacks(&p, &AttackConfig::default());
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_profitability_closed_forms() {
        let p = ProtocolParams::default();

        match analyze_profitability(&p, AttackType::Censorship) {
            Some(AttackProfitability::Censorship { new_q_star, original_q_star, new_delta, original_delta, .. }) => {
                assert!(new_q_star > original_q_star);
                assert!(new_delta < original_delta);
            }
            other => panic!("unexpected {other:?}"),
        }

        match analyze_profitability(&p, AttackType::NoStakeFloor) {
            Some(AttackProfitability::NoStakeFloor { disputing_viable, cheat_profit, .. }) => {
                // S_P^min is 0 at default payment, so disputes still happen.
                assert!(disputing_viable);
                assert!((cheat_profit - (49.5 - 0.03 * 55.0)).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }

        match analyze_profitability(&p, AttackType::ReputationFarming) {
            Some(AttackProfitability::ReputationFarming { cheat_profit, farming_cost, .. }) => {
                assert!((cheat_profit - (49.5 - 0.015 * 150.0)).abs() < 1e-9);
                assert_eq!(farming_cost, 100.0);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(analyze_profitability(&p, AttackType::Sybil).is_none());
        assert!(analyze_profitability(&p, AttackType::Collusion).is_none());
    }

    #[test]
    fn test_no_stake_floor_free_cheating_below_minimum() {
        let p = ProtocolParams {
            payment: 1.0,
            ..ProtocolParams::default()
        };
        match analyze_profitability(&p, AttackType::NoStakeFloor) {
            Some(AttackProfitability::NoStakeFloor { disputing_viable, cheat_profit, .. }) => {
                assert!(!disputing_viable);
                assert_eq!(cheat_profit, 1.0 - 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
