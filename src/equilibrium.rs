//! Closed-Form Equilibrium Solver
//!
//! Mixed-strategy equilibrium of the provider/client fraud game:
//!
//! - `Delta = p_w(beta*S_P + lambda*P_set) - (c_proof + c_tx) - (1-p_w)*B_C`
//! - `theta = v* = (c_H - c_F) / (P_set + S_P)`
//! - `q* = mu* = min(1, C_safe / (L + Delta))`
//! - `S_P^min = max(0, (C_disp + (1-p_w)*B_C - p_w*lambda*P_set) / (p_w*beta))`
//!
//! No iteration and no randomness. The only domain edges are the two
//! divisions by zero in `theta` and `S_P^min`, which return infinities
//! instead of failing.

use serde::{Deserialize, Serialize};

use crate::params::{ParamField, ProtocolParams};

/// Net expected dispute surplus conditional on fraud. May be negative.
pub fn compute_delta(params: &ProtocolParams) -> f64 {
    let p_w = params.enforcement_prob;
    p_w * params.dispute_reward()
        - (params.cost_proof + params.cost_tx)
        - (1.0 - p_w) * params.challenge_bond
}

/// Provider incentive threshold. Signed infinity when `P_set + S_P == 0`.
pub fn compute_theta(params: &ProtocolParams) -> f64 {
    let numerator = params.cost_honest - params.cost_cheat;
    let denominator = params.payment + params.stake;
    if denominator == 0.0 {
        return f64::INFINITY.copysign(numerator);
    }
    numerator / denominator
}

/// Equilibrium audit probability. Equal to `theta` and left unclamped, so
/// values above 1 signal that no audit rate can deter cheating.
pub fn compute_v_star(params: &ProtocolParams) -> f64 {
    compute_theta(params)
}

/// Equilibrium cheating probability, in [0,1].
pub fn compute_q_star(params: &ProtocolParams) -> f64 {
    let delta = compute_delta(params);
    let denominator = params.client_loss + delta;
    if denominator <= 0.0 {
        return 1.0;
    }
    (params.cost_safe / denominator).min(1.0)
}

/// Client belief threshold above which auditing pays. Same value as `q*`.
pub fn compute_mu_star(params: &ProtocolParams) -> f64 {
    compute_q_star(params)
}

/// Smallest stake for which disputing stays profitable. `+inf` when
/// `p_w * beta == 0`: no stake makes enforcement worthwhile.
pub fn compute_min_viable_stake(params: &ProtocolParams) -> f64 {
    let p_w = params.enforcement_prob;
    let numerator = params.dispute_cost() + (1.0 - p_w) * params.challenge_bond
        - p_w * params.routing_fraction * params.payment;
    let denominator = p_w * params.slash_fraction;
    if denominator == 0.0 {
        return f64::INFINITY;
    }
    (numerator / denominator).max(0.0)
}

/// Challenger's expected value of filing a dispute against a fraudulent result.
pub fn compute_dispute_value(params: &ProtocolParams) -> f64 {
    let p_w = params.enforcement_prob;
    p_w * params.dispute_reward() - params.dispute_cost() - (1.0 - p_w) * params.challenge_bond
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumValues {
    pub v_star: f64,
    pub q_star: f64,
    pub theta: f64,
    pub delta: f64,
    pub s_p_min: f64,
    pub mu_star: f64,

    // Both reduce to `S_P >= S_P^min`; kept as separate fields for callers.
    pub is_enforcement_viable: bool,
    pub is_ic_satisfied: bool,

    pub expected_fraud_rate: f64,
    pub expected_detection_rate: f64,
    pub expected_provider_utility: f64,
    pub expected_client_utility: f64,
}

pub fn compute_equilibrium(params: &ProtocolParams) -> EquilibriumValues {
    let v_star = compute_v_star(params);
    let q_star = compute_q_star(params);
    let theta = compute_theta(params);
    let delta = compute_delta(params);
    let s_p_min = compute_min_viable_stake(params);
    let mu_star = compute_mu_star(params);

    let loss = params.client_loss;

    let expected_fraud_rate = if loss + delta > 0.0 { q_star } else { 1.0 };
    let expected_detection_rate = if q_star > 0.0 { v_star } else { 1.0 };

    // Provider is indifferent at equilibrium, so honest utility is the payoff.
    let expected_provider_utility = params.payment - params.cost_honest;

    // E[U_C] = -P_set - v*C_safe - (1-v)*q*L + v*q*Delta
    let expected_client_utility = -params.payment
        - v_star * params.cost_safe
        - (1.0 - v_star) * q_star * loss
        + v_star * q_star * delta;

    EquilibriumValues {
        v_star,
        q_star,
        theta,
        delta,
        s_p_min,
        mu_star,
        is_enforcement_viable: params.stake >= s_p_min,
        is_ic_satisfied: v_star >= theta,
        expected_fraud_rate,
        expected_detection_rate,
        expected_provider_utility,
        expected_client_utility,
    }
}

/// Equilibrium series over one parameter, index-aligned with `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub field: ParamField,
    pub values: Vec<f64>,
    pub q_star: Vec<f64>,
    pub v_star: Vec<f64>,
    pub delta: Vec<f64>,
    pub s_p_min: Vec<f64>,
    pub theta: Vec<f64>,
    pub expected_fraud_rate: Vec<f64>,
}

impl SensitivityResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn sensitivity_analysis(
    base: &ProtocolParams,
    field: ParamField,
    values: &[f64],
) -> SensitivityResult {
    let mut result = SensitivityResult {
        field,
        values: values.to_vec(),
        q_star: Vec::with_capacity(values.len()),
        v_star: Vec::with_capacity(values.len()),
        delta: Vec::with_capacity(values.len()),
        s_p_min: Vec::with_capacity(values.len()),
        theta: Vec::with_capacity(values.len()),
        expected_fraud_rate: Vec::with_capacity(values.len()),
    };

    for &value in values {
        let eq = compute_equilibrium(&base.with(field, value));
        result.q_star.push(eq.q_star);
        result.v_star.push(eq.v_star);
        result.delta.push(eq.delta);
        result.s_p_min.push(eq.s_p_min);
        result.theta.push(eq.theta);
        result.expected_fraud_rate.push(eq.expected_fraud_rate);
    }

    result
}

/// `n` evenly spaced points over `[start, end]` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeThresholds {
    pub payment: Vec<f64>,
    pub s_p_min: Vec<f64>,
    pub q_star_at_min: Vec<f64>,
    pub v_star_at_min: Vec<f64>,
}

/// Minimum viable stake per payment level, with the equilibrium evaluated at
/// exactly that stake. Zeros where the minimum is zero.
pub fn stake_thresholds(params: &ProtocolParams, payments: &[f64]) -> StakeThresholds {
    let mut result = StakeThresholds {
        payment: payments.to_vec(),
        s_p_min: Vec::with_capacity(payments.len()),
        q_star_at_min: Vec::with_capacity(payments.len()),
        v_star_at_min: Vec::with_capacity(payments.len()),
    };

    for &payment in payments {
        let at_payment = params.with(ParamField::Payment, payment);
        let s_p_min = compute_min_viable_stake(&at_payment);
        result.s_p_min.push(s_p_min);

        if s_p_min > 0.0 {
            let eq = compute_equilibrium(&at_payment.with(ParamField::Stake, s_p_min));
            result.q_star_at_min.push(eq.q_star);
            result.v_star_at_min.push(eq.v_star);
        } else {
            result.q_star_at_min.push(0.0);
            result.v_star_at_min.push(0.0);
        }
    }

    result
}

/// Incentive-compatibility map over the `(P_set, S_P)` plane.
///
/// `theta[i][j]` and `viable[i][j]` are indexed by stake row `i` and
/// payment column `j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcRegion {
    pub payment: Vec<f64>,
    pub stake: Vec<f64>,
    pub theta: Vec<Vec<f64>>,
    pub s_p_min_curve: Vec<f64>,
    pub viable: Vec<Vec<bool>>,
}

pub fn ic_region(
    params: &ProtocolParams,
    payment_range: (f64, f64),
    stake_range: (f64, f64),
    resolution: usize,
) -> IcRegion {
    let payment = linspace(payment_range.0, payment_range.1, resolution);
    let stake = linspace(stake_range.0, stake_range.1, resolution);

    let s_p_min_curve: Vec<f64> = payment
        .iter()
        .map(|&p| compute_min_viable_stake(&params.with(ParamField::Payment, p)))
        .collect();

    let theta = stake
        .iter()
        .map(|&s| {
            payment
                .iter()
                .map(|&p| {
                    compute_theta(&ProtocolParams {
                        stake: s,
                        payment: p,
                        ..*params
                    })
                })
                .collect()
        })
        .collect();

    let viable = stake
        .iter()
        .map(|&s| s_p_min_curve.iter().map(|&min| s >= min).collect())
        .collect();

    IcRegion {
        payment,
        stake,
        theta,
        s_p_min_curve,
        viable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_scenario_values() {
        let p = ProtocolParams::default();

        assert!((compute_delta(&p) - 91.75).abs() < 1e-9);
        assert!((compute_theta(&p) - 0.03).abs() < 1e-12);
        assert!((compute_q_star(&p) - 8.0 / 141.75).abs() < 1e-12);
        assert_eq!(compute_min_viable_stake(&p), 0.0);
    }

    #[test]
    fn test_equilibrium_composition() {
        let p = ProtocolParams::default();
        let eq = compute_equilibrium(&p);

        assert_eq!(eq.v_star, eq.theta);
        assert_eq!(eq.mu_star, eq.q_star);
        assert!(eq.is_enforcement_viable);
        assert!(eq.is_ic_satisfied);
        assert!((eq.expected_provider_utility - 45.0).abs() < 1e-12);
        assert_eq!(eq.expected_fraud_rate, eq.q_star);
        assert_eq!(eq.expected_detection_rate, eq.v_star);

        let expected_client = -50.0 - 0.03 * 8.0 - 0.97 * eq.q_star * 50.0
            + 0.03 * eq.q_star * 91.75;
        assert!((eq.expected_client_utility - expected_client).abs() < 1e-9);
    }

    #[test]
    fn test_q_star_breakdown_returns_one() {
        // L + Delta <= 0: enforcement collapses entirely.
        let p = ProtocolParams {
            client_loss: 0.0,
            enforcement_prob: 0.0,
            challenge_bond: 100.0,
            ..ProtocolParams::default()
        };
        assert!(compute_delta(&p) + p.client_loss <= 0.0);
        assert_eq!(compute_q_star(&p), 1.0);
        assert_eq!(compute_equilibrium(&p).expected_fraud_rate, 1.0);
    }

    #[test]
    fn test_q_star_clamped_at_one() {
        let p = ProtocolParams {
            cost_safe: 1_000.0,
            ..ProtocolParams::default()
        };
        assert_eq!(compute_q_star(&p), 1.0);
    }

    #[test]
    fn test_zero_denominators_do_not_panic() {
        let p = ProtocolParams {
            stake: 0.0,
            payment: 0.0,
            ..ProtocolParams::default()
        };
        assert_eq!(compute_theta(&p), f64::INFINITY);

        let reversed = ProtocolParams {
            cost_honest: 0.0,
            cost_cheat: 1.0,
            ..p
        };
        assert_eq!(compute_theta(&reversed), f64::NEG_INFINITY);

        let no_slash = ProtocolParams {
            slash_fraction: 0.0,
            ..ProtocolParams::default()
        };
        assert_eq!(compute_min_viable_stake(&no_slash), f64::INFINITY);
        assert!(!compute_equilibrium(&no_slash).is_enforcement_viable);
    }

    #[test]
    fn test_v_star_is_not_clamped() {
        let p = ProtocolParams {
            stake: 1.0,
            payment: 1.0,
            ..ProtocolParams::default()
        };
        assert!((compute_v_star(&p) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_min_viable_stake_positive_for_small_payment() {
        let p = ProtocolParams {
            payment: 5.0,
            ..ProtocolParams::default()
        };
        // (11 + 0.25 - 4.75) / 0.475
        assert!((compute_min_viable_stake(&p) - 6.5 / 0.475).abs() < 1e-9);
    }

    #[test]
    fn test_dispute_value() {
        let p = ProtocolParams::default();
        // 0.95*100 - 11 - 0.25
        assert!((compute_dispute_value(&p) - 83.75).abs() < 1e-9);
    }

    #[test]
    fn test_lower_stake_raises_q_star() {
        let base = ProtocolParams::default();
        let low = base.with(ParamField::Stake, 5.0);
        assert!(compute_q_star(&low) > compute_q_star(&base));
    }

    #[test]
    fn test_sensitivity_matches_pointwise_equilibrium() {
        let base = ProtocolParams::default();
        let values = linspace(10.0, 500.0, 25);
        let result = sensitivity_analysis(&base, ParamField::Stake, &values);

        assert_eq!(result.len(), values.len());
        assert_eq!(result.q_star.len(), values.len());
        assert_eq!(result.s_p_min.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            let eq = compute_equilibrium(&base.with(ParamField::Stake, v));
            assert_eq!(result.q_star[i], eq.q_star);
            assert_eq!(result.v_star[i], eq.v_star);
            assert_eq!(result.delta[i], eq.delta);
            assert_eq!(result.s_p_min[i], eq.s_p_min);
        }
        assert_eq!(base, ProtocolParams::default());
    }

    #[test]
    fn test_sensitivity_empty_values() {
        let result = sensitivity_analysis(&ProtocolParams::default(), ParamField::EnforcementProb, &[]);
        assert!(result.is_empty());
        assert!(result.v_star.is_empty());
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 0), Vec::<f64>::new());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        let xs = linspace(0.0, 1.0, 5);
        assert_eq!(xs.len(), 5);
        assert!((xs[4] - 1.0).abs() < 1e-12);
        assert!((xs[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_stake_thresholds() {
        let p = ProtocolParams::default();
        let result = stake_thresholds(&p, &[1.0, 50.0]);

        assert_eq!(result.s_p_min.len(), 2);
        assert!(result.s_p_min[0] > 0.0);
        assert!(result.q_star_at_min[0] > 0.0);
        assert_eq!(result.s_p_min[1], 0.0);
        assert_eq!(result.q_star_at_min[1], 0.0);
    }

    #[test]
    fn test_ic_region_shape() {
        let region = ic_region(&ProtocolParams::default(), (1.0, 200.0), (0.0, 500.0), 10);

        assert_eq!(region.payment.len(), 10);
        assert_eq!(region.theta.len(), 10);
        assert!(region.theta.iter().all(|row| row.len() == 10));
        // Highest stake row is viable everywhere.
        assert!(region.viable[9].iter().all(|&v| v));
        // Zero stake with tiny payment is not.
        assert!(!region.viable[0][0]);
    }

    proptest! {
        #[test]
        fn prop_q_star_in_unit_interval(
            stake in 0.0f64..1_000.0,
            payment in 0.0f64..500.0,
            cost_safe in 0.0f64..100.0,
            beta in 0.0f64..=1.0,
            lambda in 0.0f64..=1.0,
            p_w in 0.0f64..=1.0,
            bond in 0.0f64..100.0,
            loss in 0.0f64..500.0,
        ) {
            let p = ProtocolParams {
                stake,
                payment,
                cost_safe,
                slash_fraction: beta,
                routing_fraction: lambda,
                enforcement_prob: p_w,
                challenge_bond: bond,
                client_loss: loss,
                ..ProtocolParams::default()
            };
            let q = compute_q_star(&p);
            prop_assert!((0.0..=1.0).contains(&q));
        }

        #[test]
        fn prop_v_star_in_unit_interval_when_costs_bounded(
            stake in 0.1f64..1_000.0,
            payment in 0.1f64..500.0,
            cost_cheat in 0.0f64..10.0,
            extra in 0.0f64..1.0,
        ) {
            // c_F <= c_H <= P_set + S_P
            let cost_honest = cost_cheat + extra * (payment + stake - cost_cheat).max(0.0);
            let p = ProtocolParams {
                stake,
                payment,
                cost_honest,
                cost_cheat: cost_cheat.min(cost_honest),
                ..ProtocolParams::default()
            };
            let v = compute_v_star(&p);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn prop_min_viable_stake_non_negative(
            payment in 0.0f64..500.0,
            beta in 0.01f64..=1.0,
            p_w in 0.01f64..=1.0,
            bond in 0.0f64..100.0,
            cost_safe in 0.0f64..100.0,
        ) {
            let p = ProtocolParams {
                payment,
                slash_fraction: beta,
                enforcement_prob: p_w,
                challenge_bond: bond,
                cost_safe,
                ..ProtocolParams::default()
            };
            let s = compute_min_viable_stake(&p);
            prop_assert!(s >= 0.0);
            prop_assert!(s.is_finite());
        }
    }
}
