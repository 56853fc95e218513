//! Protocol Parameters
//!
//! The economic structure of the fraud game: stakes, payments, costs,
//! reward routing and enforcement reliability. A `ProtocolParams` value is an
//! immutable snapshot; every computation takes one by reference and derives
//! what it needs from it.
//!
//! ## Symbols
//! - `S_P`: provider stake, `P_set`: settlement payment
//! - `c_H`, `c_F`: provider cost of honest / fraudulent execution
//! - `C_safe`, `c_proof`, `c_tx`: fallback, fraud-proof and on-chain costs
//! - `beta`, `lambda`: slash and payment routing fractions
//! - `p_w`: enforcement probability, `B_C`: challenge bond
//! - `L`: client loss from an incorrect result, `v_min`: audit floor

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Provider stake at risk of slashing (`S_P`)
    #[serde(alias = "S_P")]
    pub stake: f64,
    /// Settlement payment per job (`P_set`)
    #[serde(alias = "P_set")]
    pub payment: f64,
    #[serde(alias = "c_H")]
    pub cost_honest: f64,
    #[serde(alias = "c_F")]
    pub cost_cheat: f64,
    /// Cost of the safe fallback computation a client runs to audit (`C_safe`)
    #[serde(alias = "C_safe")]
    pub cost_safe: f64,
    #[serde(alias = "c_proof")]
    pub cost_proof: f64,
    #[serde(alias = "c_tx")]
    pub cost_tx: f64,
    /// Fraction of slashed stake routed to the challenger (`beta`), in [0,1]
    #[serde(alias = "beta")]
    pub slash_fraction: f64,
    /// Fraction of `P_set` routed to the challenger (`lambda`), in [0,1]
    #[serde(alias = "lambda")]
    pub routing_fraction: f64,
    /// Probability a valid dispute is enforced on-chain (`p_w`), in [0,1]
    #[serde(alias = "p_w")]
    pub enforcement_prob: f64,
    #[serde(alias = "B_C")]
    pub challenge_bond: f64,
    #[serde(alias = "L")]
    pub client_loss: f64,
    /// Lower bound on the adaptive audit probability (`v_min`)
    #[serde(alias = "v_min")]
    pub audit_floor: f64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            stake: 100.0,
            payment: 50.0,
            cost_honest: 5.0,
            cost_cheat: 0.5,
            cost_safe: 8.0,
            cost_proof: 2.0,
            cost_tx: 1.0,
            slash_fraction: 0.5,
            routing_fraction: 1.0,
            enforcement_prob: 0.95,
            challenge_bond: 5.0,
            client_loss: 50.0,
            audit_floor: 0.02,
        }
    }
}

impl ProtocolParams {
    /// Total cost of running a dispute: `C_disp = C_safe + c_proof + c_tx`
    pub fn dispute_cost(&self) -> f64 {
        self.cost_safe + self.cost_proof + self.cost_tx
    }

    /// Challenger reward on a successful dispute: `beta*S_P + lambda*P_set`
    pub fn dispute_reward(&self) -> f64 {
        self.slash_fraction * self.stake + self.routing_fraction * self.payment
    }

    pub fn get(&self, field: ParamField) -> f64 {
        field.get(self)
    }

    /// Copy of `self` with one field replaced.
    pub fn with(&self, field: ParamField, value: f64) -> Self {
        let mut params = *self;
        field.set(&mut params, value);
        params
    }
}

/// Names a single scalar field of `ProtocolParams`.
///
/// Used by sensitivity sweeps and command-line overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamField {
    Stake,
    Payment,
    CostHonest,
    CostCheat,
    CostSafe,
    CostProof,
    CostTx,
    SlashFraction,
    RoutingFraction,
    EnforcementProb,
    ChallengeBond,
    ClientLoss,
    AuditFloor,
}

impl ParamField {
    pub fn all() -> Vec<Self> {
        vec![
            Self::Stake,
            Self::Payment,
            Self::CostHonest,
            Self::CostCheat,
            Self::CostSafe,
            Self::CostProof,
            Self::CostTx,
            Self::SlashFraction,
            Self::RoutingFraction,
            Self::EnforcementProb,
            Self::ChallengeBond,
            Self::ClientLoss,
            Self::AuditFloor,
        ]
    }

    /// Model symbol, as used in the paper and on the dashboard.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Stake => "S_P",
            Self::Payment => "P_set",
            Self::CostHonest => "c_H",
            Self::CostCheat => "c_F",
            Self::CostSafe => "C_safe",
            Self::CostProof => "c_proof",
            Self::CostTx => "c_tx",
            Self::SlashFraction => "beta",
            Self::RoutingFraction => "lambda",
            Self::EnforcementProb => "p_w",
            Self::ChallengeBond => "B_C",
            Self::ClientLoss => "L",
            Self::AuditFloor => "v_min",
        }
    }

    /// Rust field name on `ProtocolParams`.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Payment => "payment",
            Self::CostHonest => "cost_honest",
            Self::CostCheat => "cost_cheat",
            Self::CostSafe => "cost_safe",
            Self::CostProof => "cost_proof",
            Self::CostTx => "cost_tx",
            Self::SlashFraction => "slash_fraction",
            Self::RoutingFraction => "routing_fraction",
            Self::EnforcementProb => "enforcement_prob",
            Self::ChallengeBond => "challenge_bond",
            Self::ClientLoss => "client_loss",
            Self::AuditFloor => "audit_floor",
        }
    }

    pub fn get(&self, params: &ProtocolParams) -> f64 {
        match self {
            Self::Stake => params.stake,
            Self::Payment => params.payment,
            Self::CostHonest => params.cost_honest,
            Self::CostCheat => params.cost_cheat,
            Self::CostSafe => params.cost_safe,
            Self::CostProof => params.cost_proof,
            Self::CostTx => params.cost_tx,
            Self::SlashFraction => params.slash_fraction,
            Self::RoutingFraction => params.routing_fraction,
            Self::EnforcementProb => params.enforcement_prob,
            Self::ChallengeBond => params.challenge_bond,
            Self::ClientLoss => params.client_loss,
            Self::AuditFloor => params.audit_floor,
        }
    }

    fn set(&self, params: &mut ProtocolParams, value: f64) {
        let slot = match self {
            Self::Stake => &mut params.stake,
            Self::Payment => &mut params.payment,
            Self::CostHonest => &mut params.cost_honest,
            Self::CostCheat => &mut params.cost_cheat,
            Self::CostSafe => &mut params.cost_safe,
            Self::CostProof => &mut params.cost_proof,
            Self::CostTx => &mut params.cost_tx,
            Self::SlashFraction => &mut params.slash_fraction,
            Self::RoutingFraction => &mut params.routing_fraction,
            Self::EnforcementProb => &mut params.enforcement_prob,
            Self::ChallengeBond => &mut params.challenge_bond,
            Self::ClientLoss => &mut params.client_loss,
            Self::AuditFloor => &mut params.audit_floor,
        };
        *slot = value;
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ParamField {
    type Err = Error;

    /// Accepts either the model symbol (`S_P`) or the field name (`stake`).
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::all()
            .into_iter()
            .find(|field| field.symbol() == name || field.field_name() == name)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// Named parameter sets for common what-if scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Baseline,
    WeakEnforcement,
    HighVerificationCost,
}

impl Preset {
    pub fn all() -> Vec<Self> {
        vec![Self::Baseline, Self::WeakEnforcement, Self::HighVerificationCost]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::WeakEnforcement => "weak_enforcement",
            Self::HighVerificationCost => "high_verification_cost",
        }
    }

    pub fn params(&self) -> ProtocolParams {
        let base = ProtocolParams::default();
        match self {
            Self::Baseline => base,
            Self::WeakEnforcement => ProtocolParams {
                enforcement_prob: 0.7,
                slash_fraction: 0.3,
                ..base
            },
            Self::HighVerificationCost => ProtocolParams {
                cost_safe: 25.0,
                cost_proof: 5.0,
                ..base
            },
        }
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().replace('-', "_").to_lowercase();
        Self::all()
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| Error::UnknownPreset(s.to_string()))
    }
}

/// Parses a `FIELD=VALUE` override such as `S_P=5` or `enforcement_prob=0.7`.
pub fn parse_override(s: &str) -> Result<(ParamField, f64)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| Error::InvalidOverride(format!("expected FIELD=VALUE, got `{s}`")))?;
    let field: ParamField = name.parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidOverride(format!("`{value}` is not a number")))?;
    Ok((field, value))
}
