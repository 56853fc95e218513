//! Fraud Game Simulation Library
//!
//! Tools for analysing fraud deterrence in off-chain computation markets,
//! where providers post stake, clients may audit results, and challengers
//! dispute fraud for a share of the slashed stake.
//!
//! ## Modules
//!
//! - `equilibrium`: closed-form mixed equilibrium and sensitivity sweeps
//! - `simulation`: period-stepped market with adaptive client auditing
//! - `attack`: baseline vs perturbed runs for five attack scenarios
//! - `monte_carlo`: seed sweeps with tail-risk metrics
//! - `params`, `config`, `cli`: parameter snapshots and how binaries load them
//!
//! ## Usage
//!
//! ```bash
//! # Equilibrium table and a stake sensitivity sweep
//! cargo run --bin equilibrium --release -- --sweep S_P --from 10 --to 500
//!
//! # Single simulation run
//! cargo run --bin simulate --release -- --set p_w=0.8
//!
//! # Attack comparison with a 50-seed robustness sweep
//! cargo run --bin attacks --release -- --runs 50
//! ```

pub mod attack;
pub mod cli;
pub mod config;
pub mod equilibrium;
pub mod error;
pub mod monte_carlo;
pub mod params;
pub mod rng;
pub mod simulation;

pub use attack::{simulate_attack, AttackResult, AttackType, Severity};
pub use equilibrium::{compute_equilibrium, sensitivity_analysis, EquilibriumValues, SensitivityResult};
pub use error::{Error, Result};
pub use params::{ParamField, Preset, ProtocolParams};
pub use simulation::{run_simulation, SimulationConfig, SimulationResult};
