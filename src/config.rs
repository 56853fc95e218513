//! Run configuration
//!
//! Binaries load a TOML file into a `RunConfig` and pass plain snapshots to
//! the engine. Every table and key is optional:
//!
//! ```toml
//! [params]
//! S_P = 100.0
//! p_w = 0.95
//!
//! [simulation]
//! n_periods = 200
//! seed = 7
//!
//! [attack]
//! n_periods = 300
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::attack::AttackConfig;
use crate::error::Result;
use crate::params::ProtocolParams;
use crate::simulation::SimulationConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub params: ProtocolParams,
    pub simulation: SimulationConfig,
    pub attack: AttackConfig,
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
