//! Error types for the fraud game simulation library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised at the fallible edges of the crate.
///
/// The equilibrium formulas and the simulation loop are total and never
/// return these; only name parsing and configuration loading do.
#[derive(Error, Debug)]
pub enum Error {
    /// Parameter name not recognised by `ParamField`
    #[error("Unknown parameter field: {0}")]
    UnknownField(String),

    /// Attack tag not one of the five known scenarios
    #[error("Unknown attack type: {0}")]
    UnknownAttack(String),

    /// Preset name not recognised
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Malformed `FIELD=VALUE` override
    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration error
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
