//! Command-line plumbing shared by the report binaries.

use std::path::PathBuf;

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::params::{parse_override as parse_param_override, ParamField, Preset};

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// TOML file with optional [params], [simulation] and [attack] tables
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Named parameter preset (baseline, weak_enforcement, high_verification_cost)
    #[arg(long, conflicts_with = "config")]
    pub preset: Option<Preset>,

    /// Override one parameter, e.g. `--set S_P=5`; may be repeated
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(ParamField, f64)>,

    /// Log level when RUST_LOG is not set
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Emit JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

fn parse_override(s: &str) -> std::result::Result<(ParamField, f64), String> {
    parse_param_override(s).map_err(|e| e.to_string())
}

impl CommonArgs {
    /// Config file or preset first, then `--set` overrides in order.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = match (&self.config, self.preset) {
            (Some(path), _) => RunConfig::from_path(path)?,
            (None, Some(preset)) => RunConfig {
                params: preset.params(),
                ..RunConfig::default()
            },
            (None, None) => RunConfig::default(),
        };

        for &(field, value) in &self.overrides {
            if !value.is_finite() {
                return Err(Error::InvalidOverride(format!("{field} must be finite")));
            }
            config.params = config.params.with(field, value);
        }

        Ok(config)
    }
}

pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
