use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::HistoryError;

// =============================================================================
// Aggregator config (figment-deserialized from defaults / toml file / env vars)
// =============================================================================
//
//   history.toml:    param = "__sc"
//
//   env var:         HISTORY_AGGREGATOR_PARAM=__sc

/// Query key used when nothing else is configured.
pub const DEFAULT_PARAM: &str = "__sc";

/// Env var prefix read by [`AggregatorConfig::load`].
pub const ENV_PREFIX: &str = "HISTORY_AGGREGATOR_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Query parameter that carries the secondary location. Must not collide
    /// with any parameter the application itself uses.
    #[serde(default = "default_param")]
    pub param: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            param: default_param(),
        }
    }
}

fn default_param() -> String {
    DEFAULT_PARAM.to_string()
}

/// Build a figment that layers: defaults → `file` (if given) → `HISTORY_AGGREGATOR_*` env vars.
pub fn build_figment(file: Option<&Path>) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    let mut figment = Figment::from(Serialized::defaults(AggregatorConfig::default()));
    if let Some(file) = file {
        figment = figment.merge(Toml::file(file));
    }
    figment.merge(Env::prefixed(ENV_PREFIX))
}

impl AggregatorConfig {
    pub fn load(file: Option<&Path>) -> Result<Self, HistoryError> {
        Self::from_figment(&build_figment(file))
    }

    pub fn from_figment(figment: &figment::Figment) -> Result<Self, HistoryError> {
        let config: Self = figment
            .extract()
            .map_err(|e| HistoryError::Config(e.to_string()))?;
        if config.param.is_empty() {
            return Err(HistoryError::Config("param must not be empty".to_string()));
        }
        debug!(param = %config.param, "loaded aggregator config");
        Ok(config)
    }
}
