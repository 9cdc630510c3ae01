//! Configuration of the consensus engine.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of the environment variables overriding the configuration file,
/// eg. `QBFT__ROUND_CUTOFF` or `QBFT__TIMEOUTS__QUICK`.
pub const ENV_PREFIX: &str = "QBFT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Consensus parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Round at which an instance stops processing messages
    pub round_cutoff: u64,

    /// Number of most recent instances kept by the controller
    pub history_capacity: usize,

    /// Round timeouts
    pub timeouts: RoundTimeouts,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            round_cutoff: 15,
            history_capacity: 5,
            timeouts: RoundTimeouts::default(),
        }
    }
}

impl ConsensusConfig {
    /// Load the configuration from a TOML file, overridden by `QBFT__*`
    /// environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_cutoff < 2 {
            return Err(ConfigError::Invalid("round_cutoff must be at least 2"));
        }

        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be positive"));
        }

        Ok(())
    }
}

/// Round timeouts: quick for the first rounds, slow afterwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTimeouts {
    /// Timeout of the rounds up to `quick_rounds`
    #[serde(with = "humantime_serde")]
    pub quick: Duration,

    /// Timeout of the rounds above `quick_rounds`
    #[serde(with = "humantime_serde")]
    pub slow: Duration,

    /// Last round using the quick timeout
    pub quick_rounds: u64,
}

impl Default for RoundTimeouts {
    fn default() -> Self {
        Self {
            quick: Duration::from_secs(2),
            slow: Duration::from_secs(120),
            quick_rounds: 8,
        }
    }
}

impl RoundTimeouts {
    /// Return the timeout of the given round.
    pub fn duration(&self, round: u64) -> Duration {
        if round <= self.quick_rounds {
            self.quick
        } else {
            self.slow
        }
    }
}
