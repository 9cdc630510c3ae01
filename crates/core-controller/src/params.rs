use qbft_config::ConsensusConfig;
use qbft_core_instance::Params as InstanceParams;
use qbft_core_types::Round;

/// Number of most recent instances kept by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Controller parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// Number of most recent instances kept, older ones are evicted
    pub history_capacity: usize,

    /// Parameters of every instance
    pub instance: InstanceParams,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            instance: InstanceParams::default(),
        }
    }
}

impl From<&ConsensusConfig> for Params {
    fn from(config: &ConsensusConfig) -> Self {
        Self {
            history_capacity: config.history_capacity,
            instance: InstanceParams {
                round_cutoff: Round::new(config.round_cutoff),
            },
        }
    }
}
