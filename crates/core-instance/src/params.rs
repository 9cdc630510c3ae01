use qbft_core_types::Round;

/// Round from which an instance stops processing messages.
pub const DEFAULT_ROUND_CUTOFF: Round = Round::new(15);

/// Instance parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// Once the local round reaches this round, every message is rejected.
    pub round_cutoff: Round,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            round_cutoff: DEFAULT_ROUND_CUTOFF,
        }
    }
}
