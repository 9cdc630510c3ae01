use core::fmt;

/// A round number.
///
/// Rounds start at [`Round::FIRST`] and only ever grow within an instance.
/// The zero value is reserved to encode "no round" on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Round(u64);

impl Round {
    /// The round every instance starts at.
    pub const FIRST: Self = Self(1);

    /// Create a new round.
    pub const fn new(round: u64) -> Self {
        Self(round)
    }

    /// Return the round as a `u64`.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Return the next round.
    pub const fn increment(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Whether this round is the first round.
    pub const fn is_first(&self) -> bool {
        self.0 == Self::FIRST.0
    }
}

impl From<u64> for Round {
    fn from(round: u64) -> Self {
        Self(round)
    }
}

impl fmt::Display for Round {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
