use core::fmt;

/// Identity of a committee member, ie. a signer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperatorId(u64);

impl OperatorId {
    /// Create a new operator identity.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Return the identity as a `u64`.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for OperatorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OperatorId {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
