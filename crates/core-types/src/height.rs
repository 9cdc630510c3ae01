use core::fmt;

/// A consensus decision slot.
///
/// Heights are strictly increasing and exactly one instance runs per height.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Height(u64);

impl Height {
    /// The first height.
    pub const ZERO: Self = Self(0);

    /// Create a new height.
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// Return the height as a `u64`.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Return the next height.
    pub const fn increment(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Return the previous height, if any.
    pub const fn decrement(&self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(h) => Some(Self(h)),
            None => None,
        }
    }
}

impl From<u64> for Height {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

impl fmt::Display for Height {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
