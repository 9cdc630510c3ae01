use core::fmt;

use bytes::Bytes;

/// Binds messages to one height-addressed consensus stream, eg. one duty of one validator.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(Bytes);

impl Identifier {
    /// Create a new identifier.
    ///
    /// The wire codec rejects identifiers longer than [`crate::limits::MAX_IDENTIFIER_LEN`].
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Return the raw bytes of the identifier.
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Return the length of the identifier in bytes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Identifier {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for Identifier {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}
