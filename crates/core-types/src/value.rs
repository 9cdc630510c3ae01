use core::fmt;

use bytes::Bytes;

use crate::limits::MAX_VALUE_LEN;
use crate::merkle;
use crate::Hash;

/// Digest of a [`Value`], the unit of equality for consensus.
pub type ValueRoot = Hash;

/// An opaque payload to agree on, together with its root.
///
/// Two values are the same for consensus purposes iff their roots are equal.
#[derive(Clone, PartialEq, Eq)]
pub struct Value {
    data: Bytes,
    root: ValueRoot,
}

impl Value {
    /// Create a new value, computing its root.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let root = merkle::bytes_root(&data, MAX_VALUE_LEN);
        Self { data, root }
    }

    /// Return the payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Return the root of the value.
    pub fn root(&self) -> ValueRoot {
        self.root
    }
}

impl fmt::Debug for Value {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("len", &self.data.len())
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_identifies_payload() {
        let a = Value::new(&b"value-a"[..]);
        let b = Value::new(&b"value-b"[..]);
        let a2 = Value::new(&b"value-a"[..]);

        assert_eq!(a.root(), a2.root());
        assert_ne!(a.root(), b.root());
    }
}
