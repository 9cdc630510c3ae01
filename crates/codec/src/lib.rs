use bytes::Bytes;

mod canonical;
pub use canonical::{CanonicalCodec, Error, MAX_ENCODED_LEN};

/// Conversion of `T` to and from its wire representation.
pub trait Codec<T>: Send + Sync + 'static {
    type Error: std::error::Error;

    /// Decode a `T`, rejecting malformed or oversized input.
    fn decode(&self, bytes: Bytes) -> Result<T, Self::Error>;

    /// Encode `msg` into its wire representation.
    fn encode(&self, msg: &T) -> Result<Bytes, Self::Error>;
}
