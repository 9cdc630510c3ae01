use core::fmt::{Debug, Display};

use alloc::vec::Vec;

use crate::Context;

/// A signing scheme: the concrete signature and key types used by a [`Context`].
pub trait SigningScheme
where
    Self: Clone + Debug + Eq + Send + Sync + 'static,
{
    /// Error produced when decoding a signature from bytes fails.
    type DecodingError: Display;

    /// The signature produced by a single signer.
    type Signature: Clone + Debug + Eq + Send + Sync;

    /// The verification key of a signer.
    type PublicKey: Clone + Debug + Eq + Send + Sync;

    /// The signing key of a signer.
    type PrivateKey: Clone + Send + Sync;

    /// Decode a signature from its canonical byte representation.
    fn decode_signature(bytes: &[u8]) -> Result<Self::Signature, Self::DecodingError>;

    /// Encode a signature into its canonical byte representation.
    fn encode_signature(signature: &Self::Signature) -> Vec<u8>;
}

/// Type alias to make it easier to refer the `Signature` type of a given `Context`.
pub type Signature<Ctx> = <<Ctx as Context>::SigningScheme as SigningScheme>::Signature;

/// Type alias to make it easier to refer the `PublicKey` type of a given `Context`.
pub type PublicKey<Ctx> = <<Ctx as Context>::SigningScheme as SigningScheme>::PublicKey;

/// Type alias to make it easier to refer the `PrivateKey` type of a given `Context`.
pub type PrivateKey<Ctx> = <<Ctx as Context>::SigningScheme as SigningScheme>::PrivateKey;

/// A signature domain, separating signatures of different networks and purposes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Domain(pub [u8; 4]);

impl Domain {
    /// Return the raw bytes of the domain.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}
