//! Ed25519 signing scheme.
//!
//! Ed25519 has no native signature aggregation: the aggregate of a signer set
//! is the list of its individual signatures, ordered like the signers.

use core::fmt;

use qbft_core_types::{Context, Hash, OperatorId, SigningScheme};
use qbft_signing::SigningProvider;

pub use ed25519_consensus::Error;
pub use signature::{Signer, Verifier};

/// Length of an encoded signature, in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// The Ed25519 signing scheme.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ed25519;

/// A signature of the wrong length.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidSignatureLength(pub usize);

impl fmt::Display for InvalidSignatureLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid signature length: expected {SIGNATURE_LEN}, got {}",
            self.0
        )
    }
}

impl SigningScheme for Ed25519 {
    type DecodingError = InvalidSignatureLength;

    type Signature = Signature;
    type PublicKey = PublicKey;
    type PrivateKey = PrivateKey;

    fn decode_signature(bytes: &[u8]) -> Result<Self::Signature, Self::DecodingError> {
        let bytes: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidSignatureLength(bytes.len()))?;

        Ok(Signature::from_bytes(bytes))
    }

    fn encode_signature(signature: &Self::Signature) -> Vec<u8> {
        signature.to_bytes().to_vec()
    }
}

#[derive(Copy, Clone)]
pub struct Signature(ed25519_consensus::Signature);

impl Signature {
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(ed25519_consensus::Signature::from(bytes))
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0.to_bytes()
    }

    /// An all-zero signature, which never verifies.
    pub fn test() -> Self {
        Self::from_bytes([0; SIGNATURE_LEN])
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Signature {}

impl fmt::Debug for Signature {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(")?;
        for byte in &self.to_bytes()[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

#[derive(Clone)]
pub struct PrivateKey(ed25519_consensus::SigningKey);

impl PrivateKey {
    #[cfg(feature = "rand")]
    pub fn generate<R>(rng: R) -> Self
    where
        R: rand::RngCore + rand::CryptoRng,
    {
        Self(ed25519_consensus::SigningKey::new(rng))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verification_key())
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        Signature(self.0.sign(msg))
    }
}

impl From<[u8; 32]> for PrivateKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(ed25519_consensus::SigningKey::from(bytes))
    }
}

impl Signer<Signature> for PrivateKey {
    fn try_sign(&self, msg: &[u8]) -> Result<Signature, signature::Error> {
        Ok(self.sign(msg))
    }
}

impl fmt::Debug for PrivateKey {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

#[derive(Copy, Clone)]
pub struct PublicKey(ed25519_consensus::VerificationKey);

impl PublicKey {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), Error> {
        self.0.verify(&signature.0, msg)
    }
}

impl TryFrom<[u8; 32]> for PublicKey {
    type Error = Error;

    fn try_from(bytes: [u8; 32]) -> Result<Self, Self::Error> {
        ed25519_consensus::VerificationKey::try_from(bytes).map(Self)
    }
}

impl Verifier<Signature> for PublicKey {
    fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), signature::Error> {
        PublicKey::verify(self, msg, signature).map_err(|_| signature::Error::new())
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for byte in &self.to_bytes()[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Signs consensus messages with the Ed25519 key share of one committee member.
#[derive(Clone, Debug)]
pub struct Ed25519Provider {
    signer: OperatorId,
    private_key: PrivateKey,
}

impl Ed25519Provider {
    pub fn new(signer: OperatorId, private_key: PrivateKey) -> Self {
        Self {
            signer,
            private_key,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl<Ctx> SigningProvider<Ctx> for Ed25519Provider
where
    Ctx: Context<SigningScheme = Ed25519>,
{
    fn signer(&self) -> OperatorId {
        self.signer
    }

    fn sign(&self, signing_root: &Hash) -> Signature {
        self.private_key.sign(signing_root.as_bytes())
    }

    fn verify(&self, signing_root: &Hash, signature: &Signature, public_key: &PublicKey) -> bool {
        public_key.verify(signing_root.as_bytes(), signature).is_ok()
    }
}
