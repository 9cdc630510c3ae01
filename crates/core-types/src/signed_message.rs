use alloc::vec::Vec;

use derive_where::derive_where;

use crate::limits::{MAX_SIGNATURE_LEN, MAX_SIGNERS};
use crate::merkle::{self, Chunk};
use crate::{
    Context, Hash, Height, Identifier, Message, MessageType, OperatorId, Round, Signature,
    SigningScheme,
};

/// Signature of a set of signers over the same message.
///
/// Holds one signature per signer, in the order of the signer list.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct AggregateSignature<Ctx: Context>(Vec<Signature<Ctx>>);

impl<Ctx: Context> AggregateSignature<Ctx> {
    /// Create an aggregate from signatures ordered like their signers.
    pub fn new(signatures: Vec<Signature<Ctx>>) -> Self {
        Self(signatures)
    }

    /// Create the aggregate of a single signature.
    pub fn single(signature: Signature<Ctx>) -> Self {
        Self(alloc::vec![signature])
    }

    /// Return the individual signatures.
    pub fn signatures(&self) -> &[Signature<Ctx>] {
        &self.0
    }

    /// Return the number of individual signatures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the aggregate holds no signature.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the aggregate, returning the individual signatures.
    pub fn into_signatures(self) -> Vec<Signature<Ctx>> {
        self.0
    }
}

/// A consensus message signed by one or more committee members.
///
/// A well-formed signed message has a non-empty, sorted and duplicate-free
/// signer list, with exactly one signature per signer.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage<Ctx: Context> {
    /// The signed message
    pub message: Message<Ctx>,
    /// The signers, sorted by identity
    pub signers: Vec<OperatorId>,
    /// The signature of the signers over the message
    pub signature: AggregateSignature<Ctx>,
}

impl<Ctx: Context> SignedMessage<Ctx> {
    /// Create a new signed message.
    pub fn new(
        message: Message<Ctx>,
        signers: Vec<OperatorId>,
        signature: AggregateSignature<Ctx>,
    ) -> Self {
        Self {
            message,
            signers,
            signature,
        }
    }

    /// Create a message signed by a single signer.
    pub fn single(message: Message<Ctx>, signer: OperatorId, signature: Signature<Ctx>) -> Self {
        Self::new(
            message,
            alloc::vec![signer],
            AggregateSignature::single(signature),
        )
    }

    /// Return the identifier of the message.
    pub fn identifier(&self) -> &Identifier {
        &self.message.identifier
    }

    /// Return the height of the message.
    pub fn height(&self) -> Height {
        self.message.height
    }

    /// Return the round of the message.
    pub fn round(&self) -> Round {
        self.message.round
    }

    /// Return the type of the message.
    pub fn msg_type(&self) -> MessageType {
        self.message.msg_type()
    }

    /// Return the only signer of the message, if there is exactly one.
    pub fn signer(&self) -> Option<OperatorId> {
        match self.signers.as_slice() {
            [signer] => Some(*signer),
            _ => None,
        }
    }

    /// Iterate over each signer and its signature.
    pub fn signatures(&self) -> impl Iterator<Item = (OperatorId, &Signature<Ctx>)> {
        self.signers
            .iter()
            .copied()
            .zip(self.signature.signatures().iter())
    }

    /// Compute the Merkle root of the signed message.
    ///
    /// Fields, in order: message, signers, signatures.
    pub fn root(&self) -> Hash {
        let signers = merkle::list_root(
            self.signers
                .iter()
                .map(|id| Hash::new(merkle::u64_chunk(id.as_u64()))),
            MAX_SIGNERS,
        );

        let signatures = merkle::list_root(
            self.signature.signatures().iter().map(|signature| {
                let bytes = Ctx::SigningScheme::encode_signature(signature);
                merkle::bytes_root(&bytes, MAX_SIGNATURE_LEN)
            }),
            MAX_SIGNERS,
        );

        let fields: [Chunk; 3] = [
            self.message.root().into_bytes(),
            signers.into_bytes(),
            signatures.into_bytes(),
        ];

        merkle::container_root(&fields)
    }
}
