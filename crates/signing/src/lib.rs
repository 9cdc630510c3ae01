//! Signing provider abstraction: signing, verification and aggregation of
//! consensus messages.

use thiserror::Error;

use qbft_core_types::{
    AggregateSignature, Committee, Context, Domain, Hash, Message, OperatorId, PublicKey,
    Signature, SignedMessage,
};

/// Structural or cryptographic failure of a signed message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("no signers")]
    NoSigners,

    #[error("non unique signer")]
    NonUniqueSigner,

    #[error("signers not sorted")]
    SignersNotSorted,

    #[error("signers and signatures differ in length")]
    SignatureCountMismatch,

    #[error("unknown signer: {0}")]
    UnknownSigner(OperatorId),

    #[error("msg signature invalid")]
    InvalidSignature(OperatorId),
}

/// Failure to aggregate signed messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("nothing to aggregate")]
    Empty,

    #[error("cannot aggregate signatures over different messages")]
    DifferentMessages,

    #[error("cannot aggregate overlapping signer sets")]
    OverlappingSigners,
}

/// Signs and verifies on behalf of one committee member.
pub trait SigningProvider<Ctx>
where
    Ctx: Context,
    Self: Send + Sync + 'static,
{
    /// The identity of the member this provider signs for.
    fn signer(&self) -> OperatorId;

    /// Sign the given signing root with the member's key share.
    fn sign(&self, signing_root: &Hash) -> Signature<Ctx>;

    /// Verify a signature over the given signing root.
    fn verify(
        &self,
        signing_root: &Hash,
        signature: &Signature<Ctx>,
        public_key: &PublicKey<Ctx>,
    ) -> bool;

    /// Sign a message under the given domain.
    fn sign_message(&self, message: Message<Ctx>, domain: Domain) -> SignedMessage<Ctx> {
        let signature = self.sign(&message.signing_root(domain));
        SignedMessage::single(message, self.signer(), signature)
    }

    /// Check the structure of the signer list and verify every signature
    /// against the key share of its signer.
    fn verify_signed_message(
        &self,
        msg: &SignedMessage<Ctx>,
        domain: Domain,
        committee: &Committee<Ctx>,
    ) -> Result<(), VerificationError> {
        check_signers(&msg.signers)?;

        if msg.signers.len() != msg.signature.len() {
            return Err(VerificationError::SignatureCountMismatch);
        }

        let signing_root = msg.message.signing_root(domain);

        for (id, signature) in msg.signatures() {
            let member = committee
                .get(id)
                .ok_or(VerificationError::UnknownSigner(id))?;

            if !self.verify(&signing_root, signature, &member.public_key) {
                return Err(VerificationError::InvalidSignature(id));
            }
        }

        Ok(())
    }
}

/// Check that a signer list is non-empty, duplicate-free and sorted.
///
/// Duplicates are reported before ordering, so that a repeated signer never
/// passes as a mere ordering problem.
pub fn check_signers(signers: &[OperatorId]) -> Result<(), VerificationError> {
    if signers.is_empty() {
        return Err(VerificationError::NoSigners);
    }

    let mut seen = std::collections::BTreeSet::new();
    if !signers.iter().all(|id| seen.insert(*id)) {
        return Err(VerificationError::NonUniqueSigner);
    }

    if !signers.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(VerificationError::SignersNotSorted);
    }

    Ok(())
}

/// Aggregate messages signed over the same message by disjoint signer sets
/// into one multi-signer message, with signers sorted.
pub fn aggregate<Ctx: Context>(
    msgs: &[SignedMessage<Ctx>],
) -> Result<SignedMessage<Ctx>, AggregationError> {
    let (first, rest) = msgs.split_first().ok_or(AggregationError::Empty)?;

    if rest.iter().any(|msg| msg.message != first.message) {
        return Err(AggregationError::DifferentMessages);
    }

    let mut pairs: Vec<(OperatorId, Signature<Ctx>)> = msgs
        .iter()
        .flat_map(|msg| msg.signatures().map(|(id, sig)| (id, sig.clone())))
        .collect();

    pairs.sort_by_key(|(id, _)| *id);

    if pairs.windows(2).any(|pair| pair[0].0 == pair[1].0) {
        return Err(AggregationError::OverlappingSigners);
    }

    let (signers, signatures): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

    Ok(SignedMessage::new(
        first.message.clone(),
        signers,
        AggregateSignature::new(signatures),
    ))
}
