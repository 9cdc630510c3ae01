use std::sync::Arc;

use bytes::Bytes;
use qbft_core_types::{
    AggregateSignature, Body, Committee, Height, Identifier, Member, Message, OperatorId,
    Prepared, Round, SignedMessage, Value, ValueRoot,
};
use qbft_signing::{aggregate, SigningProvider};
use qbft_signing_ed25519::{Ed25519Provider, PrivateKey};

use crate::context::{TestContext, DOMAIN};

pub type TestCommittee = Committee<TestContext>;
pub type TestMessage = Message<TestContext>;
pub type TestSignedMessage = SignedMessage<TestContext>;

/// Identifier of the consensus stream used throughout the tests.
pub fn identifier() -> Identifier {
    Identifier::new(&b"qbft-test-stream"[..])
}

/// The value proposed by default.
pub fn value() -> Value {
    Value::new(&b"value"[..])
}

/// A second value, distinct from [`value`].
pub fn other_value() -> Value {
    Value::new(&b"other value"[..])
}

/// A value built from a numeric seed, distinct for every seed.
pub fn value_from(seed: u64) -> Value {
    Value::new(Bytes::from(format!("value-{seed}")))
}

/// Deterministic key share of the given operator.
pub fn private_key(id: u64) -> PrivateKey {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&id.to_le_bytes());
    bytes[31] = 0x42;
    PrivateKey::from(bytes)
}

/// Create `N` signers with identities `1..=N`, along with their committee.
pub fn make_committee<const N: usize>() -> ([TestSigner; N], Arc<TestCommittee>) {
    let signers: [TestSigner; N] = std::array::from_fn(|i| TestSigner::new(i as u64 + 1));

    let committee = Committee::new(
        signers
            .iter()
            .map(|signer| Member::new(signer.id, signer.private_key().public_key()))
            .collect(),
    );

    (signers, Arc::new(committee))
}

/// A committee member able to produce well-formed signed messages.
#[derive(Clone, Debug)]
pub struct TestSigner {
    pub id: OperatorId,
    pub provider: Ed25519Provider,
}

impl TestSigner {
    pub fn new(id: u64) -> Self {
        let id = OperatorId::new(id);
        Self {
            id,
            provider: Ed25519Provider::new(id, private_key(id.as_u64())),
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        self.provider.private_key()
    }

    /// Sign an arbitrary message.
    pub fn sign(&self, message: TestMessage) -> TestSignedMessage {
        SigningProvider::<TestContext>::sign_message(&self.provider, message, DOMAIN)
    }

    pub fn propose(&self, height: u64, round: u64, value: Value) -> TestSignedMessage {
        self.propose_justified(height, round, value, vec![], vec![])
    }

    pub fn propose_justified(
        &self,
        height: u64,
        round: u64,
        value: Value,
        round_change_justification: Vec<TestSignedMessage>,
        prepare_justification: Vec<TestSignedMessage>,
    ) -> TestSignedMessage {
        self.sign(message(
            height,
            round,
            Body::Propose {
                value,
                round_change_justification,
                prepare_justification,
            },
        ))
    }

    pub fn prepare(&self, height: u64, round: u64, root: ValueRoot) -> TestSignedMessage {
        self.sign(message(height, round, Body::Prepare { root }))
    }

    pub fn commit(&self, height: u64, round: u64, root: ValueRoot) -> TestSignedMessage {
        self.sign(message(height, round, Body::Commit { root }))
    }

    /// A round change without any preparation.
    pub fn round_change(&self, height: u64, round: u64) -> TestSignedMessage {
        self.sign(message(
            height,
            round,
            Body::RoundChange {
                prepared: None,
                prepare_justification: vec![],
            },
        ))
    }

    /// A round change reporting a preparation of `value` in `prepared_round`.
    pub fn round_change_prepared(
        &self,
        height: u64,
        round: u64,
        prepared_round: u64,
        value: Value,
        prepare_justification: Vec<TestSignedMessage>,
    ) -> TestSignedMessage {
        self.sign(message(
            height,
            round,
            Body::RoundChange {
                prepared: Some(Prepared::new(Round::new(prepared_round), value)),
                prepare_justification,
            },
        ))
    }
}

/// Build an unsigned message of the test stream.
pub fn message(height: u64, round: u64, body: Body<TestContext>) -> TestMessage {
    Message::new(identifier(), Height::new(height), Round::new(round), body)
}

/// Prepares for `root` from each of the given signers.
pub fn prepares(
    signers: &[TestSigner],
    height: u64,
    round: u64,
    root: ValueRoot,
) -> Vec<TestSignedMessage> {
    signers
        .iter()
        .map(|signer| signer.prepare(height, round, root))
        .collect()
}

/// Commits for `root` from each of the given signers.
pub fn commits(
    signers: &[TestSigner],
    height: u64,
    round: u64,
    root: ValueRoot,
) -> Vec<TestSignedMessage> {
    signers
        .iter()
        .map(|signer| signer.commit(height, round, root))
        .collect()
}

/// Unprepared round changes from each of the given signers.
pub fn round_changes(signers: &[TestSigner], height: u64, round: u64) -> Vec<TestSignedMessage> {
    signers
        .iter()
        .map(|signer| signer.round_change(height, round))
        .collect()
}

/// Aggregate the commits of the given signers into a decided message.
pub fn decided(signers: &[TestSigner], height: u64, round: u64, root: ValueRoot) -> TestSignedMessage {
    aggregate(&commits(signers, height, round, root)).unwrap()
}

/// Re-sign `msg` with the given signers, in the given order, keeping
/// duplicates and ordering problems as they are.
pub fn with_signers(msg: &TestMessage, signers: &[&TestSigner]) -> TestSignedMessage {
    let signatures = signers
        .iter()
        .map(|signer| {
            let signed = signer.sign(msg.clone());
            signed.signature.into_signatures().remove(0)
        })
        .collect();

    SignedMessage::new(
        msg.clone(),
        signers.iter().map(|signer| signer.id).collect(),
        AggregateSignature::new(signatures),
    )
}
