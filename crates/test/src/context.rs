use qbft_core_types::{Committee, Context, Domain, Height, OperatorId, Round, Value, ValueError};
use qbft_signing_ed25519::Ed25519;

/// Signature domain of the test network.
pub const DOMAIN: Domain = Domain([0x00, 0x00, 0x30, 0x12]);

/// A payload the test context always rejects.
pub const INVALID_VALUE: &[u8] = b"invalid";

/// Context with a round-robin proposer and a value check rejecting empty
/// payloads and [`INVALID_VALUE`].
#[derive(Copy, Clone, Debug, Default)]
pub struct TestContext;

impl TestContext {
    pub fn new() -> Self {
        Self
    }
}

impl Context for TestContext {
    type SigningScheme = Ed25519;

    fn select_proposer(
        &self,
        committee: &Committee<Self>,
        height: Height,
        round: Round,
    ) -> OperatorId {
        assert!(committee.len() > 0, "empty committee");

        let index = (height.as_u64() + round.as_u64() - 1) % committee.len() as u64;

        committee
            .get_by_index(index as usize)
            .map(|member| member.id)
            .unwrap()
    }

    fn check_value(&self, value: &Value) -> Result<(), ValueError> {
        if value.data().is_empty() {
            return Err(ValueError("empty value".to_string()));
        }

        if value.data().as_ref() == INVALID_VALUE {
            return Err(ValueError("value rejected by the value check".to_string()));
        }

        Ok(())
    }

    fn domain(&self) -> Domain {
        DOMAIN
    }
}
