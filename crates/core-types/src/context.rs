use alloc::string::String;

use thiserror::Error;

use crate::{Committee, Domain, Height, OperatorId, Round, SigningScheme, Value};

/// Rejection of a value by the external value-check predicate.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValueError(pub String);

/// This trait allows to abstract over the signing scheme and the external
/// predicates of the consensus engine.
pub trait Context
where
    Self: Sized + Clone + Send + Sync + 'static,
{
    /// The signing scheme used to sign consensus messages.
    type SigningScheme: SigningScheme;

    /// Select the proposer for the given height and round.
    ///
    /// This function must be deterministic: every committee member must
    /// agree on the proposer of a given (height, round).
    fn select_proposer(
        &self,
        committee: &Committee<Self>,
        height: Height,
        round: Round,
    ) -> OperatorId;

    /// Check whether a value may be decided on.
    ///
    /// Used both when starting a new height and when validating a proposal.
    fn check_value(&self, value: &Value) -> Result<(), ValueError>;

    /// The domain all consensus signatures are produced under.
    fn domain(&self) -> Domain;
}
