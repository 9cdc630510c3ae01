//! Collaborators consumed by the consensus core.

use alloc::string::String;

use thiserror::Error;

use crate::{Context, Height, Identifier, Round, SignedMessage};

/// Failure to hand a message to the network.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("network error: {0}")]
pub struct NetworkError(pub String);

/// Failure of the decision store.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// Fire-and-forget message dissemination.
pub trait Network<Ctx: Context>: Send + Sync {
    /// Broadcast a consensus message to the committee.
    fn broadcast(&self, msg: &SignedMessage<Ctx>) -> Result<(), NetworkError>;

    /// Announce a decision, ie. an aggregated commit.
    fn broadcast_decided(&self, msg: &SignedMessage<Ctx>) -> Result<(), NetworkError>;
}

/// Persistence of the highest decision of each consensus stream.
pub trait Storage<Ctx: Context>: Send + Sync {
    /// Store the aggregated commit as the highest decision for the identifier.
    fn save_highest_decided(
        &self,
        identifier: &Identifier,
        msg: &SignedMessage<Ctx>,
    ) -> Result<(), StorageError>;

    /// Return the highest decision stored for the identifier, if any.
    fn get_highest_decided(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<SignedMessage<Ctx>>, StorageError>;
}

/// An external clock delivering round timeouts.
///
/// The core never waits on the timer; it only asks for a timeout to be
/// delivered later for the given height and round.
pub trait RoundTimer: Send + Sync {
    /// Schedule the timeout of the given round, cancelling any earlier one.
    fn schedule(&self, height: Height, round: Round);

    /// Cancel the pending timeout of the given height, if any.
    ///
    /// A timeout pending for another height is left untouched.
    fn cancel(&self, height: Height) {
        let _ = height;
    }
}
