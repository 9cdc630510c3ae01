use thiserror::Error;

use qbft_core_instance::Error as InstanceError;
use qbft_core_types::{Height, NetworkError, StorageError, ValueError};
use qbft_signing::VerificationError;

/// Why the controller rejected an operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The value to propose was rejected by the context
    #[error("invalid value")]
    InvalidValue(#[source] ValueError),

    /// The instance of the latest height is still running
    #[error("previous instance hasn't decided, height {0}")]
    PreviousInstanceNotDecided(Height),

    /// The message belongs to another consensus stream
    #[error("invalid identifier")]
    WrongIdentifier,

    /// No instance is kept for the height of the message
    #[error("instance not found")]
    InstanceNotFound(Height),

    /// The decided message is invalid
    #[error("invalid decided message: {0}")]
    InvalidDecided(#[from] DecidedError),

    /// The instance rejected the message
    #[error(transparent)]
    Instance(#[from] InstanceError),

    /// The stored highest decision could not be read
    #[error("failed to read highest decided: {0}")]
    Storage(#[from] StorageError),
}

/// Why a decided message was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecidedError {
    /// Fewer signers than a quorum
    #[error("decided message has {signers} signers, quorum is {quorum}")]
    NoQuorum {
        /// Number of signers of the message
        signers: usize,
        /// Quorum of the committee
        quorum: usize,
    },

    /// Signers or signatures failed verification
    #[error(transparent)]
    Signature(#[from] VerificationError),
}

/// A side effect of a decision that failed.
///
/// The decision stands regardless.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SideEffectError {
    /// Storing the decision failed
    #[error("failed to persist decision: {0}")]
    Persist(#[source] StorageError),

    /// Announcing the decision failed
    #[error("failed to broadcast decision: {0}")]
    Broadcast(#[source] NetworkError),
}
