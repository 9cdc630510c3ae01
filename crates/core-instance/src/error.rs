use alloc::boxed::Box;

use thiserror::Error;

use qbft_core_types::{MessageType, NetworkError, ValueError};
use qbft_signing::{AggregationError, VerificationError};

/// Why an instance rejected a message or failed to act on it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The local round reached the round cutoff.
    #[error("instance stopped processing messages")]
    InstanceStopped,

    /// The message belongs to another consensus stream.
    #[error("invalid identifier")]
    WrongIdentifier,

    /// The message is addressed to another height.
    #[error("wrong msg height")]
    WrongHeight,

    /// The message is for a round below the local round.
    #[error("past round")]
    PastRound,

    /// The message round differs from the accepted proposal round.
    #[error("wrong msg round")]
    WrongRound,

    /// A prepare or commit arrived without an accepted proposal.
    #[error("did not receive proposal for this round")]
    NoProposalForRound,

    /// The message refers to another value than the accepted proposal.
    #[error("proposed data mismatch")]
    DataMismatch,

    /// The message type only allows a single signer.
    #[error("msg allows 1 signer")]
    SingleSignerRequired,

    /// The signer list or a signature is invalid.
    #[error(transparent)]
    Signature(#[from] VerificationError),

    /// The proposal is not signed by the proposer of its round.
    #[error("proposal leader invalid")]
    InvalidLeader,

    /// A proposal was already accepted for this round, or the proposal is stale.
    #[error("proposal is not valid with current state")]
    ProposalNotValidWithCurrentState,

    /// The value check rejected the proposed value.
    #[error("invalid value")]
    InvalidValue(#[source] ValueError),

    /// The round change justification lacks a quorum of signers.
    #[error("change round has no quorum")]
    RoundChangeNoQuorum,

    /// A round change in the justification is invalid.
    #[error("round change justification invalid")]
    InvalidRoundChangeJustification(#[source] Box<Error>),

    /// A prepare in the justification is invalid.
    #[error("prepare justification invalid")]
    InvalidPrepareJustification(#[source] Box<Error>),

    /// The prepare justification lacks a quorum of signers.
    #[error("prepare justification has no quorum")]
    PrepareJustificationNoQuorum,

    /// The proposed value is not the highest prepared value.
    #[error("proposed data doesn't match highest prepared")]
    HighestPreparedMismatch,

    /// A round change reports a preparation at or above its own round.
    #[error("round change prepared round must be lower than its round")]
    InvalidPreparedRound,

    /// A justification contains a message of the wrong type.
    #[error("invalid message type for justification")]
    UnexpectedJustificationType(MessageType),

    /// The accepted proposal of the round is missing where one is required.
    #[error("no accepted proposal for round")]
    MissingProposal,

    /// The commit quorum could not be aggregated.
    #[error("failed to aggregate commits: {0}")]
    Aggregation(#[from] AggregationError),

    /// The transition completed, but its message could not be broadcast.
    #[error("failed to broadcast message: {0}")]
    Broadcast(#[from] NetworkError),
}

impl Error {
    /// Whether the error was raised after the transition completed.
    pub fn is_side_effect(&self) -> bool {
        matches!(self, Self::Broadcast(_))
    }
}
