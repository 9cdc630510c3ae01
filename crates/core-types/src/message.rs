use alloc::vec::Vec;
use core::fmt;

use derive_where::derive_where;
use thiserror::Error;

use crate::limits::{MAX_IDENTIFIER_LEN, MAX_JUSTIFICATIONS};
use crate::merkle::{self, Chunk};
use crate::{Context, Domain, Hash, Height, Identifier, Round, SignedMessage, Value, ValueRoot};

/// The kind of a consensus message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageType {
    /// A proposal of a value by the round leader
    Propose,
    /// A vote for the proposed value
    Prepare,
    /// A vote to decide on the prepared value
    Commit,
    /// A request to move to a higher round
    RoundChange,
}

/// An unknown message type tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown message type: {0}")]
pub struct UnknownMessageType(pub u8);

impl MessageType {
    /// Return the wire tag of the message type.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Propose => 0,
            Self::Prepare => 1,
            Self::Commit => 2,
            Self::RoundChange => 3,
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = UnknownMessageType;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Propose),
            1 => Ok(Self::Prepare),
            2 => Ok(Self::Commit),
            3 => Ok(Self::RoundChange),
            other => Err(UnknownMessageType(other)),
        }
    }
}

impl fmt::Display for MessageType {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propose => write!(f, "propose"),
            Self::Prepare => write!(f, "prepare"),
            Self::Commit => write!(f, "commit"),
            Self::RoundChange => write!(f, "round-change"),
        }
    }
}

/// The latest round in which a member prepared, and the value it prepared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prepared {
    /// The round in which the value was prepared
    pub round: Round,
    /// The prepared value
    pub value: Value,
}

impl Prepared {
    /// Create a new `Prepared` instance.
    pub fn new(round: Round, value: Value) -> Self {
        Self { round, value }
    }
}

/// The type-specific part of a consensus message.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Body<Ctx: Context> {
    /// Proposal of a value.
    ///
    /// Above the first round, it must be justified by a quorum of round changes
    /// and, if any of them reports a preparation, by the quorum of prepares for
    /// the highest prepared round.
    Propose {
        /// The proposed value
        value: Value,
        /// Quorum of round changes for this round
        round_change_justification: Vec<SignedMessage<Ctx>>,
        /// Quorum of prepares for the highest prepared round
        prepare_justification: Vec<SignedMessage<Ctx>>,
    },

    /// Prepare vote for the root of the accepted proposal.
    Prepare {
        /// Root of the proposed value
        root: ValueRoot,
    },

    /// Commit vote for the root of the prepared value.
    Commit {
        /// Root of the prepared value
        root: ValueRoot,
    },

    /// Request to move to this message's round.
    RoundChange {
        /// The latest preparation of the sender, if any
        prepared: Option<Prepared>,
        /// Quorum of prepares justifying the preparation
        prepare_justification: Vec<SignedMessage<Ctx>>,
    },
}

/// A consensus message, addressed to one height of one consensus stream.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Message<Ctx: Context> {
    /// The consensus stream this message belongs to
    pub identifier: Identifier,
    /// The height of the message
    pub height: Height,
    /// The round of the message
    pub round: Round,
    /// The type-specific part of the message
    pub body: Body<Ctx>,
}

impl<Ctx: Context> Message<Ctx> {
    /// Create a new message.
    pub fn new(identifier: Identifier, height: Height, round: Round, body: Body<Ctx>) -> Self {
        Self {
            identifier,
            height,
            round,
            body,
        }
    }

    /// Return the type of the message.
    pub fn msg_type(&self) -> MessageType {
        match &self.body {
            Body::Propose { .. } => MessageType::Propose,
            Body::Prepare { .. } => MessageType::Prepare,
            Body::Commit { .. } => MessageType::Commit,
            Body::RoundChange { .. } => MessageType::RoundChange,
        }
    }

    /// Return the value root this message refers to, if any.
    ///
    /// For a round change, this is the root of the prepared value.
    pub fn value_root(&self) -> Option<ValueRoot> {
        match &self.body {
            Body::Propose { value, .. } => Some(value.root()),
            Body::Prepare { root } | Body::Commit { root } => Some(*root),
            Body::RoundChange { prepared, .. } => prepared.as_ref().map(|p| p.value.root()),
        }
    }

    /// Return the full value carried by this message, if any.
    pub fn value(&self) -> Option<&Value> {
        match &self.body {
            Body::Propose { value, .. } => Some(value),
            Body::RoundChange { prepared, .. } => prepared.as_ref().map(|p| &p.value),
            Body::Prepare { .. } | Body::Commit { .. } => None,
        }
    }

    /// Return the round change justification, empty for non-proposals.
    pub fn round_change_justification(&self) -> &[SignedMessage<Ctx>] {
        match &self.body {
            Body::Propose {
                round_change_justification,
                ..
            } => round_change_justification,
            _ => &[],
        }
    }

    /// Return the prepare justification, empty for prepares and commits.
    pub fn prepare_justification(&self) -> &[SignedMessage<Ctx>] {
        match &self.body {
            Body::Propose {
                prepare_justification,
                ..
            }
            | Body::RoundChange {
                prepare_justification,
                ..
            } => prepare_justification,
            _ => &[],
        }
    }

    /// Return the round in which the sender of a round change prepared, if any.
    pub fn prepared_round(&self) -> Option<Round> {
        match &self.body {
            Body::RoundChange { prepared, .. } => prepared.as_ref().map(|p| p.round),
            _ => None,
        }
    }

    /// Compute the Merkle root of the message.
    ///
    /// Fields, in order: type, height, round, identifier, value root,
    /// prepared round, round change justification, prepare justification.
    pub fn root(&self) -> Hash {
        let identifier = merkle::bytes_root(self.identifier.as_bytes(), MAX_IDENTIFIER_LEN);
        let value_root = self.value_root().unwrap_or(Hash::ZERO);
        let prepared_round = self.prepared_round().map_or(0, |r| r.as_u64());

        let round_changes = merkle::list_root(
            self.round_change_justification()
                .iter()
                .map(SignedMessage::root),
            MAX_JUSTIFICATIONS,
        );

        let prepares = merkle::list_root(
            self.prepare_justification().iter().map(SignedMessage::root),
            MAX_JUSTIFICATIONS,
        );

        let fields: [Chunk; 8] = [
            merkle::u64_chunk(u64::from(self.msg_type().tag())),
            merkle::u64_chunk(self.height.as_u64()),
            merkle::u64_chunk(self.round.as_u64()),
            identifier.into_bytes(),
            value_root.into_bytes(),
            merkle::u64_chunk(prepared_round),
            round_changes.into_bytes(),
            prepares.into_bytes(),
        ];

        merkle::container_root(&fields)
    }

    /// Compute the root covered by signatures under the given domain.
    pub fn signing_root(&self, domain: Domain) -> Hash {
        merkle::signing_root(self.root(), domain.as_bytes())
    }
}
