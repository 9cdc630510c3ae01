use alloc::vec::Vec;

use derive_where::derive_where;

use crate::{Context, OperatorId, PublicKey, Thresholds};

/// A committee member, ie. a signer and its verification key share.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Member<Ctx: Context> {
    /// The signer identity
    pub id: OperatorId,
    /// The verification key share of the signer
    pub public_key: PublicKey<Ctx>,
}

impl<Ctx: Context> Member<Ctx> {
    /// Create a new committee member.
    pub fn new(id: OperatorId, public_key: PublicKey<Ctx>) -> Self {
        Self { id, public_key }
    }
}

/// Static description of the committee deciding at a height.
///
/// Members are kept sorted by identity.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Committee<Ctx: Context> {
    members: Vec<Member<Ctx>>,
    thresholds: Thresholds,
}

impl<Ctx: Context> Committee<Ctx> {
    /// Create a committee from its members.
    ///
    /// Duplicate identities are collapsed, keeping the first occurrence.
    pub fn new(mut members: Vec<Member<Ctx>>) -> Self {
        members.sort_by_key(|member| member.id);
        members.dedup_by_key(|member| member.id);

        let thresholds = Thresholds::for_committee_size(members.len());

        Self {
            members,
            thresholds,
        }
    }

    /// Return the members of the committee, sorted by identity.
    pub fn members(&self) -> &[Member<Ctx>] {
        &self.members
    }

    /// Return the number of members.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Return the member with the given identity, if any.
    pub fn get(&self, id: OperatorId) -> Option<&Member<Ctx>> {
        self.members
            .binary_search_by_key(&id, |member| member.id)
            .ok()
            .map(|index| &self.members[index])
    }

    /// Whether the given identity belongs to the committee.
    pub fn contains(&self, id: OperatorId) -> bool {
        self.get(id).is_some()
    }

    /// Return the member at the given position, if any.
    pub fn get_by_index(&self, index: usize) -> Option<&Member<Ctx>> {
        self.members.get(index)
    }

    /// Return the quorum thresholds of the committee.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Number of unique signers needed for a quorum.
    pub fn quorum(&self) -> usize {
        self.thresholds.quorum
    }

    /// Number of unique signers needed for a partial quorum.
    pub fn partial_quorum(&self) -> usize {
        self.thresholds.partial_quorum
    }
}
