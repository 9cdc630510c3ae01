/// Quorum sizes of a committee of `n = 3f + 1` members.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Thresholds {
    /// Number of unique signers needed for a quorum (2f+1)
    pub quorum: usize,

    /// Number of unique signers needed for a partial quorum (f+1),
    /// ie. at least one honest member.
    pub partial_quorum: usize,
}

impl Thresholds {
    /// Compute the thresholds for a committee of the given size.
    ///
    /// With `f = (n - 1) / 3` tolerated faults, the quorum is `n - f`, which
    /// equals `2f + 1` when `n = 3f + 1` and keeps any two quorums
    /// intersecting in an honest member for every other `n`.
    pub const fn for_committee_size(n: usize) -> Self {
        let f = n.saturating_sub(1) / 3;

        Self {
            quorum: n - f,
            partial_quorum: f + 1,
        }
    }

    /// Return the number of faults tolerated by the committee.
    pub const fn faulty(&self) -> usize {
        self.partial_quorum - 1
    }

    /// Whether the given number of unique signers forms a quorum.
    pub const fn is_quorum(&self, signers: usize) -> bool {
        signers >= self.quorum
    }

    /// Whether the given number of unique signers forms a partial quorum.
    pub const fn is_partial_quorum(&self, signers: usize) -> bool {
        signers >= self.partial_quorum
    }
}
