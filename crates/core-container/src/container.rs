//! For storing the messages of one type, indexed by round.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use derive_where::derive_where;
use tracing::trace;

use qbft_core_types::{Context, OperatorId, Round, SignedMessage, ValueRoot};

/// The largest set of messages with pairwise-distinct signers found for a
/// given round and value.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct UniqueSigners<Ctx: Context> {
    /// The union of the signers of the messages
    pub signers: Vec<OperatorId>,
    /// The messages, in the order they were received
    pub messages: Vec<SignedMessage<Ctx>>,
}

impl<Ctx: Context> UniqueSigners<Ctx> {
    fn empty() -> Self {
        Self {
            signers: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Return the number of unique signers.
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    /// Whether no message matched.
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

/// Append-only store of signed messages, indexed by round.
#[derive_where(Clone, Debug, Default)]
pub struct MsgContainer<Ctx>
where
    Ctx: Context,
{
    msgs: BTreeMap<Round, Vec<SignedMessage<Ctx>>>,
}

impl<Ctx> MsgContainer<Ctx>
where
    Ctx: Context,
{
    /// Create a new, empty container.
    pub fn new() -> Self {
        Self {
            msgs: BTreeMap::new(),
        }
    }

    /// Append a message, without any deduplication.
    pub fn add_message(&mut self, msg: SignedMessage<Ctx>) {
        self.msgs.entry(msg.round()).or_default().push(msg);
    }

    /// Append a message unless one of its signers already has a message
    /// stored for the same round.
    ///
    /// Returns whether the message was added.
    pub fn add_first_message_for_signer_and_round(&mut self, msg: SignedMessage<Ctx>) -> bool {
        let round = msg.round();
        let existing = self.msgs.entry(round).or_default();

        let already_seen = existing
            .iter()
            .any(|stored| stored.signers.iter().any(|id| msg.signers.contains(id)));

        if already_seen {
            trace!(%round, signers = ?msg.signers, "Signer already has a message for this round");
            return false;
        }

        existing.push(msg);
        true
    }

    /// Return the messages stored for the given round, in insertion order.
    pub fn messages_for_round(&self, round: Round) -> &[SignedMessage<Ctx>] {
        self.msgs.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over all stored messages whose round is strictly above `round`.
    pub fn messages_above_round(&self, round: Round) -> impl Iterator<Item = &SignedMessage<Ctx>> {
        self.msgs
            .range(round.increment()..)
            .flat_map(|(_, msgs)| msgs.iter())
    }

    /// Return the number of messages stored for the given round.
    pub fn len(&self, round: Round) -> usize {
        self.msgs.get(&round).map_or(0, Vec::len)
    }

    /// Return the highest round any message was stored for.
    pub fn max_round(&self) -> Option<Round> {
        self.msgs
            .iter()
            .rev()
            .find(|(_, msgs)| !msgs.is_empty())
            .map(|(round, _)| *round)
    }

    /// Among the messages of `round` for `root`, return the largest set of
    /// messages whose signers are pairwise distinct.
    ///
    /// Every matching message is tried as the seed of a set, which is then
    /// grown greedily in insertion order with every later message whose
    /// signers are all new. The largest set wins, the earliest seed on ties.
    ///
    /// A message that repeats a signer within its own signer list never
    /// contributes, so that it cannot inflate the signer count.
    pub fn longest_unique_signers_for_round_and_value(
        &self,
        round: Round,
        root: &ValueRoot,
    ) -> UniqueSigners<Ctx> {
        let candidates: Vec<&SignedMessage<Ctx>> = self
            .messages_for_round(round)
            .iter()
            .filter(|msg| msg.message.value_root().as_ref() == Some(root))
            .filter(|msg| has_distinct_signers(&msg.signers))
            .collect();

        let mut best = UniqueSigners::empty();

        for (i, seed) in candidates.iter().enumerate() {
            let mut signers: BTreeSet<OperatorId> = seed.signers.iter().copied().collect();
            let mut current = UniqueSigners {
                signers: seed.signers.clone(),
                messages: alloc::vec![(*seed).clone()],
            };

            for msg in &candidates[i + 1..] {
                if msg.signers.iter().any(|id| signers.contains(id)) {
                    continue;
                }

                signers.extend(msg.signers.iter().copied());
                current.signers.extend(msg.signers.iter().copied());
                current.messages.push((*msg).clone());
            }

            if best.len() < current.len() {
                best = current;
            }
        }

        best
    }
}

fn has_distinct_signers(signers: &[OperatorId]) -> bool {
    let mut seen = BTreeSet::new();
    signers.iter().all(|id| seen.insert(*id))
}
