use alloc::sync::Arc;

use derive_where::derive_where;

use qbft_core_container::MsgContainer;
use qbft_core_types::{Committee, Context, Height, Identifier, Round, SignedMessage, Value};

/// State of a QBFT instance, owned exclusively by it.
#[derive_where(Clone, Debug)]
pub struct State<Ctx: Context> {
    /// The committee deciding at this height
    pub committee: Arc<Committee<Ctx>>,

    /// The consensus stream of the instance
    pub identifier: Identifier,

    /// The height of the instance
    pub height: Height,

    /// The current round, never decreasing
    pub round: Round,

    /// The latest round in which this member saw a prepare quorum
    pub last_prepared_round: Option<Round>,

    /// The value prepared in `last_prepared_round`
    pub last_prepared_value: Option<Value>,

    /// The proposal accepted in the current round, if any
    pub proposal_accepted_for_current_round: Option<SignedMessage<Ctx>>,

    /// Whether a value was decided
    pub decided: bool,

    /// The decided value, immutable once set
    pub decided_value: Option<Value>,

    /// The value given on start, proposed when no value was prepared
    pub start_value: Option<Value>,

    /// Received proposals
    pub propose_container: MsgContainer<Ctx>,
    /// Received prepares
    pub prepare_container: MsgContainer<Ctx>,
    /// Received commits, including aggregated ones
    pub commit_container: MsgContainer<Ctx>,
    /// Received round changes
    pub round_change_container: MsgContainer<Ctx>,

    /// Round in which this member already proposed from a round change quorum
    pub(crate) proposed_on_round_change: Option<Round>,
}

impl<Ctx: Context> State<Ctx> {
    /// Create the state of a new instance, at the first round.
    pub fn new(committee: Arc<Committee<Ctx>>, identifier: Identifier, height: Height) -> Self {
        Self {
            committee,
            identifier,
            height,
            round: Round::FIRST,
            last_prepared_round: None,
            last_prepared_value: None,
            proposal_accepted_for_current_round: None,
            decided: false,
            decided_value: None,
            start_value: None,
            propose_container: MsgContainer::new(),
            prepare_container: MsgContainer::new(),
            commit_container: MsgContainer::new(),
            round_change_container: MsgContainer::new(),
            proposed_on_round_change: None,
        }
    }

    /// Return the value of the proposal accepted in the current round.
    pub fn accepted_value(&self) -> Option<&Value> {
        self.proposal_accepted_for_current_round
            .as_ref()
            .and_then(|proposal| proposal.message.value())
    }

    /// Move to a higher round, forgetting the proposal of the previous one.
    pub(crate) fn move_to_round(&mut self, round: Round) {
        debug_assert!(round > self.round);

        self.round = round;
        self.proposal_accepted_for_current_round = None;
    }
}
