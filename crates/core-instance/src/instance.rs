use alloc::sync::Arc;
use alloc::vec::Vec;

use derive_where::derive_where;
use tracing::{debug, info, trace, warn};

use qbft_core_types::{
    Body, Committee, Context, Height, Identifier, Message, MessageType, Network, Prepared, Round,
    RoundTimer, SignedMessage, Value,
};
use qbft_signing::SigningProvider;

use crate::{validation, Error, Params, State};

/// The collaborators of an instance, shared by all instances of a controller.
#[derive_where(Clone)]
pub struct Environment<Ctx: Context> {
    /// Proposer selection, value check and signing domain
    pub ctx: Ctx,
    /// Signs on behalf of this member and verifies signatures of others
    pub signer: Arc<dyn SigningProvider<Ctx>>,
    /// Disseminates the messages produced by transitions
    pub network: Arc<dyn Network<Ctx>>,
    /// Delivers round timeouts
    pub timer: Arc<dyn RoundTimer>,
}

impl<Ctx: Context> Environment<Ctx> {
    /// Create a new environment.
    pub fn new(
        ctx: Ctx,
        signer: Arc<dyn SigningProvider<Ctx>>,
        network: Arc<dyn Network<Ctx>>,
        timer: Arc<dyn RoundTimer>,
    ) -> Self {
        Self {
            ctx,
            signer,
            network,
            timer,
        }
    }
}

/// A decision, reported once per instance.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Decision<Ctx: Context> {
    /// The decided value
    pub value: Value,
    /// The commits of the deciding quorum, aggregated into one message
    pub commit: SignedMessage<Ctx>,
}

/// The QBFT state machine deciding on a value at a single height.
///
/// Messages are processed one at a time, to completion.
pub struct Instance<Ctx: Context> {
    pub(crate) env: Environment<Ctx>,
    pub(crate) params: Params,
    pub(crate) state: State<Ctx>,
    pub(crate) started: bool,
}

impl<Ctx: Context> Instance<Ctx> {
    /// Create a new instance at the first round of the given height.
    pub fn new(
        env: Environment<Ctx>,
        params: Params,
        committee: Arc<Committee<Ctx>>,
        identifier: Identifier,
        height: Height,
    ) -> Self {
        Self {
            env,
            params,
            state: State::new(committee, identifier, height),
            started: false,
        }
    }

    /// Return the state of the instance.
    pub fn state(&self) -> &State<Ctx> {
        &self.state
    }

    /// Return the parameters of the instance.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Return the height of the instance.
    pub fn height(&self) -> Height {
        self.state.height
    }

    /// Return the current round.
    pub fn round(&self) -> Round {
        self.state.round
    }

    /// Return the consensus stream of the instance.
    pub fn identifier(&self) -> &Identifier {
        &self.state.identifier
    }

    /// Whether the instance was started.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether a value was decided.
    pub fn is_decided(&self) -> bool {
        self.state.decided
    }

    /// Return the decided value, if any.
    pub fn decided_value(&self) -> Option<&Value> {
        self.state.decided_value.as_ref()
    }

    /// Whether the round cutoff was reached.
    pub fn is_stopped(&self) -> bool {
        self.state.round >= self.params.round_cutoff
    }

    /// Start the instance with the value to propose when this member leads.
    ///
    /// Only the first call has an effect.
    pub fn start(&mut self, value: Value) -> Result<(), Error> {
        if self.started {
            trace!(height = %self.state.height, "Instance already started");
            return Ok(());
        }

        self.started = true;
        self.state.start_value = Some(value.clone());

        let (height, round) = (self.state.height, self.state.round);
        info!(%height, %round, "Starting instance");

        self.schedule_timeout();

        if round.is_first() && self.is_leader(round) {
            debug!(%height, %round, "Proposing as leader of the first round");

            let proposal = self.create_proposal(round, value, Vec::new(), Vec::new());
            self.broadcast(&proposal)?;
        }

        Ok(())
    }

    /// Validate a message and apply the transition it triggers.
    ///
    /// Returns the decision the first time the instance decides. Rejected
    /// messages leave the state untouched.
    pub fn process_msg(
        &mut self,
        msg: SignedMessage<Ctx>,
    ) -> Result<Option<Decision<Ctx>>, Error> {
        if self.is_stopped() {
            return Err(Error::InstanceStopped);
        }

        validation::validate_base(&self.state, &msg)?;

        match msg.msg_type() {
            MessageType::Propose => self.on_proposal(msg).map(|()| None),
            MessageType::Prepare => self.on_prepare(msg).map(|()| None),
            MessageType::Commit => self.on_commit(msg),
            MessageType::RoundChange => self.on_round_change(msg).map(|()| None),
        }
    }

    pub(crate) fn is_leader(&self, round: Round) -> bool {
        let leader = self
            .env
            .ctx
            .select_proposer(&self.state.committee, self.state.height, round);

        leader == self.env.signer.signer()
    }

    pub(crate) fn schedule_timeout(&self) {
        if self.is_stopped() {
            self.env.timer.cancel(self.state.height);
        } else {
            self.env.timer.schedule(self.state.height, self.state.round);
        }
    }

    pub(crate) fn broadcast(&self, msg: &SignedMessage<Ctx>) -> Result<(), Error> {
        self.env.network.broadcast(msg).map_err(|e| {
            warn!(
                height = %msg.height(),
                round = %msg.round(),
                msg_type = %msg.msg_type(),
                error = %e,
                "Failed to broadcast message"
            );

            Error::Broadcast(e)
        })
    }

    fn sign(&self, round: Round, body: Body<Ctx>) -> SignedMessage<Ctx> {
        let message = Message::new(
            self.state.identifier.clone(),
            self.state.height,
            round,
            body,
        );

        self.env.signer.sign_message(message, self.env.ctx.domain())
    }

    pub(crate) fn create_proposal(
        &self,
        round: Round,
        value: Value,
        round_change_justification: Vec<SignedMessage<Ctx>>,
        prepare_justification: Vec<SignedMessage<Ctx>>,
    ) -> SignedMessage<Ctx> {
        self.sign(
            round,
            Body::Propose {
                value,
                round_change_justification,
                prepare_justification,
            },
        )
    }

    pub(crate) fn create_prepare(&self, round: Round, value: &Value) -> SignedMessage<Ctx> {
        self.sign(round, Body::Prepare { root: value.root() })
    }

    pub(crate) fn create_commit(&self, round: Round, value: &Value) -> SignedMessage<Ctx> {
        self.sign(round, Body::Commit { root: value.root() })
    }

    /// Create a round change for `round`, reporting the latest preparation
    /// of this member along with the prepares justifying it.
    pub(crate) fn create_round_change(&self, round: Round) -> SignedMessage<Ctx> {
        let prepared = self
            .state
            .last_prepared_round
            .zip(self.state.last_prepared_value.clone())
            .map(|(round, value)| Prepared::new(round, value));

        let prepare_justification = prepared
            .as_ref()
            .map(|prepared| {
                self.state
                    .prepare_container
                    .longest_unique_signers_for_round_and_value(
                        prepared.round,
                        &prepared.value.root(),
                    )
                    .messages
            })
            .unwrap_or_default();

        self.sign(
            round,
            Body::RoundChange {
                prepared,
                prepare_justification,
            },
        )
    }
}
