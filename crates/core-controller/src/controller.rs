use std::sync::Arc;

use derive_where::derive_where;
use tracing::{debug, info, warn};

use qbft_core_instance::{Decision, Environment, Instance};
use qbft_core_types::{
    Committee, Context, Height, Identifier, MessageType, Round, SignedMessage, Storage,
    StorageError, Value,
};
use qbft_metrics::{Metrics, MsgKind, SideEffect};

use crate::{Error, History, Params, SideEffectError};

/// A decision reached by one of the instances of the controller.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Decided<Ctx: Context> {
    /// Height of the deciding instance
    pub height: Height,
    /// The decided value
    pub value: Value,
    /// Aggregated commit of the deciding quorum
    pub commit: SignedMessage<Ctx>,
    /// Side effects of the decision that failed
    pub side_effect_errors: Vec<SideEffectError>,
}

/// Runs the instances of a single consensus stream, one height after the other.
pub struct Controller<Ctx: Context> {
    identifier: Identifier,
    height: Option<Height>,
    committee: Arc<Committee<Ctx>>,
    env: Environment<Ctx>,
    storage: Arc<dyn Storage<Ctx>>,
    params: Params,
    history: History<Instance<Ctx>>,
    metrics: Metrics,
}

impl<Ctx: Context> Controller<Ctx> {
    /// Create a controller for the stream `identifier`, with no instance
    /// started yet.
    ///
    /// Call [`Controller::load_highest_decided`] before starting the first
    /// instance to resume after a restart.
    pub fn new(
        identifier: Identifier,
        committee: Arc<Committee<Ctx>>,
        env: Environment<Ctx>,
        storage: Arc<dyn Storage<Ctx>>,
        params: Params,
        metrics: Metrics,
    ) -> Self {
        Self {
            identifier,
            height: None,
            committee,
            env,
            storage,
            history: History::new(params.history_capacity),
            params,
            metrics,
        }
    }

    /// Identifier of the consensus stream.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Height of the latest started instance, or of the latest known decision.
    pub fn height(&self) -> Option<Height> {
        self.height
    }

    /// The committee running every instance.
    pub fn committee(&self) -> &Arc<Committee<Ctx>> {
        &self.committee
    }

    /// Parameters of the controller and of its instances.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Metrics recorded by the controller.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The instances kept by the controller, most recent first.
    pub fn instances(&self) -> impl Iterator<Item = &Instance<Ctx>> {
        self.history.iter()
    }

    /// Return the instance running the given height, if it is still kept.
    pub fn instance_for_height(&self, height: Height) -> Option<&Instance<Ctx>> {
        self.history.find(|instance| instance.height() == height)
    }

    pub(crate) fn instance_for_height_mut(&mut self, height: Height) -> Option<&mut Instance<Ctx>> {
        self.history.find_mut(|instance| instance.height() == height)
    }

    /// Start an instance at the next height, proposing `value` when this
    /// member leads its first round.
    ///
    /// The instance of the previous height, if still kept, must have decided.
    /// When the first proposal cannot be broadcast, the instance is started
    /// nonetheless and the failure is returned.
    pub fn start_new_instance(&mut self, value: Value) -> Result<Height, Error> {
        if let Some(previous) = self.height {
            if let Some(instance) = self.instance_for_height(previous) {
                if !instance.is_decided() {
                    return Err(Error::PreviousInstanceNotDecided(previous));
                }
            }
        }

        self.env.ctx.check_value(&value).map_err(Error::InvalidValue)?;

        let height = self.height.map_or(Height::ZERO, |h| h.increment());
        self.height = Some(height);

        let instance = Instance::new(
            self.env.clone(),
            self.params.instance,
            Arc::clone(&self.committee),
            self.identifier.clone(),
            height,
        );

        if let Some(evicted) = self.history.push(instance) {
            debug!(height = %evicted.height(), "Evicted instance from history");
        }

        self.metrics.instance_started(height.as_u64());
        self.metrics.set_height(height.as_u64());

        info!(%height, "Started new instance");

        if let Some(instance) = self.instance_for_height_mut(height) {
            instance.start(value)?;
        }

        Ok(height)
    }

    /// Route a message to the instance it addresses.
    ///
    /// Commits signed by a quorum are decided messages and may address
    /// heights without a live instance. Returns the decision the first time
    /// an instance decides.
    pub fn process_msg(&mut self, msg: SignedMessage<Ctx>) -> Result<Option<Decided<Ctx>>, Error> {
        let kind = msg_kind(&msg, &self.committee);

        let result = if kind == MsgKind::Decided {
            self.process_decided(msg)
        } else {
            self.process_instance_msg(msg)
        };

        match &result {
            Ok(_) => self.metrics.message_processed(kind),
            Err(e) => {
                debug!(msg_type = ?kind, error = %e, "Rejected message");
                self.metrics.message_rejected(kind);
            }
        }

        result
    }

    fn process_instance_msg(
        &mut self,
        msg: SignedMessage<Ctx>,
    ) -> Result<Option<Decided<Ctx>>, Error> {
        if msg.identifier() != &self.identifier {
            return Err(Error::WrongIdentifier);
        }

        let height = msg.height();
        let instance = self
            .instance_for_height_mut(height)
            .ok_or(Error::InstanceNotFound(height))?;

        let decision = instance.process_msg(msg)?;

        Ok(decision.map(|decision| self.on_decision(height, decision)))
    }

    /// Persist and announce a decision reached by one of the instances.
    fn on_decision(&self, height: Height, decision: Decision<Ctx>) -> Decided<Ctx> {
        let round = decision.commit.round();

        info!(
            %height,
            %round,
            root = %decision.value.root(),
            "Decided"
        );

        self.metrics.decided(round.as_u64());

        let mut side_effect_errors = Vec::new();

        let persisted = self.is_highest_decided(height).and_then(|is_higher| {
            if is_higher {
                self.storage
                    .save_highest_decided(&self.identifier, &decision.commit)
            } else {
                debug!(%height, "Higher decision already stored, not persisting");
                Ok(())
            }
        });

        if let Err(e) = persisted {
            side_effect_errors.push(self.side_effect_failed(height, SideEffectError::Persist(e)));
        }

        if let Err(e) = self.env.network.broadcast_decided(&decision.commit) {
            side_effect_errors.push(self.side_effect_failed(height, SideEffectError::Broadcast(e)));
        }

        Decided {
            height,
            value: decision.value,
            commit: decision.commit,
            side_effect_errors,
        }
    }

    /// Whether a decision at `height` is above the stored highest decision.
    pub(crate) fn is_highest_decided(&self, height: Height) -> Result<bool, StorageError> {
        let stored = self.storage.get_highest_decided(&self.identifier)?;
        Ok(stored.map_or(true, |stored| stored.height() < height))
    }

    pub(crate) fn side_effect_failed(
        &self,
        height: Height,
        error: SideEffectError,
    ) -> SideEffectError {
        warn!(%height, %error, "Decision side effect failed");

        let effect = match error {
            SideEffectError::Persist(_) => SideEffect::Persist,
            SideEffectError::Broadcast(_) => SideEffect::Broadcast,
        };

        self.metrics.side_effect_failed(effect);
        error
    }

    /// Deliver the timeout of `round` to the instance at `height`.
    pub fn on_timeout(&mut self, height: Height, round: Round) -> Result<(), Error> {
        let instance = self
            .instance_for_height_mut(height)
            .ok_or(Error::InstanceNotFound(height))?;

        instance.on_round_timeout(round)?;
        Ok(())
    }

    /// Load the highest stored decision and resume from its height.
    ///
    /// The next instance started will run the height after it.
    pub fn load_highest_decided(&mut self) -> Result<Option<SignedMessage<Ctx>>, Error> {
        let stored = self.storage.get_highest_decided(&self.identifier)?;

        if let Some(decided) = &stored {
            let height = decided.height();

            if self.height.map_or(true, |current| current < height) {
                info!(%height, "Resuming from stored decision");

                self.height = Some(height);
                self.metrics.set_height(height.as_u64());
            }
        }

        Ok(stored)
    }

    pub(crate) fn env(&self) -> &Environment<Ctx> {
        &self.env
    }

    pub(crate) fn storage(&self) -> &dyn Storage<Ctx> {
        self.storage.as_ref()
    }

    pub(crate) fn advance_to(&mut self, height: Height) {
        if self.height.map_or(true, |current| current < height) {
            debug!(%height, "Fast-forwarding to decided height");

            self.height = Some(height);
            self.metrics.set_height(height.as_u64());
        }
    }
}

fn msg_kind<Ctx: Context>(msg: &SignedMessage<Ctx>, committee: &Committee<Ctx>) -> MsgKind {
    match msg.msg_type() {
        MessageType::Propose => MsgKind::Propose,
        MessageType::Prepare => MsgKind::Prepare,
        MessageType::Commit if msg.signers.len() >= committee.quorum() => MsgKind::Decided,
        MessageType::Commit => MsgKind::Commit,
        MessageType::RoundChange => MsgKind::RoundChange,
    }
}
