use tracing::{debug, info};

use qbft_core_types::{Context, SignedMessage, Value};

use crate::{Decision, Instance};

impl<Ctx: Context> Instance<Ctx> {
    /// Apply an already validated decided message, ie. an aggregated commit
    /// of a quorum.
    ///
    /// The instance decides when the message commits the proposal it
    /// accepted in the current round. Returns the decision the first time
    /// only.
    pub fn on_decided_message(&mut self, msg: &SignedMessage<Ctx>) -> Option<Decision<Ctx>> {
        if self.state.decided {
            return None;
        }

        let value = self.state.accepted_value()?.clone();

        if msg.message.value_root() != Some(value.root()) {
            debug!(
                height = %self.state.height,
                round = %msg.round(),
                "Decided message does not match the accepted proposal"
            );

            return None;
        }

        self.state.commit_container.add_message(msg.clone());

        info!(
            height = %self.state.height,
            round = %msg.round(),
            root = %value.root(),
            "Decided from decided message"
        );

        Some(self.decide(value, msg.clone()))
    }

    pub(crate) fn decide(&mut self, value: Value, commit: SignedMessage<Ctx>) -> Decision<Ctx> {
        self.state.decided = true;
        self.state.decided_value = Some(value.clone());
        self.env.timer.cancel(self.state.height);

        Decision { value, commit }
    }
}
