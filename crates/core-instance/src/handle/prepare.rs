use tracing::{debug, trace};

use qbft_core_types::{Context, SignedMessage};

use crate::{validation, Error, Instance};

impl<Ctx: Context> Instance<Ctx> {
    /// Record a prepare and commit the first time the round reaches a prepare quorum.
    pub(crate) fn on_prepare(&mut self, msg: SignedMessage<Ctx>) -> Result<(), Error> {
        validation::validate_vote(&self.env, &self.state, &msg)?;

        let round = msg.round();
        let signers = msg.signers.clone();

        if !self.state.prepare_container.add_first_message_for_signer_and_round(msg) {
            trace!(%round, ?signers, "Ignoring duplicate prepare");
            return Ok(());
        }

        let value = self
            .state
            .accepted_value()
            .cloned()
            .ok_or(Error::MissingProposal)?;

        if self.state.last_prepared_round == Some(round)
            && self.state.last_prepared_value.as_ref() == Some(&value)
        {
            trace!(%round, "Already prepared in this round");
            return Ok(());
        }

        let prepared = self
            .state
            .prepare_container
            .longest_unique_signers_for_round_and_value(round, &value.root());

        if !self.state.committee.thresholds().is_quorum(prepared.len()) {
            return Ok(());
        }

        debug!(
            height = %self.state.height,
            %round,
            root = %value.root(),
            signers = prepared.len(),
            "Reached prepare quorum"
        );

        self.state.last_prepared_round = Some(round);
        self.state.last_prepared_value = Some(value.clone());

        let commit = self.create_commit(round, &value);
        self.broadcast(&commit)
    }
}
