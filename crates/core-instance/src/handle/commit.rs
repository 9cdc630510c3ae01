use tracing::{info, trace};

use qbft_core_types::{Context, SignedMessage};

use crate::{validation, Decision, Error, Instance};

impl<Ctx: Context> Instance<Ctx> {
    /// Record a commit and decide the first time the round reaches a commit quorum.
    ///
    /// Commits arriving after the decision are validated and absorbed.
    pub(crate) fn on_commit(
        &mut self,
        msg: SignedMessage<Ctx>,
    ) -> Result<Option<Decision<Ctx>>, Error> {
        validation::validate_vote(&self.env, &self.state, &msg)?;

        let round = msg.round();
        let signers = msg.signers.clone();

        if !self.state.commit_container.add_first_message_for_signer_and_round(msg) {
            trace!(%round, ?signers, "Ignoring duplicate commit");
            return Ok(None);
        }

        if self.state.decided {
            trace!(%round, ?signers, "Absorbed commit after decision");
            return Ok(None);
        }

        let value = self
            .state
            .accepted_value()
            .cloned()
            .ok_or(Error::MissingProposal)?;

        let committed = self
            .state
            .commit_container
            .longest_unique_signers_for_round_and_value(round, &value.root());

        if !self.state.committee.thresholds().is_quorum(committed.len()) {
            return Ok(None);
        }

        let commit = qbft_signing::aggregate(&committed.messages)?;

        info!(
            height = %self.state.height,
            %round,
            root = %value.root(),
            signers = ?commit.signers,
            "Decided"
        );

        Ok(Some(self.decide(value, commit)))
    }
}
