use tracing::debug;

use qbft_core_types::{Context, SignedMessage};

use crate::{validation, Error, Instance};

impl<Ctx: Context> Instance<Ctx> {
    /// Accept a valid proposal and prepare its value.
    ///
    /// A proposal for a higher round moves the instance to that round.
    pub(crate) fn on_proposal(&mut self, msg: SignedMessage<Ctx>) -> Result<(), Error> {
        validation::validate_proposal(&self.env, &self.state, &msg)?;

        let round = msg.round();
        let value = msg.message.value().cloned().ok_or(Error::MissingProposal)?;

        debug!(
            height = %self.state.height,
            %round,
            root = %value.root(),
            "Accepted proposal"
        );

        self.state.propose_container.add_first_message_for_signer_and_round(msg.clone());

        if round > self.state.round {
            self.state.move_to_round(round);
            self.schedule_timeout();
        }

        self.state.proposal_accepted_for_current_round = Some(msg);

        let prepare = self.create_prepare(round, &value);
        self.broadcast(&prepare)
    }
}
