use alloc::vec::Vec;

use tracing::{debug, info, trace};

use qbft_core_types::{Context, Round, SignedMessage};

use crate::{validation, Error, Instance};

impl<Ctx: Context> Instance<Ctx> {
    /// Record a round change, then propose if it completes a quorum for a
    /// round this member leads, and follow a partial quorum asking for
    /// higher rounds.
    pub(crate) fn on_round_change(&mut self, msg: SignedMessage<Ctx>) -> Result<(), Error> {
        let round = msg.round();
        validation::validate_round_change(&self.env, &self.state, &msg, round)?;

        let signers = msg.signers.clone();

        if !self
            .state
            .round_change_container
            .add_first_message_for_signer_and_round(msg)
        {
            trace!(%round, ?signers, "Ignoring duplicate round change");
            return Ok(());
        }

        if self.state.decided {
            trace!(%round, ?signers, "Stored round change after decision");
            return Ok(());
        }

        let proposed = self.propose_on_round_change_quorum(round);
        let skipped = self.skip_to_partial_quorum_round();

        proposed.and(skipped)
    }

    fn propose_on_round_change_quorum(&mut self, round: Round) -> Result<(), Error> {
        if round < self.state.round
            || self.state.proposed_on_round_change == Some(round)
            || !self.is_leader(round)
        {
            return Ok(());
        }

        // Preparations without a quorum of prepares cannot back the proposal.
        let round_changes: Vec<SignedMessage<Ctx>> = self
            .state
            .round_change_container
            .messages_for_round(round)
            .iter()
            .filter(|&rc| validation::is_justified_round_change(&self.env, &self.state, rc))
            .cloned()
            .collect();

        let signers = validation::distinct_signers(&round_changes);

        if !self.state.committee.thresholds().is_quorum(signers) {
            return Ok(());
        }

        let (value, prepare_justification) = match validation::highest_prepared(&round_changes) {
            Some(highest) => {
                let value = highest.message.value().cloned().ok_or(Error::MissingProposal)?;
                (value, highest.message.prepare_justification().to_vec())
            }
            None => match &self.state.start_value {
                Some(value) => (value.clone(), Vec::new()),
                None => {
                    debug!(%round, "Round change quorum reached before start, nothing to propose");
                    return Ok(());
                }
            },
        };

        info!(
            height = %self.state.height,
            %round,
            root = %value.root(),
            justified_by = signers,
            prepared = !prepare_justification.is_empty(),
            "Proposing on round change quorum"
        );

        self.state.proposed_on_round_change = Some(round);

        if round > self.state.round {
            self.state.move_to_round(round);
            self.schedule_timeout();
        }

        let proposal = self.create_proposal(
            round,
            value,
            round_changes,
            prepare_justification,
        );

        self.broadcast(&proposal)
    }

    fn skip_to_partial_quorum_round(&mut self) -> Result<(), Error> {
        let current = self.state.round;
        let container = &self.state.round_change_container;

        let signers = validation::distinct_signers(container.messages_above_round(current));
        if !self.state.committee.thresholds().is_partial_quorum(signers) {
            return Ok(());
        }

        let Some(new_round) = container.messages_above_round(current).map(|msg| msg.round()).min()
        else {
            return Ok(());
        };

        info!(
            height = %self.state.height,
            round = %current,
            %new_round,
            signers,
            "Partial quorum asks for a higher round, changing round"
        );

        self.state.move_to_round(new_round);
        self.schedule_timeout();

        let round_change = self.create_round_change(new_round);
        self.broadcast(&round_change)
    }
}
