use tracing::{debug, warn};

use qbft_core_types::{Context, SignedMessage};
use qbft_signing::check_signers;

use crate::{Controller, Decided, DecidedError, Error, SideEffectError};

impl<Ctx: Context> Controller<Ctx> {
    /// Check that a decided message is an aggregated commit of a quorum of
    /// the committee, with valid signatures.
    pub fn validate_decided(&self, msg: &SignedMessage<Ctx>) -> Result<(), Error> {
        if msg.identifier() != self.identifier() {
            return Err(Error::WrongIdentifier);
        }

        check_signers(&msg.signers).map_err(DecidedError::from)?;

        let quorum = self.committee().quorum();
        if msg.signers.len() < quorum {
            return Err(DecidedError::NoQuorum {
                signers: msg.signers.len(),
                quorum,
            }
            .into());
        }

        let env = self.env();
        env.signer
            .verify_signed_message(msg, env.ctx.domain(), self.committee())
            .map_err(DecidedError::from)?;

        Ok(())
    }

    /// Apply a decided message.
    ///
    /// The decision is persisted when it is higher than the stored one and
    /// the controller fast-forwards to its height. An instance kept for that
    /// height decides if the message commits the proposal it accepted.
    pub(crate) fn process_decided(
        &mut self,
        msg: SignedMessage<Ctx>,
    ) -> Result<Option<Decided<Ctx>>, Error> {
        self.validate_decided(&msg)?;

        let height = msg.height();
        let mut side_effect_errors = Vec::new();

        let is_higher = self.is_highest_decided(height)?;

        if is_higher {
            if let Err(e) = self.storage().save_highest_decided(self.identifier(), &msg) {
                side_effect_errors.push(self.side_effect_failed(height, SideEffectError::Persist(e)));
            }
        }

        self.advance_to(height);

        let decision = self
            .instance_for_height_mut(height)
            .and_then(|instance| instance.on_decided_message(&msg));

        match decision {
            Some(decision) => {
                self.metrics().decided(decision.commit.round().as_u64());

                Ok(Some(Decided {
                    height,
                    value: decision.value,
                    commit: decision.commit,
                    side_effect_errors,
                }))
            }
            None => {
                if !side_effect_errors.is_empty() {
                    warn!(%height, "Decided message stored with failures");
                }

                debug!(%height, higher = is_higher, "Applied decided message");
                Ok(None)
            }
        }
    }
}
