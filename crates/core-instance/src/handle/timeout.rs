use tracing::{info, trace};

use qbft_core_types::{Context, Round};

use crate::{Error, Instance};

impl<Ctx: Context> Instance<Ctx> {
    /// Move to the next round after the timeout of `round` fired, and ask
    /// the committee to follow.
    ///
    /// Timeouts of other rounds than the current one are stale and ignored.
    pub fn on_round_timeout(&mut self, round: Round) -> Result<(), Error> {
        if self.is_stopped() {
            return Err(Error::InstanceStopped);
        }

        if self.state.decided || round != self.state.round {
            trace!(
                height = %self.state.height,
                %round,
                current = %self.state.round,
                "Ignoring stale timeout"
            );

            return Ok(());
        }

        let new_round = round.increment();

        info!(
            height = %self.state.height,
            %round,
            %new_round,
            "Round timed out, changing round"
        );

        self.state.move_to_round(new_round);
        self.schedule_timeout();

        let round_change = self.create_round_change(new_round);
        self.broadcast(&round_change)
    }
}
