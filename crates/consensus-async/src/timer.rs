use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use qbft_config::RoundTimeouts;
use qbft_core_types::{Height, Round, RoundTimer};

/// Expiry of a round.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timeout {
    pub height: Height,
    pub round: Round,
}

impl Timeout {
    /// Expiry of `round` at `height`.
    pub fn new(height: Height, round: Round) -> Self {
        Self { height, round }
    }
}

/// A round timer backed by Tokio tasks.
///
/// At most one timeout is pending: scheduling a round aborts the timeout
/// of the previous one. Cancelling only aborts a timeout of the same
/// height. Expired timeouts are sent on the channel returned
/// by [`TokioRoundTimer::new`].
#[derive(Clone, Debug)]
pub struct TokioRoundTimer {
    timeouts: RoundTimeouts,
    tx: mpsc::UnboundedSender<Timeout>,
    pending: Arc<Mutex<Option<(Height, JoinHandle<()>)>>>,
}

impl TokioRoundTimer {
    pub fn new(timeouts: RoundTimeouts) -> (Self, mpsc::UnboundedReceiver<Timeout>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let timer = Self {
            timeouts,
            tx,
            pending: Arc::default(),
        };

        (timer, rx)
    }

    fn replace_pending(&self, height: Height, task: JoinHandle<()>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((_, previous)) = pending.replace((height, task)) {
            previous.abort();
        }
    }
}

impl RoundTimer for TokioRoundTimer {
    fn schedule(&self, height: Height, round: Round) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(%height, %round, "No Tokio runtime, timeout not scheduled");
            return;
        };

        let duration = self.timeouts.duration(round.as_u64());
        let tx = self.tx.clone();

        trace!(%height, %round, ?duration, "Scheduling round timeout");

        let task = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(Timeout::new(height, round));
        });

        self.replace_pending(height, task);
    }

    fn cancel(&self, height: Height) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        match pending.take_if(|(pending_height, _)| *pending_height == height) {
            Some((_, task)) => {
                trace!(%height, "Cancelling round timeout");
                task.abort();
            }
            None => trace!(%height, "No pending timeout for height"),
        }
    }
}
