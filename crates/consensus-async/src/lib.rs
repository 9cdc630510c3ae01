//! Drives a consensus controller from a Tokio task.
//!
//! The [`Consensus`] actor owns the controller and processes its inputs one
//! at a time. Callers talk to it through a cloneable [`Handle`], and round
//! timeouts are delivered by a [`TokioRoundTimer`].

use std::ops::ControlFlow;

use derive_where::derive_where;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use qbft_core_controller::{Controller, Decided, Error as ControllerError};
use qbft_core_types::{Context, Height, Round, SignedMessage, Value};

mod input;
pub use input::{Input, Reply};

mod timer;
pub use timer::{Timeout, TokioRoundTimer};

/// Why a request sent through a [`Handle`] failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("consensus error: {0}")]
    Controller(#[from] ControllerError),

    #[error("consensus task stopped")]
    Stopped,
}

/// Cloneable handle to a running [`Consensus`] task.
#[derive_where(Clone)]
pub struct Handle<Ctx>
where
    Ctx: Context,
{
    tx_input: mpsc::Sender<Input<Ctx>>,
}

impl<Ctx> Handle<Ctx>
where
    Ctx: Context,
{
    async fn request<A>(
        &self,
        input: impl FnOnce(Reply<Result<A, ControllerError>>) -> Input<Ctx>,
    ) -> Result<A, Error> {
        let (reply, rx) = oneshot::channel();

        self.tx_input
            .send(input(reply))
            .await
            .map_err(|_| Error::Stopped)?;

        Ok(rx.await.map_err(|_| Error::Stopped)??)
    }

    /// Start the instance of the next height.
    pub async fn start(&self, value: Value) -> Result<Height, Error> {
        self.request(|reply| Input::Start(value, reply)).await
    }

    /// Process a consensus message.
    pub async fn process_msg(&self, msg: SignedMessage<Ctx>) -> Result<Option<Decided<Ctx>>, Error> {
        self.request(|reply| Input::Message(msg, reply)).await
    }

    /// Resume from the highest stored decision.
    pub async fn load_highest_decided(&self) -> Result<Option<SignedMessage<Ctx>>, Error> {
        self.request(Input::LoadHighestDecided).await
    }

    /// Deliver a round timeout.
    pub async fn timeout(&self, height: Height, round: Round) -> Result<(), Error> {
        self.tx_input
            .send(Input::Timeout(Timeout::new(height, round)))
            .await
            .map_err(|_| Error::Stopped)
    }
}

/// Actor owning a [`Controller`].
///
/// Inputs sent through the [`Handle`]s and expired round timeouts are
/// processed one at a time by [`Consensus::run`].
pub struct Consensus<Ctx>
where
    Ctx: Context,
{
    controller: Controller<Ctx>,
    rx_input: mpsc::Receiver<Input<Ctx>>,
    rx_timeout: mpsc::UnboundedReceiver<Timeout>,
}

impl<Ctx> Consensus<Ctx>
where
    Ctx: Context,
{
    /// Wrap a controller, whose round timer feeds `rx_timeout`.
    pub fn new(
        controller: Controller<Ctx>,
        rx_timeout: mpsc::UnboundedReceiver<Timeout>,
        capacity: usize,
    ) -> (Self, Handle<Ctx>) {
        let (tx_input, rx_input) = mpsc::channel(capacity);

        (
            Self {
                controller,
                rx_input,
                rx_timeout,
            },
            Handle { tx_input },
        )
    }

    /// The controller driven by this actor.
    pub fn controller(&self) -> &Controller<Ctx> {
        &self.controller
    }

    /// Process inputs until every handle is dropped, returning the controller.
    pub async fn run(mut self) -> Controller<Ctx> {
        while let ControlFlow::Continue(()) = self.run_inner().await {}

        debug!("All handles dropped, stopping consensus");
        self.controller
    }

    async fn run_inner(&mut self) -> ControlFlow<()> {
        tokio::select! {
            input = self.rx_input.recv() => match input {
                Some(input) => {
                    self.process(input);
                    ControlFlow::Continue(())
                }
                None => ControlFlow::Break(()),
            },

            Some(timeout) = self.rx_timeout.recv() => {
                self.on_timeout(timeout);
                ControlFlow::Continue(())
            }
        }
    }

    /// Process a single input to completion.
    pub fn process(&mut self, input: Input<Ctx>) {
        match input {
            Input::Start(value, reply) => {
                respond(reply, self.controller.start_new_instance(value));
            }

            Input::Message(msg, reply) => {
                respond(reply, self.controller.process_msg(msg));
            }

            Input::LoadHighestDecided(reply) => {
                respond(reply, self.controller.load_highest_decided());
            }

            Input::Timeout(timeout) => self.on_timeout(timeout),
        }
    }

    fn on_timeout(&mut self, timeout: Timeout) {
        let Timeout { height, round } = timeout;

        if let Err(e) = self.controller.on_timeout(height, round) {
            debug!(%height, %round, error = %e, "Failed to process timeout");
        }
    }
}

fn respond<A>(reply: Reply<A>, result: A) {
    if reply.send(result).is_err() {
        trace!("Requester dropped before the reply was sent");
    }
}
