use derive_where::derive_where;
use tokio::sync::oneshot;

use qbft_core_controller::{Decided, Error};
use qbft_core_types::{Context, Height, SignedMessage, Value};

use crate::Timeout;

pub type Reply<A> = oneshot::Sender<A>;

/// Inputs of the consensus task.
#[derive_where(Debug)]
pub enum Input<Ctx>
where
    Ctx: Context,
{
    /// Start the instance of the next height with the given value
    Start(Value, Reply<Result<Height, Error>>),

    /// Process a consensus message
    Message(
        SignedMessage<Ctx>,
        Reply<Result<Option<Decided<Ctx>>, Error>>,
    ),

    /// Resume from the highest stored decision
    LoadHighestDecided(Reply<Result<Option<SignedMessage<Ctx>>, Error>>),

    /// A round timed out
    Timeout(Timeout),
}
