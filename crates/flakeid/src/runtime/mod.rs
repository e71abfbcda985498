mod tokio;

use core::{future::Future, time::Duration};

pub use self::tokio::*;
use crate::{FlakeGenerator, FlakeId, IdGenStatus, TimeSource};

/// A trait that abstracts over how to sleep for a given [`Duration`] in async
/// contexts.
pub trait SleepProvider {
    /// We require `Send` so that the future can be safely moved across threads
    type Sleep: Future<Output = ()> + Send;

    fn sleep_for(dur: Duration) -> Self::Sleep;
}

/// Extension trait for minting IDs from async code.
///
/// Unlike [`FlakeGenerator::next_id`], the returned future never holds the
/// generator's lock while waiting: it polls with
/// [`FlakeGenerator::poll_id`] and sleeps between attempts, so other tasks
/// keep minting during a wait.
pub trait FlakeGeneratorAsyncExt {
    /// Returns a future that resolves to the next available ID, sleeping with
    /// `S` whenever the generator reports it must wait.
    fn next_id_async<S>(&self) -> impl Future<Output = FlakeId> + Send
    where
        S: SleepProvider;
}

impl<T> FlakeGeneratorAsyncExt for FlakeGenerator<T>
where
    T: TimeSource + Send + Sync,
{
    fn next_id_async<S>(&self) -> impl Future<Output = FlakeId> + Send
    where
        S: SleepProvider,
    {
        async {
            loop {
                let dur = match self.poll_id() {
                    IdGenStatus::Ready { id } => return id,
                    IdGenStatus::Pending { yield_for } => Duration::from_millis(yield_for),
                };
                S::sleep_for(dur).await;
            }
        }
    }
}
