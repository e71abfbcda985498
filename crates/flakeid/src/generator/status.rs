use crate::FlakeId;

/// Represents the result of attempting to mint a new ID without blocking.
///
/// This type models the outcome of [`FlakeGenerator::poll_id`]:
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the generator cannot produce a new ID
///   until the clock advances by `yield_for` milliseconds, either because the
///   sequence is exhausted for the current millisecond or because the clock is
///   behind the last minted timestamp.
///
/// This allows non-blocking generation loops and clean backoff strategies.
///
/// # Example
///
/// ```
/// use flakeid::{FlakeGenerator, IdGenStatus, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_700_000_000_000
///     }
/// }
///
/// let generator = FlakeGenerator::with_time(1, Default::default(), FixedTime)?;
/// match generator.poll_id() {
///     IdGenStatus::Ready { id } => println!("ID: {id}"),
///     IdGenStatus::Pending { yield_for } => println!("Back off for {yield_for} ms"),
/// }
/// # Ok::<(), flakeid::Error>(())
/// ```
///
/// [`FlakeGenerator::poll_id`]: crate::FlakeGenerator::poll_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: FlakeId,
    },
    /// No ID could be generated yet.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: u64,
    },
}
