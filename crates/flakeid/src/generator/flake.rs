use core::cmp::Ordering;
use core::time::Duration;
use std::thread;

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{DEFAULT_EPOCH, Error, FlakeId, IdGenStatus, Result, SystemClock, TimeSource};

/// How long [`FlakeGenerator::next_id`] sleeps between clock samples while it
/// waits for the clock to advance.
pub const CLOCK_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Upper bound on the number of IDs [`FlakeGenerator::next_n`] reserves space
/// for up front. Larger batches grow the buffer as they go.
const MAX_PREALLOC_IDS: usize = 1 << 16;

/// A lock-based flake ID generator suitable for multi-threaded environments.
///
/// The generator owns a worker ID, an epoch, a [`TimeSource`] and the last ID
/// it minted, which stands in for the last-seen timestamp and the current
/// sequence. The state is guarded by a single [`parking_lot::Mutex`]; share
/// the generator by reference or behind an [`Arc`] and every caller sees one
/// strictly increasing stream.
///
/// ## Guarantees
/// - IDs from one instance are strictly increasing, as long as its clock
///   eventually moves forward. A clock that jumps backwards is waited out, never
///   reused.
/// - At most 8192 IDs per millisecond; further callers block until the next
///   millisecond.
///
/// ## Not guaranteed
/// - Uniqueness across instances sharing a worker ID.
/// - Uniqueness across restarts if the clock reads earlier than it did when
///   the previous process stopped.
///
/// [`Arc`]: std::sync::Arc
#[derive(Debug)]
pub struct FlakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    /// `None` until the first ID is minted.
    state: Mutex<Option<FlakeId>>,
    worker_id: u64,
    /// Epoch in milliseconds since the Unix epoch.
    epoch: u64,
    time: T,
}

impl FlakeGenerator<SystemClock> {
    /// Creates a generator reading the system wall clock.
    ///
    /// A zero `epoch` selects [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidWorkerId`] if `worker_id` is greater than 1023.
    /// - [`Error::EpochInFuture`] if `epoch` is later than the current time.
    ///
    /// # Example
    /// ```
    /// use flakeid::FlakeGenerator;
    /// use std::time::Duration;
    ///
    /// let generator = FlakeGenerator::new(123, Duration::from_millis(1_234_567_891_011))?;
    ///
    /// let first = generator.next_id();
    /// let second = generator.next_id();
    /// assert_eq!(first.worker_id(), 123);
    /// assert!(second > first);
    /// # Ok::<(), flakeid::Error>(())
    /// ```
    pub fn new(worker_id: u64, epoch: Duration) -> Result<Self> {
        Self::with_time(worker_id, epoch, SystemClock)
    }
}

impl<T> FlakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator reading `time`.
    ///
    /// The epoch is validated against `time`, so mocked sources see a
    /// consistent view. A zero `epoch` selects [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidWorkerId`] if `worker_id` is greater than 1023.
    /// - [`Error::EpochInFuture`] if `epoch` is later than `time` reads now.
    pub fn with_time(worker_id: u64, epoch: Duration, time: T) -> Result<Self> {
        if worker_id > FlakeId::max_worker_id() {
            return Err(Error::InvalidWorkerId {
                worker_id,
                max: FlakeId::max_worker_id(),
            });
        }

        let epoch_ms = u64::try_from(epoch.as_millis()).unwrap_or(u64::MAX);
        let now_ms = time.current_millis();
        if epoch_ms > now_ms {
            return Err(Error::EpochInFuture { epoch_ms, now_ms });
        }

        let epoch_ms = if epoch_ms == 0 {
            DEFAULT_EPOCH.as_millis() as u64
        } else {
            epoch_ms
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(worker_id, epoch_ms, "created flake generator");

        Ok(Self {
            state: Mutex::new(None),
            worker_id,
            epoch: epoch_ms,
            time,
        })
    }

    /// The worker ID encoded into every ID from this generator.
    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    /// The epoch timestamps are measured from.
    pub fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch)
    }

    /// Attempts to mint the next ID without blocking.
    ///
    /// Returns [`IdGenStatus::Pending`] when the sequence is exhausted for the
    /// current millisecond or when the clock reads earlier than the last
    /// minted timestamp; the caller decides how to wait. The lock is released
    /// before returning, so this is the primitive for async callers.
    ///
    /// # Example
    /// ```
    /// use flakeid::{FlakeGenerator, FlakeId, IdGenStatus};
    ///
    /// let generator = FlakeGenerator::new(7, Default::default())?;
    ///
    /// let id: FlakeId = loop {
    ///     match generator.poll_id() {
    ///         IdGenStatus::Ready { id } => break id,
    ///         IdGenStatus::Pending { .. } => std::thread::yield_now(),
    ///     }
    /// };
    /// assert_eq!(id.worker_id(), 7);
    /// # Ok::<(), flakeid::Error>(())
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> IdGenStatus {
        let mut state = self.state.lock();
        self.advance(&mut state)
    }

    /// Mints the next ID, blocking until one is available.
    ///
    /// The lock is held for the whole call, including any wait for the clock
    /// to advance, so concurrent callers are served strictly one after
    /// another. The wait happens only after 8192 IDs in one millisecond or
    /// after the clock moved backwards.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> FlakeId {
        let mut state = self.state.lock();
        let mut waiting = false;
        loop {
            match self.advance(&mut state) {
                IdGenStatus::Ready { id } => return id,
                IdGenStatus::Pending { yield_for } => {
                    if !waiting {
                        waiting = true;
                        self.cold_wait_started(yield_for);
                    }
                    thread::sleep(CLOCK_POLL_INTERVAL);
                }
            }
        }
    }

    /// Mints `count` IDs and concatenates their 8-byte big-endian encodings.
    ///
    /// Equivalent to calling [`Self::next_id`] `count` times; other callers
    /// may interleave between elements. At most 65 536 IDs worth of space is
    /// reserved up front, so a huge `count` costs memory in proportion to the
    /// IDs actually minted. Callers streaming unbounded batches should mint in
    /// chunks instead.
    ///
    /// # Example
    /// ```
    /// use flakeid::{FlakeGenerator, FlakeId};
    ///
    /// let generator = FlakeGenerator::new(1, Default::default())?;
    /// let bytes = generator.next_n(3);
    /// assert_eq!(bytes.len(), 3 * FlakeId::BYTES_LEN);
    ///
    /// let ids: Vec<FlakeId> = bytes
    ///     .chunks_exact(FlakeId::BYTES_LEN)
    ///     .map(FlakeId::from_bytes)
    ///     .collect::<Result<_, _>>()?;
    /// assert!(ids.windows(2).all(|w| w[0] < w[1]));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_n(&self, count: usize) -> Vec<u8> {
        let mut buf = Vec::with_capacity(batch_capacity(count));
        for _ in 0..count {
            buf.extend_from_slice(&self.next_id().to_bytes());
        }
        buf
    }

    /// One step of the state machine: sample the clock, then either mint or
    /// report how long to wait. Must be called with the lock held.
    fn advance(&self, state: &mut Option<FlakeId>) -> IdGenStatus {
        let now_ms = self.time.current_millis();
        let Some(elapsed) = now_ms.checked_sub(self.epoch) else {
            return Self::cold_clock_behind(now_ms, self.epoch);
        };
        // Past the end of the 41-bit range the timestamp wraps and reads as a
        // regression, so the generator stalls instead of reusing IDs.
        let now = elapsed & FlakeId::TIMESTAMP_MASK;

        let Some(last) = *state else {
            let id = FlakeId::from_components(now, self.worker_id, 0);
            *state = Some(id);
            return IdGenStatus::Ready { id };
        };

        match now.cmp(&last.timestamp()) {
            Ordering::Equal => {
                if last.has_sequence_room() {
                    let id = last.increment_sequence();
                    *state = Some(id);
                    IdGenStatus::Ready { id }
                } else {
                    IdGenStatus::Pending { yield_for: 1 }
                }
            }
            Ordering::Greater => {
                let id = last.rollover_to_timestamp(now);
                *state = Some(id);
                IdGenStatus::Ready { id }
            }
            Ordering::Less => Self::cold_clock_behind(now, last.timestamp()),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> IdGenStatus {
        let yield_for = last - now;
        debug_assert!(yield_for > 0);
        IdGenStatus::Pending { yield_for }
    }

    #[cold]
    #[inline(never)]
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn cold_wait_started(&self, yield_for: u64) {
        #[cfg(feature = "tracing")]
        {
            if yield_for > 1 {
                tracing::warn!(
                    worker_id = self.worker_id,
                    yield_for,
                    "clock moved backwards, waiting for it to catch up"
                );
            } else {
                tracing::debug!(
                    worker_id = self.worker_id,
                    "waiting for the clock to reach the next millisecond"
                );
            }
        }
    }
}

/// Bytes to reserve for a batch of `count` IDs.
pub(crate) fn batch_capacity(count: usize) -> usize {
    count.min(MAX_PREALLOC_IDS) * FlakeId::BYTES_LEN
}
