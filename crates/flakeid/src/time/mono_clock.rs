use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::TimeSource;

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A wall-clock-aligned time source that never goes backwards.
///
/// The clock reads `SystemTime::now()` once at construction and from then on
/// advances only with a monotonic timer (`Instant`). NTP steps and manual
/// clock changes after construction are not observed, which spares a
/// generator from ever waiting out a clock regression.
///
/// Internally a background thread updates a shared atomic counter once per
/// millisecond, so reads are a single atomic load. The thread exits once the
/// last clone of the clock is dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    /// Wall-clock reading at construction, in ms since the Unix epoch.
    anchor: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Constructs a clock anchored to the current wall-clock time.
    ///
    /// # Example
    ///
    /// ```
    /// use flakeid::{MonotonicClock, SystemClock, TimeSource};
    ///
    /// let clock = MonotonicClock::new();
    /// std::thread::sleep(std::time::Duration::from_millis(5));
    ///
    /// let mono = clock.current_millis();
    /// let wall = SystemClock.current_millis();
    ///
    /// // The ticker can trail the wall clock by a tick or two, but it will
    /// // never go backwards.
    /// assert!(mono <= wall + 1);
    /// assert!(clock.current_millis() >= mono);
    /// ```
    pub fn new() -> Self {
        let start = Instant::now();
        let anchor = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = start.elapsed().as_millis() as u64;
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                // Align to next tick after the current actual time
                tick = now_ms + 1;
            }
        });

        let _ = inner._handle.set(handle);

        Self { inner, anchor }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the anchor plus the monotonic milliseconds elapsed since
    /// construction.
    fn current_millis(&self) -> u64 {
        self.anchor + self.inner.current.load(Ordering::Relaxed)
    }
}
