use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default epoch: Friday, February 13, 2009 23:31:31.011 UTC.
///
/// Shared by every generator constructed with a zero epoch so that IDs from
/// different instances carry comparable timestamp fields. With 41 timestamp
/// bits this epoch runs out in 2078.
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_234_567_891_011);

/// A trait for time sources that return a wall-clock timestamp.
///
/// This abstraction allows you to plug in the system clock, a monotonic
/// timer, or a mocked time source in tests.
///
/// The unit is **milliseconds since the Unix epoch**; generators subtract
/// their own configured epoch.
///
/// # Example
///
/// ```
/// use flakeid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_234_567_891_011
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1_234_567_891_011);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// The operating system's wall clock.
///
/// Every call reads [`SystemTime::now`], so readings follow NTP steps and
/// manual adjustments, including backwards ones. Generators wait out such
/// regressions rather than minting out-of-order IDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}
