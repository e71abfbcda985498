use core::time::Duration;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::scope;

use crate::{
    DEFAULT_EPOCH, Error, FlakeGenerator, FlakeId, IdGenStatus, MonotonicClock, SystemClock,
    TimeSource,
};

const BASE: u64 = 1_700_000_000_000;

#[derive(Debug)]
struct FixedTime {
    millis: u64,
}

impl TimeSource for FixedTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock the test moves by hand.
#[derive(Debug)]
struct ManualTime {
    millis: AtomicU64,
}

impl ManualTime {
    fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::Relaxed);
    }
}

impl TimeSource for ManualTime {
    fn current_millis(&self) -> u64 {
        self.millis.load(Ordering::Relaxed)
    }
}

/// Replays `values` one read at a time, repeating the last value forever.
#[derive(Debug)]
struct ScriptedTime {
    values: Vec<u64>,
    reads: AtomicUsize,
}

impl ScriptedTime {
    fn new(values: Vec<u64>) -> Self {
        Self {
            values,
            reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl TimeSource for ScriptedTime {
    fn current_millis(&self) -> u64 {
        let i = self.reads.fetch_add(1, Ordering::Relaxed);
        self.values[i.min(self.values.len() - 1)]
    }
}

trait IdGenStatusExt {
    fn unwrap_ready(self) -> FlakeId;
    fn unwrap_pending(self) -> u64;
}

impl IdGenStatusExt for IdGenStatus {
    fn unwrap_ready(self) -> FlakeId {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id:?})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn default_epoch_ms() -> u64 {
    DEFAULT_EPOCH.as_millis() as u64
}

#[test]
fn accepts_every_valid_worker_id() {
    for worker_id in [0, 1, 123, 512, 1023] {
        let generator = FlakeGenerator::new(worker_id, Duration::ZERO).unwrap();
        assert_eq!(generator.worker_id(), worker_id);
        assert_eq!(generator.next_id().worker_id(), worker_id);
    }
}

#[test]
fn rejects_out_of_range_worker_ids() {
    for worker_id in [1024, 4096, u64::MAX] {
        let err = FlakeGenerator::new(worker_id, Duration::ZERO).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidWorkerId {
                worker_id,
                max: 1023
            }
        );
    }
}

#[test]
fn rejects_epoch_in_the_future() {
    let time = FixedTime { millis: BASE };
    let err = FlakeGenerator::with_time(1, Duration::from_millis(BASE + 1), time).unwrap_err();
    assert_eq!(
        err,
        Error::EpochInFuture {
            epoch_ms: BASE + 1,
            now_ms: BASE
        }
    );

    let far_future = Duration::from_secs(u64::MAX);
    assert!(matches!(
        FlakeGenerator::new(1, far_future),
        Err(Error::EpochInFuture { .. })
    ));
}

#[test]
fn accepts_epoch_equal_to_now() {
    let time = FixedTime { millis: BASE };
    let generator = FlakeGenerator::with_time(1, Duration::from_millis(BASE), time).unwrap();
    let id = generator.poll_id().unwrap_ready();
    assert_eq!(id.timestamp(), 0);
}

#[test]
fn zero_epoch_selects_default() {
    let generator = FlakeGenerator::new(1, Duration::ZERO).unwrap();
    assert_eq!(generator.epoch(), DEFAULT_EPOCH);

    let custom = Duration::from_millis(1_288_834_974_657);
    let generator = FlakeGenerator::new(1, custom).unwrap();
    assert_eq!(generator.epoch(), custom);
}

#[test]
fn timestamp_is_relative_to_epoch() {
    let time = FixedTime { millis: BASE };
    let generator = FlakeGenerator::with_time(9, Duration::ZERO, time).unwrap();
    let id = generator.next_id();
    assert_eq!(id.timestamp(), BASE - default_epoch_ms());
    assert_eq!(id.unix_millis(generator.epoch()), BASE);
}

#[test]
fn sequence_increments_within_same_millisecond() {
    let generator = FlakeGenerator::with_time(42, Duration::ZERO, FixedTime { millis: BASE })
        .unwrap();

    let id1 = generator.poll_id().unwrap_ready();
    let id2 = generator.poll_id().unwrap_ready();
    let id3 = generator.poll_id().unwrap_ready();

    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert_eq!(id1.timestamp(), id2.timestamp());
    assert_eq!(id2.timestamp(), id3.timestamp());
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn same_millisecond_ids_differ_only_in_sequence_bits() {
    let epoch = Duration::from_millis(1_234_567_891_011);
    let generator = FlakeGenerator::with_time(123, epoch, FixedTime { millis: BASE }).unwrap();

    let first = generator.next_id();
    let second = generator.next_id();

    assert_eq!(first.worker_id(), 123);
    assert_eq!(first.sequence(), 0);
    assert_eq!(second.worker_id(), 123);
    assert_eq!(second.sequence(), 1);
    assert_eq!(first.timestamp(), second.timestamp());
    assert_eq!(first.to_raw() ^ second.to_raw(), 1);
    assert!(second > first);
}

#[test]
fn sequence_resets_when_clock_advances() {
    let time = ManualTime::new(BASE);
    let generator = FlakeGenerator::with_time(1, Duration::ZERO, &time).unwrap();

    generator.poll_id().unwrap_ready();
    generator.poll_id().unwrap_ready();
    let before = generator.poll_id().unwrap_ready();
    assert_eq!(before.sequence(), 2);

    time.set(BASE + 5);
    let after = generator.poll_id().unwrap_ready();
    assert_eq!(after.sequence(), 0);
    assert_eq!(after.timestamp(), before.timestamp() + 5);
    assert!(after > before);
}

#[test]
fn poll_returns_pending_when_sequence_exhausted() {
    let time = ManualTime::new(BASE);
    let generator = FlakeGenerator::with_time(1, Duration::ZERO, &time).unwrap();

    for i in 0..=FlakeId::max_sequence() {
        let id = generator.poll_id().unwrap_ready();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.timestamp(), BASE - default_epoch_ms());
    }

    assert_eq!(generator.poll_id().unwrap_pending(), 1);
    assert_eq!(generator.poll_id().unwrap_pending(), 1);

    time.set(BASE + 1);
    let id = generator.poll_id().unwrap_ready();
    assert_eq!(id.timestamp(), BASE + 1 - default_epoch_ms());
    assert_eq!(id.sequence(), 0);
}

#[test]
fn next_id_waits_for_next_millisecond_when_exhausted() {
    let sequence_space = FlakeId::max_sequence() as usize + 1;
    // One read at construction, one per ID, then five stale reads while the
    // generator waits.
    let stale_reads = 1 + sequence_space + 5;
    let mut values = vec![BASE; stale_reads];
    values.push(BASE + 1);
    let time = ScriptedTime::new(values);

    let generator = FlakeGenerator::with_time(3, Duration::ZERO, &time).unwrap();
    let mut last = None;
    for i in 0..sequence_space {
        let id = generator.next_id();
        assert_eq!(id.sequence(), i as u64);
        if let Some(prev) = last {
            assert!(id > prev);
        }
        last = Some(id);
    }

    let id = generator.next_id();
    assert_eq!(id.timestamp(), BASE + 1 - default_epoch_ms());
    assert_eq!(id.sequence(), 0);
    assert!(Some(id) > last);
    assert_eq!(time.reads(), stale_reads + 1);
}

#[test]
fn clock_regression_is_waited_out() {
    let time = ManualTime::new(BASE);
    let generator = FlakeGenerator::with_time(1, Duration::ZERO, &time).unwrap();
    let first = generator.poll_id().unwrap_ready();

    time.set(BASE - 10);
    assert_eq!(generator.poll_id().unwrap_pending(), 10);

    // Back at the last timestamp: the sequence continues instead of
    // restarting at zero.
    time.set(BASE);
    let second = generator.poll_id().unwrap_ready();
    assert_eq!(second.timestamp(), first.timestamp());
    assert_eq!(second.sequence(), 1);
    assert!(second > first);
}

#[test]
fn next_id_blocks_through_clock_regression() {
    let time = ScriptedTime::new(vec![BASE, BASE, BASE - 5, BASE - 3, BASE - 1, BASE]);
    let generator = FlakeGenerator::with_time(1, Duration::ZERO, &time).unwrap();

    let first = generator.next_id();
    let second = generator.next_id();
    assert_eq!(second.timestamp(), first.timestamp());
    assert_eq!(second.sequence(), 1);
    assert_eq!(time.reads(), 6);
}

#[test]
fn clock_behind_epoch_is_pending() {
    let time = ManualTime::new(BASE);
    let generator = FlakeGenerator::with_time(1, Duration::from_millis(BASE), &time).unwrap();

    time.set(BASE - 3);
    assert_eq!(generator.poll_id().unwrap_pending(), 3);

    time.set(BASE);
    let id = generator.poll_id().unwrap_ready();
    assert_eq!(id.timestamp(), 0);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn pending_poll_leaves_state_untouched() {
    let time = ManualTime::new(BASE);
    let generator = FlakeGenerator::with_time(1, Duration::ZERO, &time).unwrap();
    let first = generator.poll_id().unwrap_ready();

    time.set(BASE - 1);
    for _ in 0..3 {
        generator.poll_id().unwrap_pending();
    }

    time.set(BASE + 1);
    let next = generator.poll_id().unwrap_ready();
    assert_eq!(next.timestamp(), first.timestamp() + 1);
    assert_eq!(next.sequence(), 0);
}

#[test]
fn next_n_concatenates_big_endian_ids() {
    let generator = FlakeGenerator::with_time(5, Duration::ZERO, FixedTime { millis: BASE })
        .unwrap();

    assert!(generator.next_n(0).is_empty());

    let bytes = generator.next_n(4);
    assert_eq!(bytes.len(), 4 * FlakeId::BYTES_LEN);

    let ids: Vec<FlakeId> = bytes
        .chunks_exact(FlakeId::BYTES_LEN)
        .map(|chunk| FlakeId::from_bytes(chunk).unwrap())
        .collect();
    let sequences: Vec<u64> = ids.iter().map(FlakeId::sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3]);
    assert!(ids.iter().all(|id| id.worker_id() == 5));

    // Continues the same stream.
    assert_eq!(generator.next_id().sequence(), 4);
}

#[test]
fn next_n_reserves_a_bounded_buffer() {
    use super::flake::batch_capacity;

    assert_eq!(batch_capacity(0), 0);
    assert_eq!(batch_capacity(4), 4 * FlakeId::BYTES_LEN);
    // Counts whose byte length would overflow reserve a fixed cap instead.
    assert_eq!(batch_capacity(usize::MAX / 4), batch_capacity(1 << 16));
    assert_eq!(batch_capacity(usize::MAX), (1 << 16) * FlakeId::BYTES_LEN);
}

fn run_generator_monotonic<T: TimeSource>(generator: &FlakeGenerator<T>) {
    const TOTAL_IDS: usize = 10_000;

    let mut last: Option<FlakeId> = None;
    let mut expected_sequence = 0;
    for _ in 0..TOTAL_IDS {
        let id = generator.next_id();
        if let Some(prev) = last {
            assert!(id > prev);
            assert!(id.timestamp() >= prev.timestamp());
            if id.timestamp() > prev.timestamp() {
                expected_sequence = 0;
            }
        }
        assert_eq!(id.sequence(), expected_sequence);
        assert_eq!(id.worker_id(), generator.worker_id());
        expected_sequence += 1;
        last = Some(id);
    }
}

#[test]
fn generator_monotonic_system_clock() {
    let generator = FlakeGenerator::new(17, Duration::ZERO).unwrap();
    run_generator_monotonic(&generator);
}

#[test]
fn generator_monotonic_monotonic_clock() {
    let generator = FlakeGenerator::with_time(17, Duration::ZERO, MonotonicClock::new()).unwrap();
    run_generator_monotonic(&generator);
}

fn run_generator_unique_threaded<T: TimeSource + Sync>(generator: &FlakeGenerator<T>) {
    const TOTAL_IDS: usize = 8192 * 16;
    let threads = num_cpus::get().clamp(2, 16);
    let ids_per_thread = TOTAL_IDS / threads;

    let seen_ids = Mutex::new(HashSet::with_capacity(TOTAL_IDS));

    scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                let mut local = Vec::with_capacity(ids_per_thread);
                for _ in 0..ids_per_thread {
                    local.push(generator.next_id());
                }
                // Each caller sees its own IDs in increasing order.
                assert!(local.windows(2).all(|w| w[0] < w[1]));
                let mut seen = seen_ids.lock().unwrap();
                for id in local {
                    assert!(seen.insert(id), "duplicate id {id:?}");
                }
            });
        }
    });

    assert_eq!(seen_ids.lock().unwrap().len(), ids_per_thread * threads);
}

#[test]
fn generator_unique_threaded_system_clock() {
    let generator = FlakeGenerator::with_time(99, Duration::ZERO, SystemClock).unwrap();
    run_generator_unique_threaded(&generator);
}

#[test]
fn generator_unique_threaded_monotonic_clock() {
    let generator = FlakeGenerator::with_time(99, Duration::ZERO, MonotonicClock::new()).unwrap();
    run_generator_unique_threaded(&generator);
}

#[test]
fn generator_unique_threaded_frozen_clock() {
    // A frozen clock exhausts the sequence and never advances, so poll from
    // many threads and stop at the first pending.
    let generator = FlakeGenerator::with_time(1, Duration::ZERO, FixedTime { millis: BASE })
        .unwrap();
    let seen_ids = Mutex::new(HashSet::new());

    scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                while let IdGenStatus::Ready { id } = generator.poll_id() {
                    assert!(seen_ids.lock().unwrap().insert(id));
                }
            });
        }
    });

    assert_eq!(
        seen_ids.lock().unwrap().len() as u64,
        FlakeId::max_sequence() + 1
    );
}
