use core::fmt;
use core::time::Duration;

use super::layout::{FieldLayout, write_bit_layout_debug};

/// A 64-bit flake ID.
///
/// - 41 bits timestamp (ms since the generator's epoch)
/// - 10 bits worker ID
/// - 13 bits sequence
///
/// ```text
///  Bit Index:  63             23 22             13 12             0
///              +----------------+-----------------+---------------+
///  Field:      | timestamp (41) |  worker ID (10) | sequence (13) |
///              +----------------+-----------------+---------------+
///              |<----- MSB ---------- 64 bits --------- LSB ----->|
/// ```
///
/// Because the fields are packed MSB-first, comparing two IDs as integers
/// compares their timestamps first, then worker IDs, then sequences.
///
/// # Example
///
/// ```
/// use flakeid::FlakeId;
///
/// let id = FlakeId::from(1000, 123, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.worker_id(), 123);
/// assert_eq!(id.sequence(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FlakeId {
    id: u64,
}

impl FlakeId {
    /// Width of the timestamp field.
    pub const TIMESTAMP_BITS: u32 = 41;

    /// Width of the worker ID field.
    pub const WORKER_ID_BITS: u32 = 10;

    /// Width of the sequence field.
    pub const SEQUENCE_BITS: u32 = 13;

    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 23
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Bitmask for extracting the 10-bit worker ID field. Occupies bits 13
    /// through 22.
    pub const WORKER_ID_MASK: u64 = (1 << Self::WORKER_ID_BITS) - 1;

    /// Bitmask for extracting the 13-bit sequence field. Occupies bits 0
    /// through 12.
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 23).
    pub const TIMESTAMP_SHIFT: u32 = Self::SEQUENCE_BITS + Self::WORKER_ID_BITS;

    /// Number of bits to shift the worker ID to its correct position (bit 13).
    pub const WORKER_ID_SHIFT: u32 = Self::SEQUENCE_BITS;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Packs the three fields into an ID, truncating each to its width.
    pub const fn from(timestamp: u64, worker_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | worker_id | sequence,
        }
    }

    /// Packs the three fields into an ID.
    ///
    /// Same as [`FlakeId::from`], but debug builds assert that no field
    /// exceeds its width.
    pub fn from_components(timestamp: u64, worker_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, worker_id, sequence)
    }

    /// Extracts the timestamp (ms since epoch) from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the worker ID from the packed ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum possible value for the timestamp field.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum possible value for the worker ID field.
    pub const fn max_worker_id() -> u64 {
        Self::WORKER_ID_MASK
    }

    /// Returns the maximum possible value for the sequence field.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns the raw 64-bit value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw 64-bit value. Every `u64` is a structurally valid ID.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the wall-clock time this ID was minted at, in milliseconds
    /// since the Unix epoch, given the epoch its generator was configured
    /// with.
    pub fn unix_millis(&self, epoch: Duration) -> u64 {
        (epoch.as_millis() as u64).saturating_add(self.timestamp())
    }

    /// Returns true if the sequence can be incremented without wrapping.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented.
    pub fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.worker_id(), self.sequence() + 1)
    }

    /// Returns a new ID for a newer timestamp with the sequence reset to zero.
    pub fn rollover_to_timestamp(&self, ts: u64) -> Self {
        Self::from_components(ts, self.worker_id(), 0)
    }

    /// Returns the ID as a zero-padded 20-digit decimal string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }

    fn fields(&self) -> [FieldLayout; 3] {
        [
            FieldLayout {
                name: "timestamp",
                bits: Self::TIMESTAMP_BITS,
                value: self.timestamp(),
            },
            FieldLayout {
                name: "worker_id",
                bits: Self::WORKER_ID_BITS,
                value: self.worker_id(),
            },
            FieldLayout {
                name: "sequence",
                bits: Self::SEQUENCE_BITS,
                value: self.sequence(),
            },
        ]
    }
}

impl From<u64> for FlakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<FlakeId> for u64 {
    fn from(id: FlakeId) -> Self {
        id.to_raw()
    }
}

impl fmt::Display for FlakeId {
    /// Writes the URL-safe base64 transport form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; Self::TEXT_LEN];
        f.write_str(self.encode_to_buf(&mut buf))
    }
}

impl fmt::Debug for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; Self::TEXT_LEN];
        let text = self.encode_to_buf(&mut buf);
        write_bit_layout_debug(f, "FlakeId", self.id, text, &self.fields())
    }
}
