/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `flakeid` can produce.
///
/// Every error is returned to the immediate caller and leaves generator state
/// untouched: a failed construction yields no generator and a failed decode
/// mutates nothing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The worker ID does not fit in the 10-bit worker field.
    #[error("worker id must be between 0 and {max}, got {worker_id}")]
    InvalidWorkerId {
        /// The rejected worker ID.
        worker_id: u64,
        /// The largest accepted worker ID.
        max: u64,
    },

    /// The configured epoch is later than the current time, which would make
    /// the timestamp field negative.
    #[error("epoch {epoch_ms} ms is in the future (now is {now_ms} ms)")]
    EpochInFuture {
        /// The requested epoch in milliseconds since the Unix epoch.
        epoch_ms: u64,
        /// The clock reading at construction.
        now_ms: u64,
    },

    /// Bytes or text did not match the fixed-width transport format.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] DecodeError),

    /// No worker ID could be derived from the host's network address.
    #[error("worker id discovery failed: {reason}")]
    WorkerDiscovery {
        /// What went wrong while probing the local address.
        reason: String,
    },
}

/// Errors that can occur while decoding the byte or text form of a
/// [`FlakeId`].
///
/// [`FlakeId`]: crate::FlakeId
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The input (or the bytes it decoded to) is not exactly 8 bytes long.
    #[error("invalid length: expected 8 bytes, got {len}")]
    InvalidLen {
        /// The length that was found.
        len: usize,
    },

    /// The text is not valid padded URL-safe base64.
    #[error("invalid base64: {reason}")]
    InvalidBase64 {
        /// The message reported by the base64 decoder.
        reason: String,
    },
}

impl From<base64::DecodeError> for DecodeError {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidBase64 {
            reason: err.to_string(),
        }
    }
}
