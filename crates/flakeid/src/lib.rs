//! Compact, sortable, 64-bit flake IDs.
//!
//! A [`FlakeId`] packs a 41-bit millisecond timestamp (relative to a
//! configurable epoch), a 10-bit worker ID and a 13-bit per-millisecond
//! sequence into a single `u64`. A [`FlakeGenerator`] mints them without any
//! coordination: each instance owns its worker ID and guarantees a strictly
//! increasing stream, even under contention or when the clock steps back.
//!
//! ```
//! use flakeid::{FlakeGenerator, FlakeId};
//! use std::time::Duration;
//!
//! let generator = FlakeGenerator::new(123, Duration::ZERO)?;
//! let id = generator.next_id();
//!
//! // Transport forms: 8 big-endian bytes, or URL-safe base64 of them.
//! let text = id.to_text();
//! assert_eq!(FlakeId::from_text(&text)?, id);
//! assert_eq!(FlakeId::from_bytes(&id.to_bytes())?, id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Feature flags
//!
//! - `serde`: text-form `Serialize`/`Deserialize` for [`FlakeId`], plus the
//!   `as_native` field adapter.
//! - `tracing`: spans on minting and events on clock waits.
//! - `async-tokio`: `FlakeGeneratorAsyncExt` for minting from async tasks.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod codec;
mod error;
mod generator;
mod id;
#[cfg(feature = "async-tokio")]
mod runtime;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
#[cfg_attr(docsrs, doc(cfg(feature = "async-tokio")))]
#[cfg(feature = "async-tokio")]
pub use crate::runtime::*;
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
#[cfg(feature = "serde")]
pub use crate::serde::*;
pub use crate::time::*;
