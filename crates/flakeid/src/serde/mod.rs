//! Structured-data support.
//!
//! [`FlakeId`] serializes as its URL-safe base64 text form by default, so a
//! JSON document carries `"AAAAAAAAACo="` rather than a number that some
//! consumers would round through a double. Use [`as_native`] on a field to
//! opt into the raw `u64` instead.
use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, FlakeId};

impl Serialize for FlakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut buf = [0u8; FlakeId::TEXT_LEN];
        s.serialize_str(self.encode_to_buf(&mut buf))
    }
}

struct TextVisitor;

impl Visitor<'_> for TextVisitor {
    type Value = FlakeId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a URL-safe base64 encoded flake id")
    }

    #[inline]
    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        FlakeId::from_text(v).map_err(|e| de::Error::custom(Error::MalformedInput(e)))
    }
}

impl<'de> Deserialize<'de> for FlakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_str(TextVisitor)
    }
}

/// Serialize a flake ID as its native `u64` representation.
///
/// ```
/// use flakeid::FlakeId;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Row {
///     #[serde(with = "flakeid::as_native")]
///     event_id: FlakeId,
/// }
/// ```
pub mod as_native {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::FlakeId;

    /// Serialize a flake ID as its raw integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &FlakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// Deserialize a flake ID from its raw integer. Every `u64` is a valid
    /// ID, so only the underlying deserializer can fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails.
    pub fn deserialize<'de, D>(d: D) -> Result<FlakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(d).map(FlakeId::from_raw)
    }
}
