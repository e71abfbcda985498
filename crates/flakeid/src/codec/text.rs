use core::str::FromStr;

use base64::{Engine as _, engine::general_purpose::URL_SAFE};

use crate::{DecodeError, Error, FlakeId};

impl FlakeId {
    /// Length of the text form: 8 bytes of padded base64 is always 12
    /// characters, the last one being `=`.
    pub const TEXT_LEN: usize = 12;

    /// Encodes the ID as URL-safe, padded base64 of its big-endian bytes.
    ///
    /// # Example
    /// ```
    /// use flakeid::FlakeId;
    ///
    /// assert_eq!(FlakeId::from_raw(0).to_text(), "AAAAAAAAAAA=");
    /// assert_eq!(FlakeId::from_raw(42).to_text(), "AAAAAAAAACo=");
    /// ```
    pub fn to_text(&self) -> String {
        URL_SAFE.encode(self.to_bytes())
    }

    /// Encodes the ID into a caller-provided buffer without heap allocation
    /// and returns the encoded text as a view into that buffer.
    ///
    /// # Example
    /// ```
    /// use flakeid::FlakeId;
    ///
    /// let mut buf = [0u8; FlakeId::TEXT_LEN];
    /// let text = FlakeId::from_raw(42).encode_to_buf(&mut buf);
    /// assert_eq!(text, "AAAAAAAAACo=");
    /// ```
    pub fn encode_to_buf<'buf>(&self, buf: &'buf mut [u8; Self::TEXT_LEN]) -> &'buf str {
        // 8 input bytes always encode to exactly TEXT_LEN ascii bytes.
        let written = URL_SAFE
            .encode_slice(self.to_bytes(), buf)
            .unwrap_or_default();
        debug_assert_eq!(written, Self::TEXT_LEN);
        core::str::from_utf8(&buf[..written]).unwrap_or_default()
    }

    /// Decodes an ID from its URL-safe, padded base64 text form.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidBase64`] if the text is not canonical padded
    ///   URL-safe base64 (standard-alphabet `+` and `/` are rejected, as is
    ///   missing padding).
    /// - [`DecodeError::InvalidLen`] if the text decodes to anything other
    ///   than 8 bytes.
    ///
    /// # Example
    /// ```
    /// use flakeid::{DecodeError, FlakeId};
    ///
    /// assert_eq!(FlakeId::from_text("AAAAAAAAACo="), Ok(FlakeId::from_raw(42)));
    /// assert_eq!(FlakeId::from_text("AAAA"), Err(DecodeError::InvalidLen { len: 3 }));
    /// ```
    pub fn from_text(text: &str) -> Result<Self, DecodeError> {
        let bytes = URL_SAFE.decode(text)?;
        Self::from_bytes(&bytes)
    }
}

impl FromStr for FlakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_text(s)?)
    }
}
