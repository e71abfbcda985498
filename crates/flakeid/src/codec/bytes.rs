use crate::{DecodeError, FlakeId};

impl FlakeId {
    /// Size of the big-endian byte form.
    pub const BYTES_LEN: usize = core::mem::size_of::<u64>();

    /// Encodes the ID as 8 big-endian bytes (most significant byte first).
    pub const fn to_bytes(&self) -> [u8; Self::BYTES_LEN] {
        self.to_raw().to_be_bytes()
    }

    /// Decodes an ID from exactly 8 big-endian bytes.
    pub const fn from_byte_array(bytes: [u8; Self::BYTES_LEN]) -> Self {
        Self::from_raw(u64::from_be_bytes(bytes))
    }

    /// Decodes an ID from a big-endian byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidLen`] if the slice is not exactly 8 bytes
    /// long.
    ///
    /// # Example
    /// ```
    /// use flakeid::FlakeId;
    ///
    /// let id = FlakeId::from(1_000, 123, 0);
    /// assert_eq!(FlakeId::from_bytes(&id.to_bytes()), Ok(id));
    /// assert!(FlakeId::from_bytes(&[0u8; 7]).is_err());
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let array: [u8; Self::BYTES_LEN] = bytes
            .try_into()
            .map_err(|_| DecodeError::InvalidLen { len: bytes.len() })?;
        Ok(Self::from_byte_array(array))
    }
}

impl TryFrom<&[u8]> for FlakeId {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl From<[u8; FlakeId::BYTES_LEN]> for FlakeId {
    fn from(bytes: [u8; FlakeId::BYTES_LEN]) -> Self {
        Self::from_byte_array(bytes)
    }
}
