//! Transport encodings for [`FlakeId`](crate::FlakeId): 8 big-endian bytes,
//! and URL-safe padded base64 of those bytes.
mod bytes;
mod text;
