//! The share block and its length-prefixed record.
//!
//! The engine speaks in 32-byte share blocks: a 16-byte field element
//! followed by its 16-byte MAC. A [`Parcel`] pairs a block (or a run of
//! blocks) with the 4-byte little-endian length header used on the wire and
//! the base64 form used by everything above the socket.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;

/// Size in bytes of one field element.
pub const FIELD_ELEMENT: usize = 16;

/// Size in bytes of one share block: field element followed by its MAC.
pub const SHARE_BLOCK: usize = 32;

/// Size in bytes of the little-endian length header on every frame.
pub const LEN_HEADER: usize = 4;

/// One decoded unit of an engine response.
///
/// # Invariants
///
/// - On the share path, `body.len()` is a positive multiple of
///   [`SHARE_BLOCK`] and `size == body.len()`.
/// - On the plaintext path, `body` holds the decimal rendering of the
///   recovered value and `size` carries the length of the whole response
///   payload the parcel was cut from. Consumers of that path read only
///   `body_base64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parcel {
    /// Length header value, little-endian on the wire.
    pub size: u32,

    /// Raw body bytes.
    pub body: Bytes,

    /// Base64 rendering of `body`.
    pub body_base64: String,
}

impl Parcel {
    /// Wrap one share block cut out of a response payload.
    #[must_use]
    pub fn share(chunk: &[u8]) -> Self {
        Self {
            size: chunk.len() as u32,
            body_base64: BASE64.encode(chunk),
            body: Bytes::copy_from_slice(chunk),
        }
    }

    /// Wrap one recovered plaintext value.
    ///
    /// `payload_len` is the length of the response payload the value was cut
    /// from, not the length of the decimal rendering.
    #[must_use]
    pub fn plaintext(payload_len: usize, decimal: String) -> Self {
        let body = Bytes::from(decimal.into_bytes());
        Self { size: payload_len as u32, body_base64: BASE64.encode(&body), body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_parcel_mirrors_chunk() {
        let chunk = [7u8; SHARE_BLOCK];
        let parcel = Parcel::share(&chunk);
        assert_eq!(parcel.size, 32);
        assert_eq!(parcel.body.as_ref(), &chunk);
        assert_eq!(parcel.body_base64, BASE64.encode(chunk));
    }

    #[test]
    fn plaintext_parcel_encodes_decimal() {
        let parcel = Parcel::plaintext(48, "111".to_string());
        assert_eq!(parcel.size, 48);
        assert_eq!(parcel.body_base64, "MTEx");
    }
}
