//! Framing between base64 share blobs and the engine's binary frames.
//!
//! Layout on the wire, both directions:
//!
//! ```text
//! [length: u32 LE] + [payload: variable bytes]
//! ```
//!
//! Outbound, the length is the total payload size and the payload is a
//! concatenation of 32-byte share blocks. Inbound, the length is the size of
//! one result chunk (16 for plaintext output, 32 for share output) and the
//! payload is `N >= 1` such chunks back to back.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::BufMut;

use crate::{
    decoder::ResponseDecoder,
    errors::{ProtocolError, Result},
    parcel::{LEN_HEADER, SHARE_BLOCK},
};

/// Encode a list of base64 share blobs into one outbound frame.
///
/// Each blob must decode to a positive multiple of [`SHARE_BLOCK`] bytes; the
/// bodies are concatenated behind a single little-endian length header.
///
/// # Errors
///
/// - `ProtocolError::BadInput` if the list is empty, a blob is not valid
///   base64, or the total payload exceeds the `u32` length header.
/// - `ProtocolError::BadBodySize` if a decoded blob is empty or not a
///   multiple of 32 bytes.
pub fn encode_shares<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<u8>> {
    if inputs.is_empty() {
        return Err(ProtocolError::BadInput("no shares to encode".to_string()));
    }

    let mut bodies = Vec::with_capacity(inputs.len());
    let mut total: usize = 0;
    for input in inputs {
        let body = BASE64
            .decode(input.as_ref())
            .map_err(|e| ProtocolError::BadInput(format!("share is not valid base64: {e}")))?;
        if body.is_empty() || body.len() % SHARE_BLOCK != 0 {
            return Err(ProtocolError::BadBodySize {
                expected: SHARE_BLOCK,
                received: body.len(),
            });
        }
        total += body.len();
        bodies.push(body);
    }

    let header = u32::try_from(total)
        .map_err(|_| ProtocolError::BadInput(format!("payload of {total} bytes exceeds frame limit")))?;

    let mut frame = Vec::with_capacity(LEN_HEADER + total);
    frame.put_u32_le(header);
    for body in &bodies {
        frame.put_slice(body);
    }

    Ok(frame)
}

/// Decode one inbound result frame.
///
/// Reads the chunk-size header, validates that the payload is a positive
/// multiple of it, and hands the payload to the decoder. With
/// `aggregate = true` all parcel bodies are concatenated and returned as a
/// single base64 string; otherwise each parcel's base64 body is returned.
///
/// # Errors
///
/// - `ProtocolError::BadInput` if the frame is shorter than its length
///   header.
/// - `ProtocolError::BadBodySize` if the payload is empty or not a multiple
///   of the declared chunk size.
/// - Any error produced by the decoder itself.
pub fn decode_frame(
    frame: &[u8],
    decoder: &ResponseDecoder,
    aggregate: bool,
) -> Result<Vec<String>> {
    let Some((header, payload)) = frame.split_at_checked(LEN_HEADER) else {
        return Err(ProtocolError::BadInput(format!(
            "frame of {} bytes is shorter than its length header",
            frame.len()
        )));
    };

    // INVARIANT: split_at_checked returned exactly LEN_HEADER bytes.
    let mut size = [0u8; LEN_HEADER];
    size.copy_from_slice(header);
    let chunk_size = u32::from_le_bytes(size) as usize;

    if chunk_size == 0 || payload.is_empty() || payload.len() % chunk_size != 0 {
        return Err(ProtocolError::BadBodySize {
            expected: chunk_size.max(1),
            received: payload.len(),
        });
    }

    let parcels = decoder.convert(payload)?;

    if aggregate {
        let mut combined = Vec::with_capacity(payload.len());
        for parcel in &parcels {
            combined.extend_from_slice(&parcel.body);
        }
        Ok(vec![BASE64.encode(combined)])
    } else {
        Ok(parcels.into_iter().map(|p| p.body_base64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARE: &str = "Uy/n5w2DhibCfNnMnHdpEF7NPX5C6WD0nYsqOik+0gM=";

    #[test]
    fn encode_single_share() {
        let frame = encode_shares(&[SHARE]).unwrap();
        assert_eq!(frame.len(), 36);
        assert_eq!(&frame[..4], &[0x20, 0x00, 0x00, 0x00]);
        assert_eq!(
            hex::encode(&frame[4..]),
            "532fe7e70d838626c27cd9cc9c7769105ecd3d7e42e960f49d8b2a3a293ed203"
        );
    }

    #[test]
    fn encode_rejects_empty_list() {
        let inputs: [&str; 0] = [];
        assert!(matches!(encode_shares(&inputs), Err(ProtocolError::BadInput(_))));
    }

    #[test]
    fn encode_rejects_garbage_base64() {
        assert!(matches!(encode_shares(&["not base64!"]), Err(ProtocolError::BadInput(_))));
    }

    #[test]
    fn encode_rejects_short_body() {
        let blob = BASE64.encode([1u8; 16]);
        assert!(matches!(
            encode_shares(&[blob]),
            Err(ProtocolError::BadBodySize { expected: 32, received: 16 })
        ));
    }

    #[test]
    fn decode_rejects_truncated_frame() {
        let err = decode_frame(&[0x20, 0x00], &ResponseDecoder::Share, false).unwrap_err();
        assert!(matches!(err, ProtocolError::BadInput(_)));
    }

    #[test]
    fn decode_rejects_ragged_payload() {
        let mut frame = vec![0x20, 0x00, 0x00, 0x00];
        frame.extend_from_slice(&[0u8; 33]);
        assert!(matches!(
            decode_frame(&frame, &ResponseDecoder::Share, false),
            Err(ProtocolError::BadBodySize { .. })
        ));
    }

    #[test]
    fn decode_rejects_zero_chunk_size() {
        let mut frame = vec![0, 0, 0, 0];
        frame.extend_from_slice(&[0u8; 32]);
        assert!(matches!(
            decode_frame(&frame, &ResponseDecoder::Share, false),
            Err(ProtocolError::BadBodySize { .. })
        ));
    }

    #[test]
    fn decode_splits_share_chunks() {
        let mut frame = vec![0x20, 0x00, 0x00, 0x00];
        frame.extend_from_slice(&[1u8; 32]);
        frame.extend_from_slice(&[2u8; 32]);
        let out = decode_frame(&frame, &ResponseDecoder::Share, false).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], BASE64.encode([1u8; 32]));
        assert_eq!(out[1], BASE64.encode([2u8; 32]));
    }

    #[test]
    fn decode_aggregate_concatenates_bodies() {
        let mut frame = vec![0x20, 0x00, 0x00, 0x00];
        frame.extend_from_slice(&[1u8; 32]);
        frame.extend_from_slice(&[2u8; 32]);
        let out = decode_frame(&frame, &ResponseDecoder::Share, true).unwrap();
        assert_eq!(out.len(), 1);
        let mut expected = vec![1u8; 32];
        expected.extend_from_slice(&[2u8; 32]);
        assert_eq!(out[0], BASE64.encode(expected));
    }
}
