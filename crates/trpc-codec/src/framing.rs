use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};

/// Historical single-read buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Default maximum payload size for length-prefixed framing: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Length-prefixed header: magic (2) + length (4) = 6 bytes.
pub const HEADER_SIZE: usize = 6;

/// Magic bytes: "TR" (0x54 0x52).
pub const MAGIC: [u8; 2] = [0x54, 0x52];

/// How messages are delimited on a stream.
///
/// Both ends of a connection must use the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One read call per message, at most `buffer_size` bytes.
    ///
    /// There is no delimiter: a message must arrive in a single read and fit
    /// in the buffer. Longer messages are cut at `buffer_size` and the rest is
    /// left on the stream, which normally shows up as a decode failure.
    SingleRead { buffer_size: usize },

    /// Header + payload; partial reads are reassembled.
    ///
    /// Wire format:
    /// ```text
    /// ┌──────────────┬───────────┬─────────────────┐
    /// │ Magic (2B)   │ Length    │ Payload          │
    /// │ 0x54 0x52    │ (4B LE)   │ (Length bytes)   │
    /// │ "TR"         │           │                  │
    /// └──────────────┴───────────┴─────────────────┘
    /// ```
    LengthPrefixed { max_payload: usize },
}

impl Framing {
    /// Single-read framing with the historical 1024-byte buffer.
    pub const fn single_read() -> Self {
        Self::SingleRead {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Length-prefixed framing with the default payload cap.
    pub const fn length_prefixed() -> Self {
        Self::LengthPrefixed {
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Reject configurations that could never carry a message.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::SingleRead { buffer_size: 0 } => Err(CodecError::InvalidFraming(
                "single-read buffer size must be greater than zero".to_string(),
            )),
            Self::LengthPrefixed { max_payload } if max_payload > u32::MAX as usize => {
                Err(CodecError::InvalidFraming(format!(
                    "max payload {max_payload} exceeds the 32-bit length field"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleRead { .. } => "single-read",
            Self::LengthPrefixed { .. } => "length-prefixed",
        }
    }
}

impl Default for Framing {
    fn default() -> Self {
        Self::single_read()
    }
}

/// Encode a length-prefixed frame.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(CodecError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Decode a length-prefixed frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(CodecError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    if payload_len > max_payload {
        return Err(CodecError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_frame() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello, trpc!", &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + 12);

        let payload = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(payload.as_ref(), b"hello, trpc!");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x54, 0x52, 0x00][..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(CodecError::InvalidMagic)));
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(1024 * 1024 * 32);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(CodecError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"", &mut buf).unwrap();
        encode_frame(b"third", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        let f3 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f1.as_ref(), b"first");
        assert!(f2.is_empty());
        assert_eq!(f3.as_ref(), b"third");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_framing_defaults_and_validation() {
        assert_eq!(
            Framing::default(),
            Framing::SingleRead { buffer_size: 1024 }
        );
        assert!(Framing::default().validate().is_ok());
        assert!(Framing::length_prefixed().validate().is_ok());
        assert!(matches!(
            Framing::SingleRead { buffer_size: 0 }.validate(),
            Err(CodecError::InvalidFraming(_))
        ));
    }
}
