use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::warn;
use trpc_transport::RpcStream;

use crate::error::{CodecError, Result};
use crate::framing::{encode_frame, Framing};
use crate::reader::transport_to_codec_error;

/// Writes whole messages to any `Write` stream according to a [`Framing`].
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    framing: Framing,
}

impl<T: Write> MessageWriter<T> {
    /// Create a writer with the default (single-read) framing.
    pub fn new(inner: T) -> Self {
        Self::with_framing(inner, Framing::default())
    }

    /// Create a writer with explicit framing.
    pub fn with_framing(inner: T, framing: Framing) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            framing,
        }
    }

    /// Write one message (blocking).
    ///
    /// Under single-read framing an oversized payload is still written in
    /// full; the peer will only see its first `buffer_size` bytes.
    pub fn write_message(&mut self, payload: &[u8]) -> Result<()> {
        match self.framing {
            Framing::SingleRead { buffer_size } => {
                if payload.len() > buffer_size {
                    warn!(
                        size = payload.len(),
                        buffer_size, "message exceeds the single-read buffer and will be truncated"
                    );
                }
                write_all(&mut self.inner, payload)?;
            }
            Framing::LengthPrefixed { max_payload } => {
                if payload.len() > max_payload {
                    return Err(CodecError::PayloadTooLarge {
                        size: payload.len(),
                        max: max_payload,
                    });
                }
                self.buf.clear();
                encode_frame(payload, &mut self.buf)?;
                write_all(&mut self.inner, &self.buf)?;
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Framing in effect.
    pub fn framing(&self) -> Framing {
        self.framing
    }
}

// Timeouts (WouldBlock/TimedOut) are returned rather than retried so that
// a write deadline on the socket is honored.
fn write_all<W: Write>(inner: &mut W, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(CodecError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(CodecError::Io(err)),
        }
    }
    Ok(())
}

impl MessageWriter<RpcStream> {
    /// Create a writer for an `RpcStream` and apply a write timeout.
    pub fn for_stream(
        inner: RpcStream,
        framing: Framing,
        write_timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        framing.validate()?;
        inner
            .set_write_timeout(write_timeout)
            .map_err(transport_to_codec_error)?;
        Ok(Self::with_framing(inner, framing))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::framing::HEADER_SIZE;
    use crate::reader::MessageReader;

    #[test]
    fn single_read_writes_raw_payload() {
        let mut writer = MessageWriter::new(Vec::new());
        writer.write_message(b"{\"Msg\":\"hi\"}").unwrap();
        assert_eq!(writer.into_inner(), b"{\"Msg\":\"hi\"}");
    }

    #[test]
    fn single_read_writes_oversized_payload_in_full() {
        let payload = vec![b'a'; 4096];
        let mut writer = MessageWriter::new(Vec::new());
        writer.write_message(&payload).unwrap();
        assert_eq!(writer.into_inner().len(), 4096);
    }

    #[test]
    fn length_prefixed_adds_header() {
        let mut writer = MessageWriter::with_framing(Vec::new(), Framing::length_prefixed());
        writer.write_message(b"ping").unwrap();
        let wire = writer.into_inner();
        assert_eq!(wire.len(), HEADER_SIZE + 4);

        let mut reader = MessageReader::with_framing(Cursor::new(wire), Framing::length_prefixed());
        assert_eq!(reader.read_message().unwrap().as_ref(), b"ping");
    }

    #[test]
    fn length_prefixed_rejects_oversized_payload() {
        let framing = Framing::LengthPrefixed { max_payload: 8 };
        let mut writer = MessageWriter::with_framing(Vec::new(), framing);
        let err = writer.write_message(b"way too long").unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge { size: 12, max: 8 }));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn zero_write_is_connection_closed() {
        let mut writer = MessageWriter::new(ZeroWriter);
        assert!(matches!(
            writer.write_message(b"x"),
            Err(CodecError::ConnectionClosed)
        ));
    }

    #[test]
    fn write_timeout_is_not_retried() {
        let mut writer = MessageWriter::new(TimedOutWriter { attempts: 0 });
        let err = writer.write_message(b"x").unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(writer.get_ref().attempts, 1);
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = MessageWriter::new(left);
        let mut reader = MessageReader::new(right);

        writer.write_message(b"first").unwrap();
        assert_eq!(reader.read_message().unwrap().as_ref(), b"first");
        writer.write_message(b"second").unwrap();
        assert_eq!(reader.read_message().unwrap().as_ref(), b"second");
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct TimedOutWriter {
        attempts: usize,
    }

    impl Write for TimedOutWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
