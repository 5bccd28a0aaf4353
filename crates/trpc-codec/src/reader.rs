use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use trpc_transport::RpcStream;

use crate::error::{CodecError, Result};
use crate::framing::{decode_frame, Framing};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads whole messages from any `Read` stream according to a [`Framing`].
pub struct MessageReader<T> {
    inner: T,
    buf: BytesMut,
    framing: Framing,
}

impl<T: Read> MessageReader<T> {
    /// Create a reader with the default (single-read) framing.
    pub fn new(inner: T) -> Self {
        Self::with_framing(inner, Framing::default())
    }

    /// Create a reader with explicit framing.
    pub fn with_framing(inner: T, framing: Framing) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            framing,
        }
    }

    /// Read the next message (blocking).
    ///
    /// Returns `Err(CodecError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Bytes> {
        match self.framing {
            Framing::SingleRead { buffer_size } => self.read_single(buffer_size),
            Framing::LengthPrefixed { max_payload } => self.read_prefixed(max_payload),
        }
    }

    fn read_single(&mut self, buffer_size: usize) -> Result<Bytes> {
        self.buf.clear();
        self.buf.resize(buffer_size, 0);

        let read = loop {
            match self.inner.read(&mut self.buf[..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            }
        };

        if read == 0 {
            return Err(CodecError::ConnectionClosed);
        }

        self.buf.truncate(read);
        Ok(self.buf.split().freeze())
    }

    fn read_prefixed(&mut self, max_payload: usize) -> Result<Bytes> {
        loop {
            if let Some(payload) = decode_frame(&mut self.buf, max_payload)? {
                return Ok(payload);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            };

            if read == 0 {
                return Err(CodecError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Framing in effect.
    pub fn framing(&self) -> Framing {
        self.framing
    }
}

impl MessageReader<RpcStream> {
    /// Create a reader for an `RpcStream` and apply a read timeout.
    pub fn for_stream(
        inner: RpcStream,
        framing: Framing,
        read_timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        framing.validate()?;
        inner
            .set_read_timeout(read_timeout)
            .map_err(transport_to_codec_error)?;
        Ok(Self::with_framing(inner, framing))
    }
}

pub(crate) fn transport_to_codec_error(err: trpc_transport::TransportError) -> CodecError {
    match err {
        trpc_transport::TransportError::Io(io) | trpc_transport::TransportError::Accept(io) => {
            CodecError::Io(io)
        }
        trpc_transport::TransportError::Bind { source, .. }
        | trpc_transport::TransportError::Connect { source, .. } => CodecError::Io(source),
        other => CodecError::Io(std::io::Error::other(other.to_string())),
    }
}
