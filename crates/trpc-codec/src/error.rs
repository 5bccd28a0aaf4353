use crate::address::AddressError;

/// Errors that can occur while encoding, decoding or framing messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The method address is malformed. This is a caller bug, not a transient failure.
    #[error("invalid method address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// A value could not be serialized.
    #[error("failed to serialize value: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Bytes could not be decoded into the expected structure.
    #[error("failed to decode message: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x5452 \"TR\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The framing configuration cannot be used.
    #[error("invalid framing configuration: {0}")]
    InvalidFraming(String),

    /// An I/O error occurred while reading or writing messages.
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a message was received.
    #[error("connection closed")]
    ConnectionClosed,
}

impl CodecError {
    /// True when the error is a socket read/write timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CodecError::Io(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut
        )
    }

    /// True for errors caused by the caller rather than the peer or network.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, CodecError::InvalidAddress(_) | CodecError::Serialize(_))
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
