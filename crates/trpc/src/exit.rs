use std::fmt;
use std::io;

use trpc_codec::CodecError;
use trpc_peer::{ClientError, ServerError};
use trpc_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::UnsupportedNetwork(_) | TransportError::EmptyAddress => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::Io(source) => io_error(context, source),
        CodecError::InvalidAddress(_) | CodecError::InvalidFraming(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        CodecError::Serialize(_)
        | CodecError::Deserialize(_)
        | CodecError::InvalidMagic
        | CodecError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        CodecError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn server_error(context: &str, err: ServerError) -> CliError {
    match err {
        ServerError::Transport(err) => transport_error(context, err),
        ServerError::Codec(err) => codec_error(context, err),
        ServerError::NoServices => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Codec(err) => codec_error(context, err),
        ClientError::InvalidAddress(_) | ClientError::EmptyRequest => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        ClientError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ClientError::ConnectionClosed | ClientError::Cancelled | ClientError::Poisoned => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use trpc_codec::AddressError;

    use super::*;

    #[test]
    fn client_errors_map_to_exit_codes() {
        let cases = [
            (ClientError::InvalidAddress(AddressError::Empty), USAGE),
            (ClientError::EmptyRequest, USAGE),
            (ClientError::Timeout(Duration::from_secs(1)), TIMEOUT),
            (ClientError::ConnectionClosed, FAILURE),
            (
                ClientError::Transport(TransportError::Connect {
                    addr: "127.0.0.1:1".to_string(),
                    source: io::ErrorKind::ConnectionRefused.into(),
                }),
                TRANSPORT_ERROR,
            ),
            (
                ClientError::Codec(CodecError::PayloadTooLarge { size: 10, max: 1 }),
                DATA_INVALID,
            ),
        ];
        for (err, code) in cases {
            let message = err.to_string();
            let mapped = client_error("call failed", err);
            assert_eq!(mapped.code, code, "{message}");
            assert!(mapped.message.starts_with("call failed: "));
        }
    }

    #[test]
    fn server_errors_map_to_exit_codes() {
        assert_eq!(server_error("serve", ServerError::NoServices).code, USAGE);
        assert_eq!(
            server_error(
                "bind",
                ServerError::Transport(TransportError::UnsupportedNetwork("udp".into()))
            )
            .code,
            USAGE
        );
        assert_eq!(server_error("serve", ServerError::Panicked).code, INTERNAL);
    }
}
