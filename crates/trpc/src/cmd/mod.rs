use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use trpc_codec::{Framing, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_PAYLOAD};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the built-in hello and user services.
    Serve(ServeArgs),
    /// Invoke one method and print the reply.
    Call(CallArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Call(args) => call::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FramingMode {
    /// One bounded read per message (the classic wire behavior).
    SingleRead,
    /// `TR` magic plus a 4-byte length before every message.
    LengthPrefixed,
}

#[derive(Args, Debug)]
pub struct FramingArgs {
    /// Message framing; client and server must agree.
    #[arg(long, value_name = "MODE", default_value = "single-read")]
    pub framing: FramingMode,
    /// Read buffer size for single-read framing.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: usize,
    /// Largest accepted payload for length-prefixed framing.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
}

impl FramingArgs {
    pub fn framing(&self) -> CliResult<Framing> {
        let framing = match self.framing {
            FramingMode::SingleRead => Framing::SingleRead {
                buffer_size: self.buffer_size,
            },
            FramingMode::LengthPrefixed => Framing::LengthPrefixed {
                max_payload: self.max_payload,
            },
        };
        framing
            .validate()
            .map_err(|err| CliError::new(USAGE, err.to_string()))?;
        Ok(framing)
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (e.g. 127.0.0.1:50051, :50051).
    pub addr: String,
    #[command(flatten)]
    pub framing: FramingArgs,
    /// Deadline given to each call (e.g. 5s, 500ms).
    #[arg(long)]
    pub call_timeout: Option<String>,
    /// Close connections idle for this long.
    #[arg(long)]
    pub idle_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Server address.
    pub addr: String,
    /// Method address, `<service>.<method>`.
    pub method: String,
    /// JSON request body.
    #[arg(long, default_value = "{}")]
    pub json: String,
    /// Call deadline, also used as the connect timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `150ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Go-style `:port` means every interface.
pub fn normalize_listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}
