mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel, LogSettings};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "trpc", version, about = "Minimal RPC server and client")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). Defaults to info for serve, warn otherwise.
    #[arg(long, value_name = "LEVEL", env = "TRPC_LOG_LEVEL", global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(LogSettings::for_command(
        &cli.command,
        cli.log_format,
        cli.log_level,
    ));

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_subcommand() {
        let cli = Cli::try_parse_from([
            "trpc",
            "serve",
            "127.0.0.1:0",
            "--framing",
            "length-prefixed",
            "--call-timeout",
            "2s",
        ])
        .expect("serve args should parse");

        assert!(matches!(cli.command, Command::Serve(_)));
    }

    #[test]
    fn parses_call_subcommand() {
        let cli = Cli::try_parse_from([
            "trpc",
            "--format",
            "json",
            "call",
            "127.0.0.1:50051",
            "hello_service.Hello",
            "--json",
            r#"{"Name":"cli"}"#,
            "--timeout",
            "500ms",
        ])
        .expect("call args should parse");

        match cli.command {
            Command::Call(args) => {
                assert_eq!(args.method, "hello_service.Hello");
                assert_eq!(args.timeout, "500ms");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_framing() {
        let err = Cli::try_parse_from(["trpc", "serve", "127.0.0.1:0", "--framing", "udp"])
            .expect_err("unknown framing should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn log_level_is_global_and_optional() {
        let cli = Cli::try_parse_from(["trpc", "version", "--log-level", "debug"])
            .expect("global log level should parse after the subcommand");
        assert_eq!(cli.log_level, Some(LogLevel::Debug));

        let cli = Cli::try_parse_from(["trpc", "--log-level", "error", "serve", "127.0.0.1:0"])
            .expect("log level should parse before the subcommand");
        let settings = LogSettings::for_command(&cli.command, cli.log_format, cli.log_level);
        assert_eq!(settings.level, LogLevel::Error);
    }

    #[test]
    fn call_requires_method() {
        let err = Cli::try_parse_from(["trpc", "call", "127.0.0.1:50051"])
            .expect_err("missing method should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
