use std::io::{IsTerminal, Write};
use std::net::SocketAddr;
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ServingOutput<'a> {
    addr: String,
    framing: &'a str,
    services: &'a [String],
}

/// Announce a started server. Always flushed so scripts can read the address.
pub fn print_serving(addr: SocketAddr, framing: &str, services: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ServingOutput {
                addr: addr.to_string(),
                framing,
                services,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ADDRESS", "FRAMING", "SERVICES"])
                .add_row(vec![addr.to_string(), framing.to_string(), services.join(", ")]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "serving on {addr} framing={framing} services={}",
                services.join(",")
            );
        }
    }
    let _ = std::io::stdout().flush();
}

#[derive(Serialize)]
struct CallOutput<'a> {
    method: &'a str,
    elapsed_ms: u128,
    reply: &'a serde_json::Value,
}

pub fn print_reply(
    method: &str,
    elapsed: Duration,
    reply: &serde_json::Value,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = CallOutput {
                method,
                elapsed_ms: elapsed.as_millis(),
                reply,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["METHOD", "ELAPSED", "REPLY"])
                .add_row(vec![
                    method.to_string(),
                    format!("{}ms", elapsed.as_millis()),
                    reply.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let body = serde_json::to_string_pretty(reply).unwrap_or_else(|_| reply.to_string());
            println!("{body}");
        }
        OutputFormat::Raw => {
            print_raw(reply.to_string().as_bytes());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
