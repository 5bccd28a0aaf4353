use std::time::Instant;

use trpc::peer::{Client, ClientConfig};
use trpc::service::CallContext;

use crate::cmd::{parse_duration, CallArgs};
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let request: serde_json::Value = serde_json::from_str(&args.json)
        .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;

    let config = ClientConfig::default()
        .with_framing(args.framing.framing()?)
        .with_connect_timeout(timeout);
    let mut client = Client::connect_with_config("tcp", &args.addr, config)
        .map_err(|err| client_error("connect failed", err))?;

    let ctx = CallContext::background().with_timeout(timeout);
    let started = Instant::now();
    let reply: serde_json::Value = client
        .invoke(&ctx, &args.method, &request)
        .map_err(|err| client_error("call failed", err))?;

    print_reply(&args.method, started.elapsed(), &reply, format);
    let _ = client.close();
    Ok(SUCCESS)
}
