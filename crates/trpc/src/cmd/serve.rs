use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use trpc::peer::{Server, ServerConfig, ServerHandle};
use trpc::services::hello::{register_hello_server, Greeter};
use trpc::services::user::{register_user_server, UserDirectory};

use crate::cmd::{normalize_listen_addr, parse_duration, ServeArgs};
use crate::exit::{server_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_serving, OutputFormat};

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = server_config(&args)?;
    let framing = config.framing;
    let addr = normalize_listen_addr(&args.addr);

    let mut server = Server::bind_with_config("tcp", &addr, config)
        .map_err(|err| server_error("bind failed", err))?;
    register_hello_server(&mut server, Greeter);
    register_user_server(&mut server, UserDirectory::sample());

    let services: Vec<String> = server
        .registry()
        .service_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let running = server
        .serve_in_background()
        .map_err(|err| server_error("serve failed", err))?;
    install_ctrlc_handler(running.handle().clone())?;

    print_serving(running.local_addr(), framing.name(), &services, format);

    running
        .join()
        .map_err(|err| server_error("serve failed", err))?;
    info!("bye");
    Ok(SUCCESS)
}

fn server_config(args: &ServeArgs) -> CliResult<ServerConfig> {
    let mut config = ServerConfig::default().with_framing(args.framing.framing()?);
    if let Some(timeout) = &args.call_timeout {
        config = config.with_call_timeout(parse_duration(timeout)?);
    }
    if let Some(timeout) = &args.idle_timeout {
        config = config.with_read_timeout(parse_duration(timeout)?);
    }
    Ok(config)
}

fn install_ctrlc_handler(handle: ServerHandle) -> CliResult<()> {
    let signalled = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler(move || {
        if !signalled.swap(true, Ordering::SeqCst) {
            info!("interrupt received, shutting down");
        }
        handle.shutdown();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
