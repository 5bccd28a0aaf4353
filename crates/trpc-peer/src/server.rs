use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};
use trpc_service::{Dispatcher, Service, ServiceRegistrar, ServiceRegistry};
use trpc_transport::{RpcStream, TcpTransport, TransportError};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::{Result, ServerError};

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Accepts connections and serves registered services on them.
///
/// Services are registered while the server is being set up; [`serve`]
/// freezes the registry and shares it read-only with every connection
/// thread.
///
/// [`serve`]: Server::serve
pub struct Server {
    transport: TcpTransport,
    registry: ServiceRegistry,
    config: ServerConfig,
    shared: Arc<Shared>,
}

impl Server {
    /// Bind `addr` on `network` with default config.
    ///
    /// Only `"tcp"` is supported. Port 0 picks an ephemeral port.
    pub fn bind(network: &str, addr: &str) -> Result<Self> {
        Self::bind_with_config(network, addr, ServerConfig::default())
    }

    /// Bind `addr` on `network` with explicit config.
    pub fn bind_with_config(network: &str, addr: &str, config: ServerConfig) -> Result<Self> {
        config.framing.validate()?;
        let transport = TcpTransport::bind(network, addr)?;
        let shared = Arc::new(Shared {
            local_addr: transport.local_addr(),
            shutdown: AtomicBool::new(false),
            connections: Mutex::new(HashMap::new()),
        });

        Ok(Self {
            transport,
            registry: ServiceRegistry::new(),
            config,
            shared,
        })
    }

    /// Register `service` under `name`, replacing any previous holder.
    pub fn register(&mut self, name: impl Into<String>, service: Service) -> Option<Service> {
        self.registry.register(name, service)
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bound address (with the real port when bound to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.shared.local_addr
    }

    /// A handle that can stop this server from another thread.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run the accept loop on the calling thread until shut down.
    ///
    /// Fails immediately with [`ServerError::NoServices`] when nothing is
    /// registered. Each accepted connection is served on its own thread;
    /// a failure on one connection never affects the others.
    pub fn serve(self) -> Result<()> {
        if self.registry.is_empty() {
            return Err(ServerError::NoServices);
        }

        let Server {
            transport,
            registry,
            config,
            shared,
        } = self;

        info!(
            addr = %shared.local_addr,
            services = ?registry.service_names(),
            framing = config.framing.name(),
            "server started"
        );

        let dispatcher = Dispatcher::new(Arc::new(registry));
        let config = Arc::new(config);
        let mut next_conn_id = 0u64;

        loop {
            let stream = match transport.accept() {
                Ok(stream) => stream,
                Err(_) if shared.is_shutdown() => break,
                Err(err) if is_transient(&err) => {
                    warn!(error = %err, "accept failed; continuing");
                    continue;
                }
                Err(err) => {
                    error!(error = %err, "accept failed; server stopping");
                    return Err(err.into());
                }
            };

            if shared.is_shutdown() {
                let _ = stream.shutdown();
                break;
            }

            next_conn_id += 1;
            spawn_connection(next_conn_id, stream, &dispatcher, &config, &shared);
        }

        info!(addr = %shared.local_addr, "server stopped");
        Ok(())
    }

    /// Run [`serve`](Server::serve) on a background thread.
    ///
    /// The empty-registry check happens before the thread starts.
    pub fn serve_in_background(self) -> Result<RunningServer> {
        if self.registry.is_empty() {
            return Err(ServerError::NoServices);
        }

        let handle = self.handle();
        let thread = thread::Builder::new()
            .name("trpc-server".to_string())
            .spawn(move || self.serve())
            .map_err(TransportError::Io)?;

        Ok(RunningServer { handle, thread })
    }
}

impl ServiceRegistrar for Server {
    fn register_service(&mut self, name: &str, service: Service) {
        self.register(name, service);
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.shared.local_addr)
            .field("services", &self.registry.service_names())
            .field("config", &self.config)
            .finish()
    }
}

fn spawn_connection(
    id: u64,
    stream: RpcStream,
    dispatcher: &Dispatcher,
    config: &Arc<ServerConfig>,
    shared: &Arc<Shared>,
) {
    let connection = stream
        .try_clone()
        .map_err(ServerError::from)
        .and_then(|tracked| {
            let conn = Connection::from_stream(id, stream, dispatcher.clone(), Arc::clone(config))?;
            Ok((tracked, conn))
        });
    let (tracked, connection) = match connection {
        Ok(parts) => parts,
        Err(err) => {
            warn!(conn_id = id, error = %err, "failed to set up connection");
            return;
        }
    };

    if !shared.track(id, tracked) {
        debug!(conn_id = id, "server shutting down; dropping new connection");
        return;
    }
    let guard = ConnectionGuard {
        id,
        shared: Arc::clone(shared),
    };

    let spawned = thread::Builder::new()
        .name(format!("trpc-conn-{id}"))
        .spawn(move || {
            let _guard = guard;
            connection.run();
        });
    if let Err(err) = spawned {
        // The closure (and with it the guard) is dropped, untracking the stream.
        warn!(conn_id = id, error = %err, "failed to spawn connection thread");
    }
}

fn is_transient(err: &TransportError) -> bool {
    match err {
        TransportError::Accept(io) => matches!(
            io.kind(),
            std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::Interrupted
                | std::io::ErrorKind::WouldBlock
        ),
        // Post-accept socket option failures only affect that connection.
        TransportError::Io(_) => true,
        _ => false,
    }
}

struct Shared {
    local_addr: SocketAddr,
    shutdown: AtomicBool,
    connections: Mutex<HashMap<u64, RpcStream>>,
}

impl Shared {
    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<u64, RpcStream>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a live stream unless shutdown has begun.
    ///
    /// The flag is read under the map lock, so a concurrent
    /// [`ServerHandle::shutdown`] either finds the entry or is seen here.
    /// A refused stream is shut down and `false` is returned.
    fn track(&self, id: u64, stream: RpcStream) -> bool {
        let mut connections = self.connections();
        if self.is_shutdown() {
            let _ = stream.shutdown();
            return false;
        }
        connections.insert(id, stream);
        true
    }

    fn untrack(&self, id: u64) {
        self.connections().remove(&id);
    }
}

/// Removes a connection from the live set when its thread ends, panics included.
struct ConnectionGuard {
    id: u64,
    shared: Arc<Shared>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.shared.untrack(self.id);
    }
}

/// Cloneable remote control for a [`Server`].
#[derive(Clone)]
pub struct ServerHandle {
    shared: Arc<Shared>,
}

impl ServerHandle {
    /// Stop accepting and close every live connection.
    ///
    /// Idempotent. In-flight calls are cut off; their clients see the
    /// connection close.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(addr = %self.shared.local_addr, "server shutting down");

        // Unblock the accept loop.
        let wake = wake_addr(self.shared.local_addr).to_string();
        if let Err(err) = RpcStream::connect("tcp", &wake, Some(WAKE_TIMEOUT)) {
            debug!(error = %err, "wake-up connect failed");
        }

        for (id, stream) in self.shared.connections().iter() {
            if let Err(err) = stream.shutdown() {
                debug!(conn_id = id, error = %err, "connection shutdown failed");
            }
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.shared.connections().len()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.shared.local_addr
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("local_addr", &self.shared.local_addr)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

/// A server running on its own thread.
#[derive(Debug)]
pub struct RunningServer {
    handle: ServerHandle,
    thread: JoinHandle<Result<()>>,
}

impl RunningServer {
    pub fn handle(&self) -> &ServerHandle {
        &self.handle
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    /// Wait for the serve loop to finish.
    pub fn join(self) -> Result<()> {
        self.thread.join().map_err(|_| ServerError::Panicked)?
    }

    /// Shut down and wait for the serve loop to finish.
    pub fn shutdown(self) -> Result<()> {
        self.handle.shutdown();
        self.join()
    }
}

// An unspecified bind address is not dialable; use loopback of the same family.
fn wake_addr(mut addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        match addr {
            SocketAddr::V4(_) => addr.set_ip(Ipv4Addr::LOCALHOST.into()),
            SocketAddr::V6(_) => addr.set_ip(Ipv6Addr::LOCALHOST.into()),
        }
    }
    addr
}
