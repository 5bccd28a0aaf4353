use std::net::{SocketAddr, TcpListener};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::network::{validate_addr, Network};
use crate::stream::RpcStream;

/// TCP listening transport.
///
/// Provides bind/accept over a TCP listener. Binding to port 0 picks an
/// ephemeral port; use [`TcpTransport::local_addr`] to find it.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr`.
    ///
    /// Fails with [`TransportError::UnsupportedNetwork`] for anything but
    /// `"tcp"` and with [`TransportError::EmptyAddress`] for a blank address,
    /// before touching the network.
    pub fn bind(network: &str, addr: &str) -> Result<Self> {
        Network::parse(network)?;
        validate_addr(addr)?;

        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<RpcStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok(RpcStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}
