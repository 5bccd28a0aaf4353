use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::network::{validate_addr, Network};

/// A connected RPC stream implementing `Read + Write`.
///
/// This is the fundamental I/O type returned by transport operations.
/// It wraps a TCP stream; nothing above this layer touches sockets directly.
pub struct RpcStream {
    inner: TcpStream,
}

impl Read for RpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for RpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl RpcStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Dial `addr` on `network` (blocking).
    ///
    /// With `connect_timeout` set, every resolved address is tried with that
    /// bound; otherwise the OS default applies.
    pub fn connect(network: &str, addr: &str, connect_timeout: Option<Duration>) -> Result<Self> {
        Network::parse(network)?;
        validate_addr(addr)?;

        let stream = match connect_timeout {
            None => TcpStream::connect(addr).map_err(|e| connect_error(addr, e))?,
            Some(timeout) => connect_each(addr, timeout)?,
        };
        // Requests are small and latency-bound.
        stream.set_nodelay(true)?;

        debug!(addr, "connected to tcp endpoint");
        Ok(Self::from_tcp(stream))
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_tcp(cloned))
    }

    /// Address of the remote end.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Address of the local end.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }

    /// Shut down both halves of the connection.
    ///
    /// Unblocks any thread parked in a read on a clone of this stream.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Already torn down by the peer.
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn connect_each(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let resolved = addr.to_socket_addrs().map_err(|e| connect_error(addr, e))?;

    let mut last_err = None;
    for candidate in resolved {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }

    Err(connect_error(
        addr,
        last_err.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "address resolved to no endpoints",
            )
        }),
    ))
}

fn connect_error(addr: &str, source: std::io::Error) -> TransportError {
    TransportError::Connect {
        addr: addr.to_string(),
        source,
    }
}

impl std::fmt::Debug for RpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcStream")
            .field("type", &"tcp")
            .field("peer", &self.inner.peer_addr().ok())
            .finish()
    }
}
