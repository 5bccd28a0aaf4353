use std::net::SocketAddr;
use std::time::Duration;

use trpc_codec::Framing;
use trpc_service::CallContext;

/// Server behavior.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Message framing; clients must use the same.
    pub framing: Framing,
    /// Idle read timeout per connection. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Write timeout per reply.
    pub write_timeout: Option<Duration>,
    /// Deadline given to each call's [`CallContext`].
    pub call_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Fresh context for one call from `peer`.
    pub(crate) fn call_context(&self, peer: Option<SocketAddr>) -> CallContext {
        let mut ctx = CallContext::background();
        if let Some(timeout) = self.call_timeout {
            ctx = ctx.with_timeout(timeout);
        }
        if let Some(peer) = peer {
            ctx = ctx.with_peer_addr(peer);
        }
        ctx
    }
}

/// Client behavior.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Message framing; must match the server.
    pub framing: Framing,
    /// Bound on the initial dial. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_historical_behavior() {
        let server = ServerConfig::default();
        assert_eq!(server.framing, Framing::SingleRead { buffer_size: 1024 });
        assert!(server.read_timeout.is_none());
        assert!(server.call_timeout.is_none());

        let client = ClientConfig::default();
        assert_eq!(client.framing, Framing::SingleRead { buffer_size: 1024 });
        assert!(client.connect_timeout.is_none());
    }

    #[test]
    fn call_context_carries_timeout_and_peer() {
        let peer: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::default().with_call_timeout(Duration::from_secs(5));

        let ctx = config.call_context(Some(peer));
        assert_eq!(ctx.peer_addr(), Some(peer));
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(5));

        let bare = ServerConfig::default().call_context(None);
        assert!(bare.deadline().is_none());
        assert!(bare.peer_addr().is_none());
    }
}
