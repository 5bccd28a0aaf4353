use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Network kinds accepted by [`TcpTransport`](crate::TcpTransport) and
/// [`RpcStream::connect`](crate::RpcStream::connect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Tcp,
}

impl Network {
    /// Parse a network name. Only `"tcp"` is accepted.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "tcp" => Ok(Self::Tcp),
            other => Err(TransportError::UnsupportedNetwork(other.to_string())),
        }
    }

    /// Canonical name of this network.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
        }
    }
}

impl FromStr for Network {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn validate_addr(addr: &str) -> Result<()> {
    if addr.trim().is_empty() {
        return Err(TransportError::EmptyAddress);
    }
    Ok(())
}
