use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use trpc_codec::{
    decode_reply, encode_envelope, CodecError, Envelope, Framing, MessageReader, MessageWriter,
    MethodAddress,
};
use trpc_service::CallContext;
use trpc_transport::RpcStream;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// How long a blocked reply read waits before re-checking for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A connection to a trpc server that performs blocking calls.
///
/// Calls take `&mut self`, so one client never has two calls in flight.
/// Share a server between threads by giving each thread its own client.
pub struct Client {
    reader: MessageReader<RpcStream>,
    writer: MessageWriter<RpcStream>,
    peer_addr: SocketAddr,
    poisoned: bool,
}

impl Client {
    /// Dial `addr` on `network` with default config.
    pub fn connect(network: &str, addr: &str) -> Result<Self, ClientError> {
        Self::connect_with_config(network, addr, ClientConfig::default())
    }

    /// Dial `addr` on `network` with explicit config.
    pub fn connect_with_config(
        network: &str,
        addr: &str,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        config.framing.validate()?;
        let stream = RpcStream::connect(network, addr, config.connect_timeout)?;
        let peer_addr = stream.peer_addr()?;
        let reader_stream = stream.try_clone()?;

        let reader = MessageReader::for_stream(reader_stream, config.framing, None)?;
        let writer = MessageWriter::for_stream(stream, config.framing, None)?;

        debug!(%peer_addr, framing = config.framing.name(), "client connected");
        Ok(Self {
            reader,
            writer,
            peer_addr,
            poisoned: false,
        })
    }

    /// Call `method_address` (`"<service>.<method>"`) with `request` and
    /// decode the reply.
    ///
    /// Address and request problems are reported before anything is sent.
    /// The context's deadline bounds the whole exchange, and cancelling it
    /// from another thread abandons a pending reply.
    pub fn invoke<Req, Resp>(
        &mut self,
        ctx: &CallContext,
        method_address: &str,
        request: &Req,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let envelope = prepare_call(method_address, request)?;
        if self.poisoned {
            return Err(ClientError::Poisoned);
        }
        let budget = ctx.remaining().unwrap_or_default();
        ctx.check()
            .map_err(|err| ClientError::from_context(err, budget))?;

        let wire = encode_envelope(&envelope)?;
        self.send(ctx, budget, &wire)?;

        let reply = match self.receive(ctx, budget) {
            Ok(reply) => reply,
            Err(err) => {
                self.poisoned = true;
                return Err(err);
            }
        };

        decode_reply(&reply).map_err(|err| {
            // A reply that does not decode may be a prefix of a larger one.
            self.poisoned = true;
            ClientError::Codec(err)
        })
    }

    /// Like [`invoke`](Client::invoke), but stores the result in `reply`.
    ///
    /// On failure `reply` is left untouched.
    pub fn invoke_into<Req, Resp>(
        &mut self,
        ctx: &CallContext,
        method_address: &str,
        request: &Req,
        reply: &mut Resp,
    ) -> Result<(), ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        *reply = self.invoke(ctx, method_address, request)?;
        Ok(())
    }

    /// Address of the server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Local address of this connection.
    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.writer.get_ref().local_addr()?)
    }

    pub fn framing(&self) -> Framing {
        self.writer.framing()
    }

    /// True once a call has failed in a way that leaves the stream unusable.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Close the connection.
    pub fn close(self) -> Result<(), ClientError> {
        self.writer.get_ref().shutdown()?;
        debug!(peer_addr = %self.peer_addr, "client closed");
        Ok(())
    }

    fn send(&mut self, ctx: &CallContext, budget: Duration, wire: &[u8]) -> Result<(), ClientError> {
        let timeout = ctx.remaining();
        if timeout == Some(Duration::ZERO) {
            return Err(ClientError::Timeout(budget));
        }
        self.writer.get_ref().set_write_timeout(timeout)?;

        self.writer.write_message(wire).map_err(|err| {
            // A partial write leaves garbage in front of the next request.
            self.poisoned = true;
            map_io_error(err, budget)
        })
    }

    fn receive(&mut self, ctx: &CallContext, budget: Duration) -> Result<Bytes, ClientError> {
        loop {
            let slice = match ctx.remaining() {
                Some(remaining) if remaining.is_zero() => {
                    return Err(ClientError::Timeout(budget));
                }
                Some(remaining) => remaining.min(CANCEL_POLL_INTERVAL),
                None => CANCEL_POLL_INTERVAL,
            };
            self.reader.get_ref().set_read_timeout(Some(slice))?;

            match self.reader.read_message() {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_timeout() => {
                    ctx.check()
                        .map_err(|err| ClientError::from_context(err, budget))?;
                }
                Err(err) => return Err(map_io_error(err, budget)),
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("peer_addr", &self.peer_addr)
            .field("framing", &self.writer.framing())
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

/// Validate the address and request and build the envelope.
fn prepare_call<Req: Serialize + ?Sized>(
    method_address: &str,
    request: &Req,
) -> Result<Envelope, ClientError> {
    let address = MethodAddress::parse(method_address).map_err(|err| {
        warn!(method_address, error = %err, "rejected malformed method address");
        err
    })?;

    let envelope = Envelope::for_address(&address, request)?;
    if envelope.args.as_ref() == b"null" {
        return Err(ClientError::EmptyRequest);
    }
    Ok(envelope)
}

fn map_io_error(err: CodecError, budget: Duration) -> ClientError {
    match err {
        CodecError::ConnectionClosed => ClientError::ConnectionClosed,
        err if err.is_timeout() => ClientError::Timeout(budget),
        CodecError::Io(io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ) =>
        {
            ClientError::ConnectionClosed
        }
        err => ClientError::Codec(err),
    }
}
