use std::io::{Read, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};
use trpc_codec::{decode_envelope, CodecError, MessageReader, MessageWriter};
use trpc_service::Dispatcher;
use trpc_transport::RpcStream;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// One accepted connection: a strict read → dispatch → write loop.
///
/// Any failure ends the loop. Nothing is written back for a failed call;
/// the client observes the connection closing.
pub(crate) struct Connection<R, W> {
    id: u64,
    peer: Option<SocketAddr>,
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
    dispatcher: Dispatcher,
    config: Arc<ServerConfig>,
    calls: u64,
}

impl Connection<RpcStream, RpcStream> {
    pub(crate) fn from_stream(
        id: u64,
        stream: RpcStream,
        dispatcher: Dispatcher,
        config: Arc<ServerConfig>,
    ) -> Result<Self> {
        let peer = stream.peer_addr().ok();
        let reader_stream = stream.try_clone()?;
        let reader = MessageReader::for_stream(reader_stream, config.framing, config.read_timeout)?;
        let writer = MessageWriter::for_stream(stream, config.framing, config.write_timeout)?;
        Ok(Self::new(id, peer, reader, writer, dispatcher, config))
    }
}

impl<R: Read, W: Write> Connection<R, W> {
    pub(crate) fn new(
        id: u64,
        peer: Option<SocketAddr>,
        reader: MessageReader<R>,
        writer: MessageWriter<W>,
        dispatcher: Dispatcher,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            id,
            peer,
            reader,
            writer,
            dispatcher,
            config,
            calls: 0,
        }
    }

    /// Serve calls until the peer leaves or a call fails, then log why.
    pub(crate) fn run(mut self) {
        info!(conn_id = self.id, peer = ?self.peer, "connection opened");

        let err = match self.serve() {
            Ok(()) => return,
            Err(err) => err,
        };
        match err {
            ServerError::Codec(CodecError::ConnectionClosed) => {
                info!(conn_id = self.id, calls = self.calls, "connection closed");
            }
            ServerError::Codec(ref codec) if codec.is_timeout() => {
                info!(conn_id = self.id, calls = self.calls, "connection idle timeout");
            }
            other => {
                warn!(
                    conn_id = self.id,
                    calls = self.calls,
                    error = %other,
                    "connection closed after error"
                );
            }
        }
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            self.serve_one()?;
        }
    }

    /// Read one request, dispatch it and write its reply.
    pub(crate) fn serve_one(&mut self) -> Result<()> {
        let message = self.reader.read_message()?;
        let envelope = decode_envelope(&message)?;
        let ctx = self.config.call_context(self.peer);

        let reply = self.dispatcher.dispatch_envelope(&ctx, &envelope)?;
        self.writer.write_message(&reply)?;

        self.calls += 1;
        debug!(
            conn_id = self.id,
            method = %envelope.method_address(),
            reply_len = reply.len(),
            "call served"
        );
        Ok(())
    }

    #[cfg(test)]
    fn written(&self) -> &W {
        self.writer.get_ref()
    }
}
