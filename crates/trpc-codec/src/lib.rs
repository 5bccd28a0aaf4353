//! Request envelope codec and message framing for trpc.
//!
//! A call travels as one JSON envelope:
//! `{"ServiceName": "...", "MethodName": "...", "Args": [..bytes..]}`
//! where `Args` is itself the JSON encoding of the caller's request value.
//! The reply is the bare JSON encoding of the response value.
//!
//! How envelopes and replies are delimited on the stream is decided by
//! [`Framing`]. The default reproduces the historical behavior of one
//! bounded read per message; a length-prefixed mode is available when both
//! ends opt in.

pub mod address;
pub mod envelope;
pub mod error;
pub mod framing;
pub mod reader;
pub mod writer;

pub use address::{AddressError, MethodAddress, SEPARATOR};
pub use envelope::{
    decode_args, decode_envelope, decode_reply, encode_envelope, encode_reply, Envelope,
};
pub use error::{CodecError, Result};
pub use framing::{
    decode_frame, encode_frame, Framing, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use reader::MessageReader;
pub use writer::MessageWriter;
