use trpc_codec::CodecError;

/// Error type returned by service methods.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by service methods.
pub type HandlerResult<T> = std::result::Result<T, BoxError>;

/// Errors that can occur while dispatching a call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The envelope carried no argument bytes.
    #[error("missing arguments")]
    MissingArguments,

    /// The envelope carried an empty service name.
    #[error("empty service name")]
    EmptyServiceName,

    /// The envelope carried an empty method name.
    #[error("empty method name")]
    EmptyMethodName,

    /// No service is registered under this name.
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    /// The service exists but has no method with this name.
    #[error("method not found: {service}.{method}")]
    MethodNotFound { service: String, method: String },

    /// The argument bytes do not decode into the method's request type.
    #[error("failed to decode arguments: {0}")]
    Decode(#[source] CodecError),

    /// The method itself returned an error; shown as that error.
    #[error(transparent)]
    Handler(BoxError),

    /// The method's response could not be encoded.
    #[error("failed to encode reply: {0}")]
    Encode(#[source] CodecError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
