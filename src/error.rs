use thiserror::Error;

pub type Result<T> = std::result::Result<T, HandlerError>;

/// Faults that abort a single request lifecycle. Nothing in this module
/// may terminate the polling loop; the engine logs and moves on.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request filename {0:?} does not match Req-<id>.xml or Req-<id>.kill")]
    MalformedFilename(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// A request descriptor that could not be turned into a `TestRequest`.
/// Routed to the NAK path rather than the handler-error path, so the
/// processor can branch on the outcome instead of catching broadly.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed descriptor: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid test request: {0}")]
    Invalid(String),
}
