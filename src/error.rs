//! Error types for the signaling relay
//!
//! Layered the same way the rest of the crate is: each subsystem has its own
//! small error enum, and the crate-level [`Error`] wraps them for callers
//! that only care about "did the server fall over".

use crate::transport::TransportError;

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error decoding or encoding a protocol event
#[derive(Debug, Clone)]
pub enum ProtocolError {
    /// The inbound frame was not a well-formed event (bad JSON, unknown
    /// type tag, missing fields)
    MalformedEvent(String),
    /// An outbound event failed to serialize
    Encode(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::MalformedEvent(reason) => write!(f, "Malformed event: {}", reason),
            ProtocolError::Encode(reason) => write!(f, "Event encoding failed: {}", reason),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error (bind, accept, socket configuration)
    Io(std::io::Error),
    /// WebSocket handshake or framing error
    WebSocket(tokio_tungstenite::tungstenite::Error),
    /// Protocol encode/decode error
    Protocol(ProtocolError),
    /// Transport-level failure
    Transport(TransportError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::WebSocket(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Transport(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}
