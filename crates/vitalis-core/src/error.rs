//! Error types for the engine.

use thiserror::Error;

/// Errors decoding an inbound envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Envelope has no string `type` field
    #[error("message has no type discriminator")]
    MissingType,

    /// `type` is not one this engine understands
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// Known `type` whose fields failed to decode
    #[error("malformed {kind} message: {source}")]
    Malformed {
        /// Message type
        kind: String,
        /// Decoder error
        source: serde_json::Error,
    },

    /// Outbound message failed to encode
    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),
}

/// Errors on the link to the event server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection attempt failed
    #[error("failed to connect to {url}: {reason}")]
    Dial {
        /// Target URL
        url: String,
        /// Underlying cause
        reason: String,
    },

    /// Write failed on an open link
    #[error("send failed: {0}")]
    Send(String),

    /// Link is closed
    #[error("link closed")]
    Closed,
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors decoding a heart-rate sensor payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    /// Payload shorter than its flags require
    #[error("heart rate measurement too short: {len} bytes, need {needed}")]
    Truncated {
        /// Bytes received
        len: usize,
        /// Bytes required
        needed: usize,
    },
}
