//! Errors surfaced by the terminal front end.

use thiserror::Error;
use vitalis_core::{ConfigError, TransportError};

/// Anything that stops the terminal app.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Terminal or log file I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Link to the event server
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// Stdout is not a terminal
    #[error("terminal not available")]
    TerminalNotAvailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_from() {
        let err: TerminalError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed").into();
        assert!(matches!(err, TerminalError::Io(_)));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_transport_from() {
        let err: TerminalError = TransportError::Closed.into();
        assert_eq!(err.to_string(), "transport error: link closed");
    }

    #[test]
    fn test_config_from() {
        let err: TerminalError = ConfigError::Parse("expected `=`".to_string()).into();
        assert!(err.to_string().starts_with("config error:"));
    }
}
