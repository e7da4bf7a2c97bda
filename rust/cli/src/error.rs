//! Error types for the CLI application.

use std::fmt;

use netchess_net::ProtocolError;

/// Everything a subcommand can fail with.
///
/// Commands return `Result<(), CliError>` and [`crate::run`] maps the error to
/// an exit code.
#[derive(Debug)]
pub enum CliError {
    /// I/O error (script and record files, stdout/stderr writes)
    Io(std::io::Error),

    /// Invalid user input or command-line arguments
    InvalidInput(String),

    /// Configuration error
    Config(String),

    /// A protocol failure the console could not recover from
    Protocol(ProtocolError),

    /// Operation was interrupted (e.g., by user with Ctrl+C)
    Interrupted(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Protocol(e) => write!(f, "Protocol error: {}", e),
            CliError::Interrupted(msg) => write!(f, "Interrupted: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<ProtocolError> for CliError {
    fn from(error: ProtocolError) -> Self {
        CliError::Protocol(error)
    }
}

impl From<&str> for CliError {
    fn from(error: &str) -> Self {
        CliError::InvalidInput(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netchess_net::ArgumentError;

    #[test]
    fn protocol_errors_keep_their_source() {
        let err = CliError::from(ProtocolError::from(ArgumentError::Empty));
        assert!(err.to_string().starts_with("Protocol error: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn str_becomes_invalid_input() {
        let err = CliError::from("bad flag");
        assert_eq!(err.to_string(), "Invalid input: bad flag");
    }
}
