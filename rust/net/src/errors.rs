//! Error taxonomy for the command protocol.
//!
//! Every handler returns [`ProtocolError`]. The dispatcher reports it through
//! tracing at the level its [`ErrorSeverity`] calls for and carries on; only a
//! [`ProtocolError::Desync`] has already torn the session down by the time it
//! is reported.

use std::fmt;

use netchess_engine::errors::RuleViolation;
use thiserror::Error;

use crate::command::ArgumentError;
use crate::session::IllegalTransition;
use crate::transport::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed command argument.
    Argument,
    /// A move the validator rejected.
    Rule,
    /// Command not allowed for this seat or connection state.
    Role,
    /// The two copies of the match disagree.
    Desync,
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The command is dropped, the session goes on.
    Recoverable,
    /// The connection was torn down.
    SessionFatal,
}

/// One field that differed during a `Validate` handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub field: &'static str,
    pub local: String,
    pub received: String,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: local '{}' vs received '{}'",
            self.field, self.local, self.received
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error("{0}")]
    Rule(RuleViolation),
    #[error("Opponent move rejected: {0}")]
    PeerRule(RuleViolation),
    #[error("{0}")]
    Role(String),
    #[error("Validation failed: {}", summarize(.0))]
    Desync(Vec<Discrepancy>),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn summarize(fields: &[Discrepancy]) -> String {
    fields
        .iter()
        .map(|d| d.field)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<IllegalTransition> for ProtocolError {
    fn from(err: IllegalTransition) -> Self {
        ProtocolError::Role(err.to_string())
    }
}

impl From<RuleViolation> for ProtocolError {
    fn from(err: RuleViolation) -> Self {
        ProtocolError::Rule(err)
    }
}

impl ProtocolError {
    pub fn role(message: impl Into<String>) -> Self {
        ProtocolError::Role(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::Argument(_) => ErrorKind::Argument,
            ProtocolError::Rule(_) | ProtocolError::PeerRule(_) => ErrorKind::Rule,
            ProtocolError::Role(_) => ErrorKind::Role,
            ProtocolError::Desync(_) => ErrorKind::Desync,
            ProtocolError::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Desync => ErrorSeverity::SessionFatal,
            _ => ErrorSeverity::Recoverable,
        }
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::Argument(_) => "invalid_argument",
            ProtocolError::Rule(_) => "rule_violation",
            ProtocolError::PeerRule(_) => "peer_rule_violation",
            ProtocolError::Role(_) => "role_violation",
            ProtocolError::Desync(_) => "state_desync",
            ProtocolError::Transport(_) => "transport_failure",
        }
    }

    /// Write the error to the console.
    pub fn report(&self) {
        match self.severity() {
            ErrorSeverity::Recoverable => {
                tracing::error!(code = self.error_code(), "{self}");
            }
            ErrorSeverity::SessionFatal => {
                tracing::error!(code = self.error_code(), "{self}; session closed");
            }
        }
    }
}
