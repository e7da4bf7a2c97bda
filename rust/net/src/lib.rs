//! # netchess-net: command protocol and transports
//!
//! Keeps two copies of a match in step over a line-oriented text protocol,
//! with optional read-only spectators attached to the server.
//!
//! - [`command`] - Command enum and wire codec
//! - [`session`] - Connection role, seat and match phase
//! - [`protocol`] - [`CommandProtocol`], the per-tick dispatcher
//! - [`transport`] - [`Transport`] trait and an in-memory implementation
//! - [`tcp`] - Newline-delimited TCP transport on tokio
//! - [`presenter`] - Sound and board-update hooks
//! - [`config`] - Network defaults
//! - [`errors`] - Error taxonomy
//! - [`logging`] - Console subscriber and log capture for tests

pub mod command;
pub mod config;
pub mod errors;
pub mod logging;
pub mod presenter;
pub mod protocol;
pub mod session;
pub mod tcp;
pub mod transport;

pub use command::{ArgumentError, Command, Envelope, Origin, Snapshot};
pub use config::{SessionConfig, DEFAULT_IP, DEFAULT_PORT};
pub use errors::{ErrorKind, ErrorSeverity, ProtocolError};
pub use logging::{capture_logs, init_logging, init_logging_with, LogEntry, LogFormat};
pub use presenter::{NullPresenter, Presenter, RecordingPresenter, SoundCue};
pub use protocol::{CommandProtocol, TickInput};
pub use session::{Link, Phase, Seat, SessionState};
pub use tcp::TcpTransport;
pub use transport::{ConnectionState, MemoryTransport, Transport, TransportError};
