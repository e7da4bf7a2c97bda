use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::session::Link;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Cannot listen on port {port}: {reason}")]
    Listen { port: u16, reason: String },
    #[error("Cannot connect to {addr}: {reason}")]
    Connect { addr: SocketAddr, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    /// Server role. The first client is the peer, later ones are spectators.
    Listening { port: u16, clients: usize },
    Connecting { addr: SocketAddr },
    Connected { addr: SocketAddr },
}

impl ConnectionState {
    pub fn link(&self) -> Link {
        match self {
            ConnectionState::Idle => Link::Idle,
            ConnectionState::Listening { .. } => Link::Listening,
            ConnectionState::Connecting { .. } => Link::Connecting,
            ConnectionState::Connected { .. } => Link::Connected,
        }
    }

    /// Someone is on the other end.
    pub fn has_peer(&self) -> bool {
        match self {
            ConnectionState::Listening { clients, .. } => *clients > 0,
            ConnectionState::Connected { .. } => true,
            _ => false,
        }
    }

    /// Clients attached after the peer.
    pub fn spectators(&self) -> usize {
        match self {
            ConnectionState::Listening { clients, .. } => clients.saturating_sub(1),
            _ => 0,
        }
    }
}

/// A reliable, ordered, line-oriented channel.
///
/// Every call is non-blocking. Outgoing lines are either buffered until
/// [`flush`](Transport::flush) or written at once with the `send_now` family.
pub trait Transport {
    fn state(&self) -> ConnectionState;

    /// Start (or move) the server to `port`.
    fn listen(&mut self, port: u16) -> Result<(), TransportError>;

    /// Start connecting to a server. Completion shows up in [`state`](Transport::state).
    fn connect(&mut self, ip: IpAddr, port: u16) -> Result<(), TransportError>;

    fn disconnect(&mut self);

    /// Buffer a line for the server (client role) or every client (server role).
    fn queue_outgoing(&mut self, line: String);

    /// Buffer a line for every client except the peer. No-op for clients.
    fn queue_to_spectators(&mut self, line: String);

    fn send_now(&mut self, line: String);

    fn send_now_to_spectators(&mut self, line: String);

    fn flush(&mut self);

    /// Complete lines received since the last call, in arrival order.
    fn poll_lines(&mut self) -> Vec<String>;
}

/// In-process transport driven by hand.
///
/// Tests push incoming lines and connection changes, then read back what the
/// protocol sent.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: ConnectionState,
    inbox: VecDeque<String>,
    pending: Vec<String>,
    pending_spectators: Vec<String>,
    sent: Vec<String>,
    sent_to_spectators: Vec<String>,
    immediate: Vec<String>,
    refuse: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next listen/connect fail.
    pub fn refuse_next(&mut self) {
        self.refuse = true;
    }

    pub fn push_incoming(&mut self, line: impl Into<String>) {
        self.inbox.push_back(line.into());
    }

    /// A client joins the server, or the pending connection completes.
    pub fn attach(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            ConnectionState::Listening { port, clients } => ConnectionState::Listening {
                port,
                clients: clients + 1,
            },
            ConnectionState::Connecting { addr } => ConnectionState::Connected { addr },
            other => other,
        };
    }

    /// The remote end went away without a word. On a server the spectators
    /// are closed along with the peer.
    pub fn drop_link(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            ConnectionState::Listening { port, .. } => ConnectionState::Listening { port, clients: 0 },
            _ => ConnectionState::Idle,
        };
    }

    /// Lines delivered to the peer (flushed or immediate), oldest first.
    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }

    pub fn take_sent_to_spectators(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent_to_spectators)
    }

    /// Lines that bypassed the buffer.
    pub fn immediate(&self) -> &[String] {
        &self.immediate
    }

    pub fn take_immediate(&mut self) -> Vec<String> {
        std::mem::take(&mut self.immediate)
    }

    pub fn buffered(&self) -> usize {
        self.pending.len() + self.pending_spectators.len()
    }
}

impl Transport for MemoryTransport {
    fn state(&self) -> ConnectionState {
        self.state.clone()
    }

    fn listen(&mut self, port: u16) -> Result<(), TransportError> {
        if std::mem::take(&mut self.refuse) {
            return Err(TransportError::Listen {
                port,
                reason: "refused".into(),
            });
        }
        self.state = ConnectionState::Listening { port, clients: 0 };
        Ok(())
    }

    fn connect(&mut self, ip: IpAddr, port: u16) -> Result<(), TransportError> {
        let addr = SocketAddr::new(ip, port);
        if std::mem::take(&mut self.refuse) {
            return Err(TransportError::Connect {
                addr,
                reason: "refused".into(),
            });
        }
        self.state = ConnectionState::Connecting { addr };
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Idle;
        self.pending.clear();
        self.pending_spectators.clear();
    }

    fn queue_outgoing(&mut self, line: String) {
        if self.state.link() != Link::Idle {
            self.pending.push(line);
        }
    }

    fn queue_to_spectators(&mut self, line: String) {
        if self.state.link() == Link::Listening {
            self.pending_spectators.push(line);
        }
    }

    fn send_now(&mut self, line: String) {
        self.immediate.push(line.clone());
        self.sent.push(line);
    }

    fn send_now_to_spectators(&mut self, line: String) {
        if self.state.link() == Link::Listening {
            self.immediate.push(line.clone());
            self.sent_to_spectators.push(line);
        }
    }

    fn flush(&mut self) {
        self.sent.append(&mut self.pending);
        self.sent_to_spectators.append(&mut self.pending_spectators);
    }

    fn poll_lines(&mut self) -> Vec<String> {
        self.inbox.drain(..).collect()
    }
}
