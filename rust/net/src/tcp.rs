use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::transport::{ConnectionState, Transport, TransportError};

enum LinkEvent {
    Accepted {
        generation: u64,
        stream: TcpStream,
    },
    Connected {
        generation: u64,
        stream: TcpStream,
    },
    ConnectFailed {
        generation: u64,
        reason: String,
    },
    Line {
        generation: u64,
        conn: u64,
        line: String,
    },
    Closed {
        generation: u64,
        conn: u64,
    },
}

impl LinkEvent {
    fn generation(&self) -> u64 {
        match self {
            LinkEvent::Accepted { generation, .. }
            | LinkEvent::Connected { generation, .. }
            | LinkEvent::ConnectFailed { generation, .. }
            | LinkEvent::Line { generation, .. }
            | LinkEvent::Closed { generation, .. } => *generation,
        }
    }
}

struct Connection {
    id: u64,
    writer: UnboundedSender<String>,
    reader: JoinHandle<()>,
}

/// Newline-delimited TCP transport on a tokio runtime.
///
/// Socket work happens in spawned tasks which report back over a channel;
/// [`Transport::poll_lines`] drains that channel without blocking. Every
/// listen/connect/disconnect starts a new generation, and events from older
/// generations are discarded.
pub struct TcpTransport {
    handle: Handle,
    state: ConnectionState,
    events_tx: UnboundedSender<LinkEvent>,
    events_rx: UnboundedReceiver<LinkEvent>,
    generation: u64,
    next_conn: u64,
    listener: Option<JoinHandle<()>>,
    connector: Option<JoinHandle<()>>,
    /// In accept order on a server; the first one is the peer. Spectators
    /// never move into the peer slot.
    connections: Vec<Connection>,
    outgoing: Vec<String>,
    outgoing_spectators: Vec<String>,
}

impl TcpTransport {
    pub fn new(handle: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            handle,
            state: ConnectionState::Idle,
            events_tx,
            events_rx,
            generation: 0,
            next_conn: 0,
            listener: None,
            connector: None,
            connections: Vec::new(),
            outgoing: Vec::new(),
            outgoing_spectators: Vec::new(),
        }
    }

    /// Use the runtime of the calling context, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    fn teardown(&mut self) {
        if let Some(task) = self.listener.take() {
            task.abort();
        }
        if let Some(task) = self.connector.take() {
            task.abort();
        }
        self.drop_clients();
        self.generation += 1;
    }

    /// Close every client but keep accepting new ones.
    fn drop_clients(&mut self) {
        for conn in self.connections.drain(..) {
            conn.reader.abort();
            // dropping the sender lets the writer task drain and close
            drop(conn.writer);
        }
        self.outgoing.clear();
        self.outgoing_spectators.clear();
        self.refresh_client_count();
    }

    fn attach(&mut self, stream: TcpStream) {
        let id = self.next_conn;
        self.next_conn += 1;
        let _ = stream.set_nodelay(true);
        let (read_half, mut write_half) = stream.into_split();

        let (writer, mut rx) = mpsc::unbounded_channel::<String>();
        self.handle.spawn(async move {
            while let Some(line) = rx.recv().await {
                let mut data = line.into_bytes();
                data.push(b'\n');
                if write_half.write_all(&data).await.is_err() {
                    break;
                }
            }
            let _ = write_half.shutdown().await;
        });

        let tx = self.events_tx.clone();
        let generation = self.generation;
        let reader = self.handle.spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let event = LinkEvent::Line {
                    generation,
                    conn: id,
                    line,
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
            let _ = tx.send(LinkEvent::Closed {
                generation,
                conn: id,
            });
        });

        self.connections.push(Connection { id, writer, reader });
        self.refresh_client_count();
    }

    fn refresh_client_count(&mut self) {
        if let ConnectionState::Listening { clients, .. } = &mut self.state {
            *clients = self.connections.len();
        }
    }

    /// The connection gameplay lines are accepted from.
    fn peer_id(&self) -> Option<u64> {
        self.connections.first().map(|c| c.id)
    }

    fn write(&self, line: &str, skip_peer: bool) {
        let skip = usize::from(skip_peer);
        for conn in self.connections.iter().skip(skip) {
            let _ = conn.writer.send(line.to_string());
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn single_line(line: String) -> String {
    if line.contains(['\n', '\r']) {
        line.replace(['\n', '\r'], " ")
    } else {
        line
    }
}

impl Transport for TcpTransport {
    fn state(&self) -> ConnectionState {
        self.state.clone()
    }

    fn listen(&mut self, port: u16) -> Result<(), TransportError> {
        self.teardown();
        self.state = ConnectionState::Idle;
        let listen_err = |e: std::io::Error| TransportError::Listen {
            port,
            reason: e.to_string(),
        };
        let std_listener = std::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(listen_err)?;
        std_listener.set_nonblocking(true).map_err(listen_err)?;
        let listener = {
            let _guard = self.handle.enter();
            TcpListener::from_std(std_listener).map_err(listen_err)?
        };

        let tx = self.events_tx.clone();
        let generation = self.generation;
        self.listener = Some(self.handle.spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tracing::debug!(%addr, "accepted client");
                        if tx.send(LinkEvent::Accepted { generation, stream }).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                }
            }
        }));
        self.state = ConnectionState::Listening { port, clients: 0 };
        Ok(())
    }

    fn connect(&mut self, ip: IpAddr, port: u16) -> Result<(), TransportError> {
        self.teardown();
        let addr = SocketAddr::new(ip, port);
        let tx = self.events_tx.clone();
        let generation = self.generation;
        self.connector = Some(self.handle.spawn(async move {
            let event = match TcpStream::connect(addr).await {
                Ok(stream) => LinkEvent::Connected { generation, stream },
                Err(e) => LinkEvent::ConnectFailed {
                    generation,
                    reason: e.to_string(),
                },
            };
            let _ = tx.send(event);
        }));
        self.state = ConnectionState::Connecting { addr };
        Ok(())
    }

    fn disconnect(&mut self) {
        self.teardown();
        self.state = ConnectionState::Idle;
    }

    fn queue_outgoing(&mut self, line: String) {
        if self.state.link() != crate::session::Link::Idle {
            self.outgoing.push(single_line(line));
        }
    }

    fn queue_to_spectators(&mut self, line: String) {
        if matches!(self.state, ConnectionState::Listening { .. }) {
            self.outgoing_spectators.push(single_line(line));
        }
    }

    fn send_now(&mut self, line: String) {
        self.write(&single_line(line), false);
    }

    fn send_now_to_spectators(&mut self, line: String) {
        if matches!(self.state, ConnectionState::Listening { .. }) {
            self.write(&single_line(line), true);
        }
    }

    fn flush(&mut self) {
        for line in std::mem::take(&mut self.outgoing) {
            self.write(&line, false);
        }
        for line in std::mem::take(&mut self.outgoing_spectators) {
            self.write(&line, true);
        }
    }

    fn poll_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if event.generation() != self.generation {
                continue;
            }
            match event {
                LinkEvent::Accepted { stream, .. } => {
                    if matches!(self.state, ConnectionState::Listening { .. }) {
                        self.attach(stream);
                    }
                }
                LinkEvent::Connected { stream, .. } => {
                    if let ConnectionState::Connecting { addr } = self.state {
                        self.state = ConnectionState::Connected { addr };
                        self.attach(stream);
                    }
                }
                LinkEvent::ConnectFailed { reason, .. } => {
                    tracing::warn!(%reason, "connection attempt failed");
                    self.state = ConnectionState::Idle;
                }
                LinkEvent::Line { conn, line, .. } => {
                    if self.peer_id() == Some(conn) {
                        lines.push(line);
                    } else {
                        tracing::debug!(conn, %line, "line from a spectator ignored");
                    }
                }
                LinkEvent::Closed { conn, .. } => match self.state {
                    ConnectionState::Listening { .. } if self.peer_id() == Some(conn) => {
                        // spectators have nobody left to watch
                        tracing::debug!(conn, "peer closed, dropping spectators");
                        self.drop_clients();
                    }
                    ConnectionState::Listening { .. } => {
                        self.connections.retain(|c| c.id != conn);
                        self.refresh_client_count();
                    }
                    _ => {
                        self.teardown();
                        self.state = ConnectionState::Idle;
                    }
                },
            }
        }
        lines
    }
}
