//! Text command codec.
//!
//! One command per line: a name followed by `key=value` tokens.
//!
//! ```text
//! Move from=E2 to=E4 remote=true
//! Disconnect reason=gone for dinner
//! ```
//!
//! Names are matched case-insensitively and may carry a `Chess` prefix
//! (`ChessMove`). Keys are case-insensitive. A bare token after a pair
//! extends that pair's value, so multi-word reasons survive a round trip.

use std::fmt;
use std::net::IpAddr;

use netchess_engine::coord::Coordinate;
use netchess_engine::pieces::PieceKind;
use thiserror::Error;

use crate::config::is_valid_port;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Empty command line")]
    Empty,
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("{command}: expected key=value, got '{token}'")]
    StrayToken { command: String, token: String },
    #[error("{command}: missing required argument '{key}'")]
    Missing {
        command: &'static str,
        key: &'static str,
    },
    #[error("{command}: invalid {key} '{value}': {reason}")]
    Invalid {
        command: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// An optional network argument that may be present but unusable.
///
/// Invalid values are kept so the handler can warn and fall back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Setting<T> {
    #[default]
    Absent,
    Valid(T),
    Invalid(String),
}

impl<T: fmt::Display> Setting<T> {
    fn text(&self) -> Option<String> {
        match self {
            Setting::Absent => None,
            Setting::Valid(v) => Some(v.to_string()),
            Setting::Invalid(raw) => Some(raw.clone()),
        }
    }
}

/// Full-state snapshot carried by `Validate`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub state: Option<String>,
    pub player1: Option<String>,
    pub player2: Option<String>,
    /// Turn number of the running match.
    pub move_number: Option<u32>,
    pub board: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveArgs {
    pub from: Coordinate,
    pub to: Coordinate,
    pub promote_to: Option<PieceKind>,
    pub teleport: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Listen {
        port: Setting<u16>,
    },
    Connect {
        ip: Setting<IpAddr>,
        port: Setting<u16>,
        spectator: bool,
    },
    ServerInfo {
        ip: Setting<IpAddr>,
        port: Setting<u16>,
    },
    Disconnect {
        reason: Option<String>,
        spectator: bool,
    },
    PlayerInfo {
        name: Option<String>,
    },
    Begin {
        first_player: Option<String>,
    },
    Validate(Snapshot),
    Move(MoveArgs),
    Resign,
    OfferDraw,
    AcceptDraw,
    RejectDraw,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Listen { .. } => "Listen",
            Command::Connect { .. } => "Connect",
            Command::ServerInfo { .. } => "ServerInfo",
            Command::Disconnect { .. } => "Disconnect",
            Command::PlayerInfo { .. } => "PlayerInfo",
            Command::Begin { .. } => "Begin",
            Command::Validate(_) => "Validate",
            Command::Move(_) => "Move",
            Command::Resign => "Resign",
            Command::OfferDraw => "OfferDraw",
            Command::AcceptDraw => "AcceptDraw",
            Command::RejectDraw => "RejectDraw",
        }
    }

    /// Commands a spectator may observe but never originate.
    pub fn is_gameplay(&self) -> bool {
        matches!(
            self,
            Command::Move(_)
                | Command::Resign
                | Command::Begin { .. }
                | Command::OfferDraw
                | Command::AcceptDraw
                | Command::RejectDraw
                | Command::PlayerInfo { .. }
        )
    }

    /// Commands that only make sense when typed locally.
    pub fn is_network_setup(&self) -> bool {
        matches!(
            self,
            Command::Listen { .. } | Command::Connect { .. } | Command::ServerInfo { .. }
        )
    }

    /// Lowercase verb for console messages ("trying to move ...").
    pub fn action(&self) -> &'static str {
        match self {
            Command::Move(_) => "move a piece",
            Command::Resign => "resign",
            Command::Begin { .. } => "begin a match",
            Command::OfferDraw => "offer a draw",
            Command::AcceptDraw => "accept a draw",
            Command::RejectDraw => "reject a draw",
            Command::PlayerInfo { .. } => "rename a player",
            Command::Validate(_) => "validate the match",
            _ => "change the connection",
        }
    }

    pub fn parse(line: &str) -> Result<Command, ArgumentError> {
        Envelope::parse(line).map(|e| e.command)
    }

    fn write_args(&self, out: &mut Vec<(&'static str, String)>) {
        match self {
            Command::Listen { port } => push_opt(out, "port", port.text()),
            Command::Connect {
                ip,
                port,
                spectator,
            } => {
                push_opt(out, "ip", ip.text());
                push_opt(out, "port", port.text());
                if *spectator {
                    out.push(("isSpectator", "true".into()));
                }
            }
            Command::ServerInfo { ip, port } => {
                push_opt(out, "ip", ip.text());
                push_opt(out, "port", port.text());
            }
            Command::Disconnect { reason, spectator } => {
                if *spectator {
                    out.push(("isSpectator", "true".into()));
                }
                // last, so trailing words stay attached to it
                push_opt(out, "reason", reason.clone());
            }
            Command::PlayerInfo { name } => push_opt(out, "name", name.clone()),
            Command::Begin { first_player } => push_opt(out, "firstPlayer", first_player.clone()),
            Command::Validate(s) => {
                push_opt(out, "state", s.state.clone());
                push_opt(out, "player1", s.player1.clone());
                push_opt(out, "player2", s.player2.clone());
                push_opt(out, "move", s.move_number.map(|n| n.to_string()));
                push_opt(out, "board", s.board.clone());
            }
            Command::Move(m) => {
                out.push(("from", m.from.to_string()));
                out.push(("to", m.to.to_string()));
                push_opt(out, "promoteTo", m.promote_to.map(|k| k.name().to_string()));
                if m.teleport {
                    out.push(("teleport", "true".into()));
                }
            }
            Command::Resign | Command::OfferDraw | Command::AcceptDraw | Command::RejectDraw => {}
        }
    }
}

fn push_opt(out: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<String>) {
    if let Some(v) = value {
        out.push((key, v));
    }
}

/// The wire form, without origin markers.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut args = Vec::new();
        self.write_args(&mut args);
        f.write_str(self.name())?;
        for (key, value) in args {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Typed or clicked on this machine.
    Local,
    /// Sent by the other side of the connection (`remote=true`).
    Peer,
    /// Forwarded by the server to its spectators (`fromServer=true`).
    Relay,
}

/// A command plus its origin markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub command: Command,
    pub origin: Origin,
}

impl Envelope {
    pub fn new(command: Command, origin: Origin) -> Self {
        Self { command, origin }
    }

    pub fn parse(line: &str) -> Result<Envelope, ArgumentError> {
        let mut tokens = line.split_whitespace();
        let raw_name = tokens.next().ok_or(ArgumentError::Empty)?;
        let mut pairs: Vec<(String, String)> = Vec::new();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) => pairs.push((key.to_ascii_lowercase(), value.to_string())),
                None => match pairs.last_mut() {
                    Some((_, value)) => {
                        value.push(' ');
                        value.push_str(token);
                    }
                    None => {
                        return Err(ArgumentError::StrayToken {
                            command: raw_name.to_string(),
                            token: token.to_string(),
                        })
                    }
                },
            }
        }
        let args = Args { pairs };

        let lowered = raw_name.to_ascii_lowercase();
        let name = lowered.strip_prefix("chess").unwrap_or(&lowered);
        let command = match name {
            "listen" => Command::Listen {
                port: args.port("Listen")?,
            },
            "connect" => Command::Connect {
                ip: args.ip(),
                port: args.port("Connect")?,
                spectator: args.flag("Connect", "isSpectator")?,
            },
            "serverinfo" => Command::ServerInfo {
                ip: args.ip(),
                port: args.port("ServerInfo")?,
            },
            "disconnect" => Command::Disconnect {
                reason: args.text("reason"),
                spectator: args.flag("Disconnect", "isSpectator")?,
            },
            "playerinfo" => Command::PlayerInfo {
                name: args.text("name"),
            },
            "begin" => Command::Begin {
                first_player: args.text("firstPlayer"),
            },
            "validate" => Command::Validate(Snapshot {
                state: args.text("state"),
                player1: args.text("player1"),
                player2: args.text("player2"),
                move_number: args.number("Validate", "move")?,
                board: args.text("board"),
            }),
            "move" => Command::Move(MoveArgs {
                from: args.square("from")?,
                to: args.square("to")?,
                promote_to: args.promotion()?,
                teleport: args.flag("Move", "teleport")?,
            }),
            "resign" => Command::Resign,
            "offerdraw" => Command::OfferDraw,
            "acceptdraw" => Command::AcceptDraw,
            "rejectdraw" => Command::RejectDraw,
            _ => return Err(ArgumentError::UnknownCommand(raw_name.to_string())),
        };

        let origin = if args.flag(command.name(), "fromServer")? {
            Origin::Relay
        } else if args.flag(command.name(), "remote")? {
            Origin::Peer
        } else {
            Origin::Local
        };
        Ok(Envelope { command, origin })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // markers go first so a multi-word reason stays the last value
        let marker = match self.origin {
            Origin::Local => "",
            Origin::Peer => " remote=true",
            Origin::Relay => " fromServer=true",
        };
        let text = self.command.to_string();
        match text.split_once(' ') {
            Some((name, rest)) => write!(f, "{name}{marker} {rest}"),
            None => write!(f, "{text}{marker}"),
        }
    }
}

struct Args {
    pairs: Vec<(String, String)>,
}

impl Args {
    fn raw(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.trim_matches('"'))
    }

    fn text(&self, key: &str) -> Option<String> {
        self.raw(key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn flag(&self, command: &'static str, key: &'static str) -> Result<bool, ArgumentError> {
        parse_flag(self.raw(key).unwrap_or("")).ok_or_else(|| ArgumentError::Invalid {
            command,
            key,
            value: self.raw(key).unwrap_or_default().to_string(),
            reason: "expected true or false".into(),
        })
    }

    fn port(&self, command: &'static str) -> Result<Setting<u16>, ArgumentError> {
        let Some(raw) = self.raw("port").filter(|v| !v.is_empty()) else {
            return Ok(Setting::Absent);
        };
        match raw.parse::<u32>() {
            Ok(p) if is_valid_port(p) => Ok(Setting::Valid(p as u16)),
            Ok(_) => Ok(Setting::Invalid(raw.to_string())),
            Err(_) => Err(ArgumentError::Invalid {
                command,
                key: "port",
                value: raw.to_string(),
                reason: "not a number".into(),
            }),
        }
    }

    fn ip(&self) -> Setting<IpAddr> {
        match self.raw("ip").filter(|v| !v.is_empty()) {
            None => Setting::Absent,
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => Setting::Valid(ip),
                Err(_) => Setting::Invalid(raw.to_string()),
            },
        }
    }

    fn number(&self, command: &'static str, key: &'static str) -> Result<Option<u32>, ArgumentError> {
        match self.raw(key).filter(|v| !v.is_empty()) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| ArgumentError::Invalid {
                command,
                key,
                value: raw.to_string(),
                reason: "not a number".into(),
            }),
        }
    }

    fn square(&self, key: &'static str) -> Result<Coordinate, ArgumentError> {
        let raw = self
            .raw(key)
            .filter(|v| !v.is_empty())
            .ok_or(ArgumentError::Missing {
                command: "Move",
                key,
            })?;
        raw.parse().map_err(|e: netchess_engine::errors::NotationError| {
            ArgumentError::Invalid {
                command: "Move",
                key,
                value: raw.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn promotion(&self) -> Result<Option<PieceKind>, ArgumentError> {
        let Some(raw) = self.raw("promoteTo").filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let invalid = |reason: String| ArgumentError::Invalid {
            command: "Move",
            key: "promoteTo",
            value: raw.to_string(),
            reason,
        };
        let kind: PieceKind = raw.parse().map_err(|e| invalid(format!("{e}")))?;
        if !kind.is_promotion_target() {
            return Err(invalid("expected knight, bishop, rook or queen".into()));
        }
        Ok(Some(kind))
    }
}

/// `""` and `"false"` are false, `"true"` is true, anything else is malformed.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "" | "false" => Some(false),
        "true" => Some(true),
        _ => None,
    }
}
