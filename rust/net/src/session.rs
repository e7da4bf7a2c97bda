use std::fmt;

use netchess_engine::pieces::Side;
use serde::Serialize;
use thiserror::Error;

/// Connection role, mirrored from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    Idle,
    /// Server role, with or without clients attached.
    Listening,
    Connecting,
    Connected,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Link::Idle => "idle",
            Link::Listening => "listening",
            Link::Connecting => "connecting",
            Link::Connected => "connected",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Player,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    InMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Listen,
    Connect { spectator: bool },
    LinkUp,
    LinkDown,
    BeginMatch,
    LeaveMatch,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Transition::Listen => "listen",
            Transition::Connect { spectator: true } => "connect as a spectator",
            Transition::Connect { spectator: false } => "connect",
            Transition::LinkUp => "complete the connection",
            Transition::LinkDown => "disconnect",
            Transition::BeginMatch => "begin a match",
            Transition::LeaveMatch => "leave the match",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cannot {transition} while {from}")]
pub struct IllegalTransition {
    pub from: Link,
    pub transition: Transition,
}

/// Connection role, spectator seat and match phase in one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub link: Link,
    pub seat: Seat,
    pub phase: Phase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            link: Link::Idle,
            seat: Seat::Player,
            phase: Phase::Lobby,
        }
    }
}

impl SessionState {
    /// The state after `transition`, or why it is not allowed from here.
    ///
    /// ```
    /// use netchess_net::session::{Link, SessionState, Transition};
    ///
    /// let idle = SessionState::default();
    /// let hosting = idle.apply(Transition::Listen).unwrap();
    /// assert_eq!(hosting.link, Link::Listening);
    /// assert!(hosting.apply(Transition::Connect { spectator: false }).is_err());
    /// ```
    pub fn apply(self, transition: Transition) -> Result<SessionState, IllegalTransition> {
        let illegal = IllegalTransition {
            from: self.link,
            transition,
        };
        let next = match (self.link, transition) {
            (Link::Idle | Link::Listening, Transition::Listen) => SessionState {
                link: Link::Listening,
                seat: Seat::Player,
                ..self
            },
            (Link::Idle | Link::Connecting, Transition::Connect { spectator }) => SessionState {
                link: Link::Connecting,
                seat: if spectator {
                    Seat::Spectator
                } else {
                    Seat::Player
                },
                ..self
            },
            (Link::Connecting, Transition::LinkUp) => SessionState {
                link: Link::Connected,
                ..self
            },
            (Link::Listening | Link::Connected, Transition::LinkUp) => self,
            (_, Transition::LinkDown) => SessionState::default(),
            (_, Transition::BeginMatch) => SessionState {
                phase: Phase::InMatch,
                ..self
            },
            (_, Transition::LeaveMatch) => SessionState {
                phase: Phase::Lobby,
                ..self
            },
            _ => return Err(illegal),
        };
        Ok(next)
    }

    /// The side this console plays: the server is White, a client Black.
    pub fn local_side(&self) -> Side {
        match self.link {
            Link::Connecting | Link::Connected => Side::Black,
            Link::Idle | Link::Listening => Side::White,
        }
    }

    pub fn is_server(&self) -> bool {
        self.link == Link::Listening
    }

    pub fn is_spectating(&self) -> bool {
        self.seat == Seat::Spectator && matches!(self.link, Link::Connecting | Link::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_becomes_connected_and_plays_black() {
        let s = SessionState::default()
            .apply(Transition::Connect { spectator: false })
            .unwrap()
            .apply(Transition::LinkUp)
            .unwrap();
        assert_eq!(s.link, Link::Connected);
        assert_eq!(s.local_side(), Side::Black);
    }

    #[test]
    fn connected_client_cannot_listen_or_reconnect() {
        let s = SessionState {
            link: Link::Connected,
            ..SessionState::default()
        };
        let err = s.apply(Transition::Listen).unwrap_err();
        assert_eq!(err.to_string(), "Cannot listen while connected");
        assert!(s.apply(Transition::Connect { spectator: true }).is_err());
    }

    #[test]
    fn link_down_resets_everything() {
        let s = SessionState::default()
            .apply(Transition::Connect { spectator: true })
            .unwrap()
            .apply(Transition::BeginMatch)
            .unwrap();
        assert!(s.is_spectating());
        assert_eq!(s.apply(Transition::LinkDown).unwrap(), SessionState::default());
    }

    #[test]
    fn serializes_as_snake_case_labels() {
        let s = SessionState::default().apply(Transition::Listen).unwrap();
        assert_eq!(
            serde_json::to_value(s).unwrap(),
            serde_json::json!({"link": "listening", "seat": "player", "phase": "lobby"})
        );
    }

    #[test]
    fn idle_cannot_complete_a_connection() {
        assert!(SessionState::default().apply(Transition::LinkUp).is_err());
    }
}
