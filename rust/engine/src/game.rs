use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::BoardLayout;
use crate::coord::Coordinate;
use crate::errors::{LayoutError, RuleViolation};
use crate::logger::{MatchRecord, MoveRecord};
use crate::pieces::{Piece, PieceKind, Side};
use crate::rules::{validate_move, MoveRequest, MoveResolution};

/// Final outcome of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    WhiteWins,
    BlackWins,
    Draw,
    Undetermined,
}

impl MatchResult {
    pub fn win_for(side: Side) -> Self {
        match side {
            Side::White => MatchResult::WhiteWins,
            Side::Black => MatchResult::BlackWins,
        }
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            MatchResult::WhiteWins => Some(Side::White),
            MatchResult::BlackWins => Some(Side::Black),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCause {
    KingCaptured,
    Resignation,
    AgreedDraw,
    /// Ended from outside the rules, e.g. a session torn down mid-match.
    Aborted,
}

impl fmt::Display for EndCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndCause::KingCaptured => "king captured",
            EndCause::Resignation => "resignation",
            EndCause::AgreedDraw => "agreed draw",
            EndCause::Aborted => "aborted",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    NotStarted,
    InProgress,
    Ended { result: MatchResult, cause: EndCause },
}

/// The three-valued status string exchanged during validation handshakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Player1Moving,
    Player2Moving,
    GameOver,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MatchStatus::Player1Moving => "Player1Moving",
            MatchStatus::Player2Moving => "Player2Moving",
            MatchStatus::GameOver => "GameOver",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchState {
    /// Starts at 1 and grows by one per applied move.
    pub turn: u32,
    pub side_to_move: Side,
    pub phase: MatchPhase,
}

/// Notifications queued by the controller for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    PieceMoved {
        kind: PieceKind,
        from: Coordinate,
        to: Coordinate,
        castling: bool,
    },
    PieceCaptured {
        kind: PieceKind,
        from: Coordinate,
        captured: PieceKind,
        at: Coordinate,
        en_passant: bool,
    },
    PiecePromoted {
        at: Coordinate,
        from_kind: PieceKind,
        to_kind: PieceKind,
    },
    TurnChanged {
        turn: u32,
        side_to_move: Side,
    },
    MatchEnded {
        result: MatchResult,
        cause: EndCause,
    },
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchEvent::PieceMoved {
                kind,
                from,
                to,
                castling,
            } => {
                write!(f, "{kind} at {from} moves to {to}")?;
                if *castling {
                    write!(f, ": Castling")?;
                }
                Ok(())
            }
            MatchEvent::PieceCaptured {
                kind,
                from,
                captured,
                at,
                en_passant,
            } => {
                write!(f, "{kind} at {from} captures {captured} at {at}")?;
                if *en_passant {
                    write!(f, ": En Passant")?;
                }
                Ok(())
            }
            MatchEvent::PiecePromoted {
                at,
                from_kind,
                to_kind,
            } => write!(f, "{from_kind} at {at} is promoted to {to_kind}"),
            MatchEvent::TurnChanged { turn, side_to_move } => {
                write!(f, "Turn #{turn}, {side_to_move} to move")
            }
            MatchEvent::MatchEnded { result, cause } => {
                write!(f, "Match Ends ({cause}): {result:?}")
            }
        }
    }
}

/// Owns the board and the turn/side/result state of one match.
///
/// Moves go through a two-step chain: [`validate`](Self::validate) produces a
/// [`MoveResolution`], [`apply_move`](Self::apply_move) commits it.
///
/// ```
/// use netchess_engine::board::STANDARD_LAYOUT;
/// use netchess_engine::game::{MatchController, MatchStatus};
/// use netchess_engine::pieces::Side;
/// use netchess_engine::rules::MoveRequest;
///
/// let mut game = MatchController::new();
/// game.start_match(STANDARD_LAYOUT, Side::White).unwrap();
/// let sq = |s: &str| s.parse().unwrap();
///
/// let resolution = game.validate(&MoveRequest::new(sq("e2"), sq("e4"))).unwrap();
/// game.apply_move(&resolution).unwrap();
///
/// assert_eq!(game.turn(), 2);
/// assert_eq!(game.status(), MatchStatus::Player2Moving);
/// ```
#[derive(Debug, Clone)]
pub struct MatchController {
    board: BoardLayout,
    state: MatchState,
    initial_layout: String,
    starting_side: Side,
    history: Vec<MoveRecord>,
    events: Vec<MatchEvent>,
}

impl Default for MatchController {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchController {
    pub fn new() -> Self {
        Self {
            board: BoardLayout::empty(),
            state: MatchState {
                turn: 0,
                side_to_move: Side::White,
                phase: MatchPhase::NotStarted,
            },
            initial_layout: String::new(),
            starting_side: Side::White,
            history: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Reset to a fresh match on `layout` with `starting_side` to move.
    pub fn start_match(&mut self, layout: &str, starting_side: Side) -> Result<(), LayoutError> {
        let board = BoardLayout::parse(layout)?;
        *self = Self::from_position(board, starting_side, 1);
        Ok(())
    }

    /// A running match from an arbitrary position, e.g. one prepared with
    /// [`BoardLayout::set_history`].
    pub fn from_position(board: BoardLayout, side_to_move: Side, turn: u32) -> Self {
        Self {
            initial_layout: board.to_string(),
            board,
            state: MatchState {
                turn: turn.max(1),
                side_to_move,
                phase: MatchPhase::InProgress,
            },
            starting_side: side_to_move,
            history: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Validate a request for the side to move.
    ///
    /// # Errors
    ///
    /// [`RuleViolation::NoMatch`] / [`RuleViolation::MatchEnded`] outside a
    /// running match, [`RuleViolation::OpponentPiece`] when the origin holds a
    /// piece of the side not to move, otherwise whatever
    /// [`validate_move`] reports.
    pub fn validate(&self, request: &MoveRequest) -> Result<MoveResolution, RuleViolation> {
        self.ensure_in_progress()?;
        if request.from == request.to {
            return Err(RuleViolation::SameSquare);
        }
        let (_, piece) = self
            .board
            .occupant(request.from)
            .ok_or(RuleViolation::EmptyOrigin(request.from))?;
        if piece.side != self.state.side_to_move {
            return Err(RuleViolation::OpponentPiece(request.from));
        }
        validate_move(&self.board, self.state.turn, request)
    }

    /// Commit a resolution produced by [`validate`](Self::validate) on the
    /// current position.
    ///
    /// Capturing a king ends the match at once without advancing the turn.
    pub fn apply_move(&mut self, resolution: &MoveResolution) -> Result<MoveRecord, RuleViolation> {
        self.ensure_in_progress()?;
        let mover = self
            .board
            .piece(resolution.mover)
            .filter(|p| p.current == resolution.from)
            .cloned()
            .ok_or(RuleViolation::EmptyOrigin(resolution.from))?;
        let captured: Option<Piece> = resolution
            .captured
            .and_then(|id| self.board.piece(id))
            .cloned();
        let turn = self.state.turn;

        if let Some(rook) = &resolution.castling {
            self.board.relocate(rook.rook, rook.to, turn);
        }
        self.board.relocate(resolution.mover, resolution.to, turn);

        match &captured {
            Some(victim) => self.events.push(MatchEvent::PieceCaptured {
                kind: mover.kind,
                from: resolution.from,
                captured: victim.kind,
                at: victim.current,
                en_passant: resolution.en_passant,
            }),
            None => self.events.push(MatchEvent::PieceMoved {
                kind: mover.kind,
                from: resolution.from,
                to: resolution.to,
                castling: resolution.is_castling(),
            }),
        }

        if let Some(promotion) = &resolution.promotion {
            self.board.promote(resolution.mover, promotion.kind);
            self.events.push(MatchEvent::PiecePromoted {
                at: resolution.to,
                from_kind: mover.kind,
                to_kind: promotion.kind,
            });
        }

        // roster ids shift on removal, so this comes after every id-based update
        if let Some(id) = resolution.captured {
            self.board.take(id);
        }

        let record = MoveRecord {
            turn,
            side: mover.side,
            piece: mover.kind,
            from: resolution.from,
            to: resolution.to,
            captured: captured.as_ref().map(|p| p.kind),
            promoted_to: resolution.promotion.map(|p| p.kind),
            castling: resolution.is_castling(),
            en_passant: resolution.en_passant,
            teleport: resolution.teleport,
        };
        self.history.push(record.clone());

        if captured.is_some_and(|p| p.kind == PieceKind::King) {
            self.end(MatchResult::win_for(mover.side), EndCause::KingCaptured);
        } else {
            self.state.turn += 1;
            self.state.side_to_move = self.state.side_to_move.opponent();
            self.events.push(MatchEvent::TurnChanged {
                turn: self.state.turn,
                side_to_move: self.state.side_to_move,
            });
        }
        Ok(record)
    }

    /// Validate and apply in one step.
    pub fn play(&mut self, request: &MoveRequest) -> Result<MoveRecord, RuleViolation> {
        let resolution = self.validate(request)?;
        self.apply_move(&resolution)
    }

    /// `side` gives up; the other side wins.
    pub fn resign(&mut self, side: Side) -> Result<(), RuleViolation> {
        self.set_result_and_end(MatchResult::win_for(side.opponent()), EndCause::Resignation)
    }

    pub fn set_result_and_end(
        &mut self,
        result: MatchResult,
        cause: EndCause,
    ) -> Result<(), RuleViolation> {
        self.ensure_in_progress()?;
        self.end(result, cause);
        Ok(())
    }

    fn end(&mut self, result: MatchResult, cause: EndCause) {
        self.state.phase = MatchPhase::Ended { result, cause };
        self.events.push(MatchEvent::MatchEnded { result, cause });
    }

    fn ensure_in_progress(&self) -> Result<(), RuleViolation> {
        match self.state.phase {
            MatchPhase::NotStarted => Err(RuleViolation::NoMatch),
            MatchPhase::InProgress => Ok(()),
            MatchPhase::Ended { .. } => Err(RuleViolation::MatchEnded),
        }
    }

    pub fn board(&self) -> &BoardLayout {
        &self.board
    }

    pub fn board_string(&self) -> String {
        self.board.to_string()
    }

    pub fn occupant(&self, at: Coordinate) -> Option<&Piece> {
        self.board.occupant(at).map(|(_, p)| p)
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn turn(&self) -> u32 {
        self.state.turn
    }

    pub fn side_to_move(&self) -> Side {
        self.state.side_to_move
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase
    }

    pub fn is_in_progress(&self) -> bool {
        self.state.phase == MatchPhase::InProgress
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state.phase, MatchPhase::Ended { .. })
    }

    pub fn result(&self) -> Option<MatchResult> {
        match self.state.phase {
            MatchPhase::Ended { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn status(&self) -> MatchStatus {
        match (self.state.phase, self.state.side_to_move) {
            (MatchPhase::InProgress, Side::White) => MatchStatus::Player1Moving,
            (MatchPhase::InProgress, Side::Black) => MatchStatus::Player2Moving,
            _ => MatchStatus::GameOver,
        }
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Take every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshot for the match log.
    pub fn to_record(&self, match_id: String, players: [String; 2]) -> MatchRecord {
        let (result, cause) = match self.state.phase {
            MatchPhase::Ended { result, cause } => (Some(result), Some(cause)),
            _ => (None, None),
        };
        MatchRecord {
            match_id,
            initial_layout: self.initial_layout.clone(),
            starting_side: self.starting_side,
            players,
            moves: self.history.clone(),
            final_layout: self.board_string(),
            result,
            cause,
            ts: None,
        }
    }
}
