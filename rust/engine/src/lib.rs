//! # netchess-engine: chess rules core
//!
//! Board representation, move validation and match bookkeeping for a
//! two-player chess game whose state is kept in sync over a text protocol.
//! The rules are deliberately loose: there is no check or checkmate, and a
//! match ends the moment a king is captured.
//!
//! ## Core Modules
//!
//! - [`coord`] - Squares, square text and layout indices
//! - [`pieces`] - Sides, piece kinds, glyphs and roster entries
//! - [`board`] - The 64-cell layout and its piece roster
//! - [`rules`] - Movement patterns and [`rules::validate_move`]
//! - [`game`] - [`game::MatchController`], results and match events
//! - [`selection`] - Turning board clicks into move requests
//! - [`logger`] - Move and match records, JSONL match log
//! - [`errors`] - Error types
//!
//! ## Quick Start
//!
//! ```rust
//! use netchess_engine::board::STANDARD_LAYOUT;
//! use netchess_engine::game::MatchController;
//! use netchess_engine::pieces::Side;
//! use netchess_engine::rules::MoveRequest;
//!
//! let mut game = MatchController::new();
//! game.start_match(STANDARD_LAYOUT, Side::White).unwrap();
//!
//! let sq = |s: &str| s.parse().unwrap();
//! game.play(&MoveRequest::new(sq("e2"), sq("e4"))).unwrap();
//! game.play(&MoveRequest::new(sq("d7"), sq("d5"))).unwrap();
//! let record = game.play(&MoveRequest::new(sq("e4"), sq("d5"))).unwrap();
//! assert!(record.captured.is_some());
//! ```

pub mod board;
pub mod coord;
pub mod errors;
pub mod game;
pub mod logger;
pub mod pieces;
pub mod rules;
pub mod selection;
