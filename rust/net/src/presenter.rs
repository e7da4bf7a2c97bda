//! Hooks for whatever draws the board and plays sounds.

use netchess_engine::game::MatchEvent;
use netchess_engine::pieces::Side;

use crate::session::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// A peer message was applied.
    Info,
    /// A command was refused.
    Error,
    MatchStart,
    MatchEnd,
    Move,
    Capture,
}

/// Notifications from the protocol to the presentation layer.
///
/// Every method defaults to doing nothing, so a console front end only
/// overrides what it shows.
pub trait Presenter {
    fn play_sound(&mut self, _cue: SoundCue) {}

    fn turn_changed(&mut self, _side_to_move: Side, _turn: u32) {}

    fn phase_changed(&mut self, _phase: Phase) {}

    fn match_event(&mut self, _event: &MatchEvent) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

/// Keeps every notification, for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    pub sounds: Vec<SoundCue>,
    pub turns: Vec<(Side, u32)>,
    pub phases: Vec<Phase>,
    pub events: Vec<MatchEvent>,
}

impl Presenter for RecordingPresenter {
    fn play_sound(&mut self, cue: SoundCue) {
        self.sounds.push(cue);
    }

    fn turn_changed(&mut self, side_to_move: Side, turn: u32) {
        self.turns.push((side_to_move, turn));
    }

    fn phase_changed(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn match_event(&mut self, event: &MatchEvent) {
        self.events.push(event.clone());
    }
}
