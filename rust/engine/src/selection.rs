use crate::coord::Coordinate;
use crate::errors::RuleViolation;
use crate::game::MatchController;
use crate::pieces::Side;
use crate::rules::MoveRequest;

/// Map a point on the board plane to a square.
///
/// The board spans `[0, 8)` on both axes with A1 at the origin and one unit
/// per square; anything outside is `None`.
pub fn board_coords_for_point(x: f32, y: f32) -> Option<Coordinate> {
    if !(0.0..8.0).contains(&x) || !(0.0..8.0).contains(&y) {
        return None;
    }
    Coordinate::new(x.floor() as u8, y.floor() as u8)
}

/// How a hovered square should be highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Highlight {
    None,
    Selectable,
    Move,
    Capture,
    Illegal(RuleViolation),
}

/// Two-click piece selection.
///
/// The first click picks one of the mover's pieces, the second turns into a
/// [`MoveRequest`] with auto-promotion enabled. Nothing here mutates the match.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: Option<Coordinate>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<Coordinate> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// `controls` is the side the local player may move, or `None` when one
    /// console plays both sides.
    pub fn click(
        &mut self,
        game: &MatchController,
        at: Coordinate,
        controls: Option<Side>,
    ) -> Option<MoveRequest> {
        if !game.is_in_progress() {
            self.selected = None;
            return None;
        }
        let movable = |sq: Coordinate| {
            game.occupant(sq).is_some_and(|p| {
                p.side == game.side_to_move() && controls.map_or(true, |s| s == p.side)
            })
        };
        match self.selected {
            Some(from) if from == at => {
                self.selected = None;
                None
            }
            _ if movable(at) => {
                self.selected = Some(at);
                None
            }
            Some(from) => {
                self.selected = None;
                Some(MoveRequest::new(from, at).with_auto_promote())
            }
            None => None,
        }
    }

    pub fn hover(
        &self,
        game: &MatchController,
        at: Coordinate,
        controls: Option<Side>,
    ) -> Highlight {
        let Some(from) = self.selected else {
            let selectable = game.is_in_progress()
                && game.occupant(at).is_some_and(|p| {
                    p.side == game.side_to_move() && controls.map_or(true, |s| s == p.side)
                });
            return if selectable {
                Highlight::Selectable
            } else {
                Highlight::None
            };
        };
        if from == at {
            return Highlight::None;
        }
        match game.validate(&MoveRequest::new(from, at).with_auto_promote()) {
            Ok(r) if r.is_capture() => Highlight::Capture,
            Ok(_) => Highlight::Move,
            Err(e) => Highlight::Illegal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::STANDARD_LAYOUT;

    fn sq(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn started() -> MatchController {
        let mut game = MatchController::new();
        game.start_match(STANDARD_LAYOUT, Side::White).unwrap();
        game
    }

    #[test]
    fn points_map_to_squares() {
        assert_eq!(board_coords_for_point(0.2, 0.9), Some(sq("a1")));
        assert_eq!(board_coords_for_point(4.5, 3.0), Some(sq("e4")));
        assert_eq!(board_coords_for_point(7.99, 7.99), Some(sq("h8")));
        assert_eq!(board_coords_for_point(-0.1, 3.0), None);
        assert_eq!(board_coords_for_point(3.0, 8.0), None);
    }

    #[test]
    fn second_click_yields_auto_promoting_request() {
        let game = started();
        let mut sel = Selection::new();
        assert_eq!(sel.click(&game, sq("e2"), None), None);
        assert_eq!(sel.selected(), Some(sq("e2")));
        let req = sel.click(&game, sq("e4"), None).unwrap();
        assert_eq!(req.from, sq("e2"));
        assert!(req.auto_promote);
        assert_eq!(sel.selected(), None);
    }

    #[test]
    fn opponent_pieces_cannot_be_selected() {
        let game = started();
        let mut sel = Selection::new();
        assert_eq!(sel.click(&game, sq("e7"), None), None);
        assert_eq!(sel.selected(), None);
        // White to move, but this console only controls Black
        assert_eq!(sel.click(&game, sq("e2"), Some(Side::Black)), None);
        assert_eq!(sel.selected(), None);
    }

    #[test]
    fn hover_reports_move_legality() {
        let game = started();
        let mut sel = Selection::new();
        assert_eq!(sel.hover(&game, sq("g1"), None), Highlight::Selectable);
        sel.click(&game, sq("g1"), None);
        assert_eq!(sel.hover(&game, sq("f3"), None), Highlight::Move);
        assert!(matches!(
            sel.hover(&game, sq("g3"), None),
            Highlight::Illegal(RuleViolation::IllegalPattern { .. })
        ));
    }
}
