//! Console line parsing.
//!
//! A handful of verbs are handled by the console itself; every other line is
//! a protocol command and is passed through untouched.

use netchess_engine::coord::Coordinate;
use netchess_engine::selection::board_coords_for_point;

/// What a line typed on the console asks for.
#[derive(Debug, PartialEq)]
pub enum ConsoleInput {
    Quit,
    /// Print the session and board summary
    Board,
    Help,
    /// Select a piece, or complete the staged move
    Click(Coordinate),
    Protocol(String),
    Empty,
    Invalid(String),
}

/// Parse one console line.
///
/// `click` takes either a square (`click e2`) or a point on the board plane
/// (`click 4.5 1.2`), which is mapped to the square under it.
///
/// ```rust
/// # use netchess_cli::validation::{parse_console_line, ConsoleInput};
/// assert_eq!(parse_console_line("q"), ConsoleInput::Quit);
/// assert_eq!(
///     parse_console_line("Move from=E2 to=E4"),
///     ConsoleInput::Protocol("Move from=E2 to=E4".into())
/// );
/// assert!(matches!(parse_console_line("click 9 9"), ConsoleInput::Invalid(_)));
/// ```
pub fn parse_console_line(input: &str) -> ConsoleInput {
    let line = input.trim();
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(verb) = parts.first() else {
        return ConsoleInput::Empty;
    };

    match verb.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" if parts.len() == 1 => ConsoleInput::Quit,
        "board" if parts.len() == 1 => ConsoleInput::Board,
        "help" | "?" if parts.len() == 1 => ConsoleInput::Help,
        "click" => parse_click(&parts[1..]),
        _ => ConsoleInput::Protocol(line.to_string()),
    }
}

fn parse_click(args: &[&str]) -> ConsoleInput {
    match args {
        [square] => match square.parse::<Coordinate>() {
            Ok(at) => ConsoleInput::Click(at),
            Err(e) => ConsoleInput::Invalid(e.to_string()),
        },
        [x, y] => {
            let (Ok(x), Ok(y)) = (x.parse::<f32>(), y.parse::<f32>()) else {
                return ConsoleInput::Invalid(format!("Invalid point '{} {}'", x, y));
            };
            match board_coords_for_point(x, y) {
                Some(at) => ConsoleInput::Click(at),
                None => ConsoleInput::Invalid(format!("Point ({}, {}) is off the board", x, y)),
            }
        }
        _ => ConsoleInput::Invalid("Usage: click <square> | click <x> <y>".to_string()),
    }
}

pub const HELP: &str = "\
Console verbs:
  board                 show the session and the board
  click <square>        select a piece, then click its destination
  click <x> <y>         same, with a point on the board plane
  help                  this text
  quit                  leave (tells the peer if a match is running)

Anything else is sent as a command, for example:
  Listen port=3100
  Connect ip=127.0.0.1 port=3100 isSpectator=false
  PlayerInfo name=Alice
  Begin firstPlayer=white
  Move from=E2 to=E4
  OfferDraw | AcceptDraw | RejectDraw | Resign
  Validate
  Disconnect
";

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(parse_console_line("  QUIT "), ConsoleInput::Quit);
        assert_eq!(parse_console_line("Board"), ConsoleInput::Board);
        assert_eq!(parse_console_line("?"), ConsoleInput::Help);
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(parse_console_line("   "), ConsoleInput::Empty);
    }

    #[test]
    fn click_accepts_square_or_point() {
        assert_eq!(parse_console_line("click e2"), ConsoleInput::Click(sq("E2")));
        assert_eq!(parse_console_line("click 4.5 1.2"), ConsoleInput::Click(sq("E2")));
    }

    #[test]
    fn click_rejects_bad_arguments() {
        assert!(matches!(parse_console_line("click"), ConsoleInput::Invalid(_)));
        assert!(matches!(parse_console_line("click z9"), ConsoleInput::Invalid(_)));
        assert!(matches!(parse_console_line("click -1 3"), ConsoleInput::Invalid(_)));
        assert!(matches!(parse_console_line("click a b"), ConsoleInput::Invalid(_)));
    }

    #[test]
    fn verb_with_arguments_is_a_protocol_line() {
        assert_eq!(
            parse_console_line("quit now"),
            ConsoleInput::Protocol("quit now".into())
        );
    }
}
