//! `board` command: check a layout string and draw it.

use std::io::Write;

use netchess_engine::board::BoardLayout;
use netchess_engine::pieces::Side;

use crate::error::CliError;
use crate::ui;

pub fn handle_board_command(
    layout: &str,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let board = match BoardLayout::parse(layout) {
        Ok(b) => b,
        Err(e) => {
            ui::write_error(err, &e.to_string())?;
            return Err(CliError::InvalidInput(e.to_string()));
        }
    };

    write!(out, "{}", board.render())?;
    let count = |side: Side| board.pieces().iter().filter(|p| p.side == side).count();
    writeln!(
        out,
        "{} pieces: {} white, {} black",
        board.pieces().len(),
        count(Side::White),
        count(Side::Black)
    )?;
    for side in [Side::White, Side::Black] {
        if board.king_of(side).is_none() {
            ui::display_warning(err, &format!("{} has no king", side))?;
        }
    }
    Ok(())
}
