//! Command handler modules.
//!
//! Each subcommand lives in its own file and exposes one
//! `handle_COMMAND_command(...) -> Result<(), CliError>` that writes to the
//! streams it is given.

pub mod board;
pub mod cfg;
pub mod play;

pub use board::handle_board_command;
pub use cfg::handle_cfg_command;
pub use play::handle_play_command;
