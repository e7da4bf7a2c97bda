//! Process exit codes returned by [`crate::run`].

/// The command finished normally.
pub const SUCCESS: i32 = 0;

/// Bad arguments, bad configuration, or a failure while running a command.
pub const ERROR: i32 = 2;

/// The console was stopped with Ctrl+C (128 + SIGINT).
pub const INTERRUPTED: i32 = 130;
