//! # netchess CLI Library
//!
//! Console front end for the netchess protocol: play hotseat or over TCP,
//! inspect board layouts and show the resolved configuration.
//!
//! ## Main Entry Point
//!
//! The primary entry point is the [`run`] function, which parses command-line arguments
//! and executes the appropriate subcommand.
//!
//! ## Available Subcommands
//!
//! - `play`: Run the interactive console (stdin, or `--script FILE`)
//! - `board`: Validate and draw a 64-character layout
//! - `cfg`: Display the configuration and the source of each value

use clap::Parser;
use std::io::Write;
pub mod cli;
mod commands;
mod config;
mod error;
pub mod exit_code;
pub mod io_utils;
pub mod ui;
pub mod validation;

use cli::{ConfigArgs, LogFormatArg, NetchessCli, Commands};
use commands::{handle_board_command, handle_cfg_command, handle_play_command};
use netchess_net::LogFormat;

pub use commands::play::{ConsolePresenter, ConsoleSession, Flow};
pub use config::{Config, ValueSource};
pub use error::CliError;

/// Main entry point for the CLI application.
///
/// # Returns
///
/// Exit code: `0` for success, `2` for errors, `130` for interruptions
///
/// # Example
///
/// ```
/// use std::io;
/// let args = vec!["netchess", "board"];
/// let code = netchess_cli::run(args, &mut io::stdout(), &mut io::stderr());
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    const COMMANDS: &[&str] = &["play", "board", "cfg"];
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let parsed = NetchessCli::try_parse_from(&argv);
    match parsed {
        Err(e) => {
            use clap::error::ErrorKind;

            // Help and version should print to stdout and exit 0
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if write!(out, "{}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::SUCCESS
                }
                _ => {
                    if writeln!(err, "{}", e).is_err()
                        || writeln!(err).is_err()
                        || writeln!(err, "netchess console").is_err()
                        || writeln!(err, "Usage: netchess <command> [options]\n").is_err()
                        || writeln!(err, "Commands:").is_err()
                    {
                        return exit_code::ERROR;
                    }
                    for c in COMMANDS {
                        if writeln!(err, "  {}", c).is_err() {
                            return exit_code::ERROR;
                        }
                    }
                    if writeln!(err, "\nFor full help, run: netchess --help").is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::ERROR
                }
            }
        }
        Ok(cli) => {
            let result = match cli.cmd {
                Commands::Cfg { config } => handle_cfg_command(&config, out, err),
                Commands::Board { layout } => match layout {
                    Some(layout) => handle_board_command(&layout, out, err),
                    None => resolve(&ConfigArgs::default(), err)
                        .and_then(|c| handle_board_command(&c.layout, out, err)),
                },
                Commands::Play {
                    config,
                    script,
                    record,
                    log_format,
                } => {
                    let format = match log_format {
                        LogFormatArg::Text => LogFormat::Text,
                        LogFormatArg::Json => LogFormat::Json,
                    };
                    resolve(&config, err)
                        .and_then(|c| handle_play_command(c, script, record, format, out, err))
                }
            };
            match result {
                Ok(()) => exit_code::SUCCESS,
                Err(CliError::Interrupted(_)) => exit_code::INTERRUPTED,
                // already reported where they were detected
                Err(CliError::Config(_) | CliError::InvalidInput(_)) => exit_code::ERROR,
                Err(e) => {
                    if writeln!(err, "Error: {}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::ERROR
                }
            }
        }
    }
}

fn resolve(overrides: &ConfigArgs, err: &mut dyn Write) -> Result<Config, CliError> {
    match config::load_with_sources(overrides) {
        Ok(resolved) => Ok(resolved.config),
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            Err(CliError::Config(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_lists_commands() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(["netchess", "deal"], &mut out, &mut err);
        assert_eq!(code, exit_code::ERROR);
        let stderr = String::from_utf8(err).unwrap();
        for c in ["play", "board", "cfg"] {
            assert!(stderr.contains(&format!("  {}", c)));
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_version_goes_to_stdout() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(["netchess", "--version"], &mut out, &mut err);
        assert_eq!(code, exit_code::SUCCESS);
        assert!(String::from_utf8(out).unwrap().starts_with("netchess "));
    }
}
