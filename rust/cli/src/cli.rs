//! Command-line argument definitions.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "netchess",
    version,
    about = "Networked chess console: hotseat, peer-to-peer and spectating"
)]
pub struct NetchessCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive console
    Play {
        #[command(flatten)]
        config: ConfigArgs,
        /// Read console lines from this file instead of stdin, then quit
        #[arg(long)]
        script: Option<PathBuf>,
        /// Append each finished match to this JSONL file
        #[arg(long)]
        record: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = LogFormatArg::Text)]
        log_format: LogFormatArg,
    },
    /// Validate and draw a board layout
    Board {
        /// 64-character layout, A1 first; defaults to the configured layout
        #[arg(long)]
        layout: Option<String>,
    },
    /// Show the resolved configuration and where each value came from
    Cfg {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

/// Flags that override configuration values.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Display name to claim when hosting or joining
    #[arg(long)]
    pub name: Option<String>,
    /// Address Connect falls back to
    #[arg(long)]
    pub ip: Option<IpAddr>,
    /// Port Listen and Connect fall back to
    #[arg(long)]
    pub port: Option<u16>,
    /// Layout new matches start from
    #[arg(long)]
    pub layout: Option<String>,
    /// Promote to a queen without asking when a click reaches the last rank
    #[arg(long, action = ArgAction::Set)]
    pub auto_promote: Option<bool>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}
