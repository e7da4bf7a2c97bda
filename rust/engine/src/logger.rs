use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::game::{EndCause, MatchResult};
use crate::pieces::{PieceKind, Side};

/// One applied move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub turn: u32,
    pub side: Side,
    pub piece: PieceKind,
    pub from: Coordinate,
    pub to: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<PieceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_to: Option<PieceKind>,
    #[serde(default)]
    pub castling: bool,
    #[serde(default)]
    pub en_passant: bool,
    #[serde(default)]
    pub teleport: bool,
}

/// A whole match, one JSON object per line in the match log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// `YYYYMMDD-NNNNNN`
    pub match_id: String,
    pub initial_layout: String,
    pub starting_side: Side,
    /// Display names indexed by side.
    pub players: [String; 2],
    pub moves: Vec<MoveRecord>,
    pub final_layout: String,
    pub result: Option<MatchResult>,
    #[serde(default)]
    pub cause: Option<EndCause>,
    /// RFC3339, filled in by [`MatchLogger::write`] when missing.
    #[serde(default)]
    pub ts: Option<String>,
}

pub fn format_match_id(yyyymmdd: &str, seq: u32) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

/// Appends [`MatchRecord`]s to a JSONL file.
pub struct MatchLogger {
    writer: Option<BufWriter<File>>,
    date: String,
    seq: u32,
}

impl MatchLogger {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            date: Utc::now().format("%Y%m%d").to_string(),
            seq: 0,
        })
    }

    /// A logger that only hands out ids, with a fixed date.
    pub fn detached(date: &str) -> Self {
        Self {
            writer: None,
            date: date.to_string(),
            seq: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        format_match_id(&self.date, self.seq)
    }

    pub fn write(&mut self, record: &MatchRecord) -> std::io::Result<()> {
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        Ok(())
    }
}
