//! Durable conversation memory
//!
//! An append-only in-memory log of turns, persisted by overwriting a single
//! JSON file with the full ordered turn list after every turn. The
//! representation is total, so persisting is idempotent and safe to repeat.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::turn::Turn;

/// Append-only conversation log with whole-file persistence
#[derive(Debug)]
pub struct ConversationMemory {
    path: PathBuf,
    turns: Vec<Turn>,
}

impl ConversationMemory {
    /// Create an empty log that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            turns: Vec::new(),
        }
    }

    /// Load a log from `path`, or start empty if the file does not exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let turns = if path.exists() {
            let file = File::open(&path)?;
            serde_json::from_reader(BufReader::new(file))?
        } else {
            Vec::new()
        };

        Ok(Self { path, turns })
    }

    /// Append a turn to the in-memory log
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The last `n` turns (or fewer), oldest first
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns in the log
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Overwrite the log file with the full turn list
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.turns)?;
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
