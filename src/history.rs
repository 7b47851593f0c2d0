//! Journal of the moves made by the last sorting run, used by undo.
//!
//! The journal is stored as `.filesort_history.json` inside the sorted
//! directory. It is written after a real run that moved at least one file
//! and deleted once an undo restores everything.

use crate::organizer::{Relocation, RunSummary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the journal file inside the sorted directory.
pub const HISTORY_FILE_NAME: &str = ".filesort_history.json";

/// Errors reading or writing the journal.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no previous run found to undo in {0}")]
    NotFound(PathBuf),

    #[error("failed to read history file: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write history file: {0}")]
    Write(#[source] io::Error),

    #[error("invalid history file format: {0}")]
    Format(#[from] serde_json::Error),
}

/// One recorded move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: PathBuf,
    pub to: PathBuf,
    pub category: String,
}

impl From<&Relocation> for MoveRecord {
    fn from(relocation: &Relocation) -> Self {
        Self {
            from: relocation.from.clone(),
            to: relocation.to.clone(),
            category: relocation.category.clone(),
        }
    }
}

/// All moves of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    /// RFC 3339 time the run finished.
    pub timestamp: String,
    pub base_path: PathBuf,
    pub moves: Vec<MoveRecord>,
    /// Category directories the run created, removed again by undo if empty.
    #[serde(default)]
    pub created_dirs: Vec<PathBuf>,
}

impl History {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_path,
            moves: Vec::new(),
            created_dirs: Vec::new(),
        }
    }

    /// Builds the journal of a finished run.
    pub fn from_summary(base_path: &Path, summary: &RunSummary) -> Self {
        let mut history = Self::new(base_path.to_path_buf());
        history.moves = summary.relocations.iter().map(MoveRecord::from).collect();
        history.created_dirs = summary.created_dirs.clone();
        history
    }

    pub fn file_path(base_path: &Path) -> PathBuf {
        base_path.join(HISTORY_FILE_NAME)
    }

    pub fn save(&self, base_path: &Path) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(Self::file_path(base_path), json).map_err(HistoryError::Write)
    }

    /// Loads the journal of `base_path`, or `None` if there is none.
    pub fn load(base_path: &Path) -> Result<Option<Self>, HistoryError> {
        let content = match fs::read_to_string(Self::file_path(base_path)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HistoryError::Read(e)),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn delete(base_path: &Path) -> Result<(), HistoryError> {
        match fs::remove_file(Self::file_path(base_path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HistoryError::Write(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let mut history = History::new(base_path.to_path_buf());
        history.moves.push(MoveRecord {
            from: base_path.join("a.jpg"),
            to: base_path.join("images").join("a.jpg"),
            category: "Images".to_string(),
        });
        history.created_dirs.push(base_path.join("images"));
        history.save(base_path).expect("Failed to save history");

        let loaded = History::load(base_path)
            .expect("Failed to load history")
            .expect("History should exist");
        assert_eq!(loaded.moves, history.moves);
        assert_eq!(loaded.created_dirs, history.created_dirs);
        assert_eq!(loaded.base_path, base_path);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(History::load(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_invalid_format() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(History::file_path(temp_dir.path()), r#"{"moves": 3}"#).unwrap();
        assert!(matches!(
            History::load(temp_dir.path()),
            Err(HistoryError::Format(_))
        ));
    }

    #[test]
    fn test_load_without_created_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let json = r#"{"timestamp": "2025-01-01T00:00:00+00:00", "base_path": "/d", "moves": []}"#;
        fs::write(History::file_path(temp_dir.path()), json).unwrap();

        let loaded = History::load(temp_dir.path()).unwrap().unwrap();
        assert!(loaded.created_dirs.is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        History::new(base_path.to_path_buf()).save(base_path).unwrap();

        History::delete(base_path).expect("First delete failed");
        History::delete(base_path).expect("Second delete failed");
        assert!(!History::file_path(base_path).exists());
    }
}
