//! Reverting the last sorting run of a directory.
//!
//! Undo replays the journal written by the CLI in reverse order, moving each
//! file from its category directory back to where it was found. Category
//! directories the run created are removed if they are empty afterwards;
//! directories that existed before the run are kept.

use crate::history::{History, HistoryError, MoveRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of an undo.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files moved back.
    pub restored_files: usize,
    /// Files already back at their original location, from an earlier partial undo.
    pub already_restored: usize,
    /// Files that could not be moved back, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files no longer at their recorded location.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    pub fn total_processed(&self) -> usize {
        self.restored_files
            + self.already_restored
            + self.failed_restores.len()
            + self.skipped_files.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

enum Restored {
    Moved,
    AlreadyInPlace,
}

enum RestoreError {
    Missing(PathBuf),
    Failed(PathBuf, String),
}

pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent run recorded for `base_path`.
    ///
    /// * **File back at its original location already**: counted as
    ///   already restored, so a retried undo can finish.
    /// * **File no longer in its category directory**: skipped.
    /// * **Name taken at the original location**: the occupant is renamed
    ///   to `<name>.bak.<timestamp>` first.
    /// * **Any other I/O failure**: recorded as a failed restore.
    ///
    /// The journal is deleted only when every file was restored.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesort::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/directory")) {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(base_path: &Path) -> Result<UndoReport, HistoryError> {
        let history =
            History::load(base_path)?.ok_or_else(|| HistoryError::NotFound(base_path.to_path_buf()))?;

        let mut report = UndoReport::default();

        for record in history.moves.iter().rev() {
            match Self::restore_file(record) {
                Ok(Restored::Moved) => report.restored_files += 1,
                Ok(Restored::AlreadyInPlace) => report.already_restored += 1,
                Err(RestoreError::Missing(path)) => report
                    .skipped_files
                    .push((path, "file not found at recorded location".to_string())),
                Err(RestoreError::Failed(path, reason)) => {
                    warn!(path = %path.display(), %reason, "restore failed");
                    report.failed_restores.push((path, reason));
                }
            }
        }

        for dir in history.created_dirs.iter().rev() {
            // Only succeeds for directories that are now empty.
            if fs::remove_dir(dir).is_ok() {
                debug!(dir = %dir.display(), "removed empty category directory");
            }
        }

        if report.is_complete_success() {
            History::delete(base_path)?;
        }

        Ok(report)
    }

    fn restore_file(record: &MoveRecord) -> Result<Restored, RestoreError> {
        if fs::symlink_metadata(&record.to).is_err() {
            if fs::symlink_metadata(&record.from).is_ok() {
                return Ok(Restored::AlreadyInPlace);
            }
            return Err(RestoreError::Missing(record.to.clone()));
        }

        if fs::symlink_metadata(&record.from).is_ok() {
            let backup_path = Self::backup_path(&record.from);
            fs::rename(&record.from, &backup_path).map_err(|e| {
                RestoreError::Failed(
                    record.from.clone(),
                    format!("could not back up conflicting file: {}", e),
                )
            })?;
            warn!(
                path = %record.from.display(),
                backup = %backup_path.display(),
                "original location was occupied, backed up existing file"
            );
        }

        fs::rename(&record.to, &record.from).map_err(|e| {
            RestoreError::Failed(record.to.clone(), format!("failed to restore file: {}", e))
        })?;
        Ok(Restored::Moved)
    }

    /// `file.txt` becomes `file.txt.bak.20251109-143052`.
    fn backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{CategoryTable, EnabledSet};
    use crate::organizer::relocate;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    fn sort_and_record(base_path: &Path) {
        let table = CategoryTable::default();
        let enabled = EnabledSet::all(&table);
        let summary = relocate(base_path, &table, &enabled, &mut NoProgress).unwrap();
        History::from_summary(base_path, &summary)
            .save(base_path)
            .expect("Failed to save history");
    }

    #[test]
    fn test_undo_no_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = UndoManager::undo(temp_dir.path());
        assert!(matches!(result, Err(HistoryError::NotFound(_))));
    }

    #[test]
    fn test_undo_restores_files_and_removes_empty_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("image.png"), "image data").unwrap();
        fs::write(base_path.join("document.pdf"), "pdf data").unwrap();

        sort_and_record(base_path);
        assert!(base_path.join("images").join("image.png").exists());

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 2);
        assert!(report.is_complete_success());
        assert!(base_path.join("image.png").exists());
        assert!(base_path.join("document.pdf").exists());
        assert!(!base_path.join("images").exists());
        assert!(!base_path.join("pdfs").exists());
        assert!(!History::file_path(base_path).exists());
    }

    #[test]
    fn test_undo_keeps_non_empty_category_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.txt"), "a").unwrap();

        sort_and_record(base_path);
        fs::write(base_path.join("text").join("added-later.txt"), "b").unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");
        assert_eq!(report.restored_files, 1);
        assert!(base_path.join("text").join("added-later.txt").exists());
    }

    #[test]
    fn test_undo_keeps_category_dir_that_existed_before() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::create_dir(base_path.join("images")).unwrap();
        fs::write(base_path.join("a.jpg"), "a").unwrap();
        fs::write(base_path.join("b.pdf"), "b").unwrap();

        sort_and_record(base_path);
        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 2);
        assert!(base_path.join("images").is_dir());
        assert!(!base_path.join("pdfs").exists());
    }

    #[test]
    fn test_retry_after_partial_undo_clears_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.jpg"), "a").unwrap();
        fs::write(base_path.join("b.pdf"), "b").unwrap();

        sort_and_record(base_path);
        // One file was put back by hand before the undo
        fs::rename(
            base_path.join("images").join("a.jpg"),
            base_path.join("a.jpg"),
        )
        .unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 1);
        assert_eq!(report.already_restored, 1);
        assert!(report.is_complete_success());
        assert_eq!(report.total_processed(), 2);
        assert!(!History::file_path(base_path).exists());
        assert_eq!(fs::read_to_string(base_path.join("a.jpg")).unwrap(), "a");
    }

    #[test]
    fn test_undo_with_file_name_conflict() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "original content").unwrap();

        sort_and_record(base_path);
        fs::write(&file_path, "new content").unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 1);
        assert!(report.failed_restores.is_empty());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "original content");

        let backups = fs::read_dir(base_path)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".bak."))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_undo_with_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let mut history = History::new(base_path.to_path_buf());
        history.moves.push(MoveRecord {
            from: base_path.join("nonexistent.txt"),
            to: base_path.join("text").join("nonexistent.txt"),
            category: "Text".to_string(),
        });
        history.save(base_path).unwrap();

        let report = UndoManager::undo(base_path).expect("Undo failed");

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(report.total_processed(), 1);
        // Kept so the user can retry
        assert!(History::file_path(base_path).exists());
    }
}
