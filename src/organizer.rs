//! Relocation engine: moves the files of one directory into category subdirectories.
//!
//! A run takes a snapshot of the directory's immediate entries, then walks it
//! once. Each regular file is classified and moved into
//! `<target>/<lowercase category>/`. A failure on one file is recorded in the
//! [`RunSummary`] and the run continues with the next entry.
//!
//! Entries created during the run (such as the category directories) are not
//! part of the snapshot and are never processed.

use crate::category::{CategoryTable, EnabledSet, is_plain_dir_name};
use crate::classifier::{classify, file_extension};
use crate::filter::EntryFilter;
use crate::progress::{Progress, ProgressReporter};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a run could not start. Nothing on disk is touched when this is returned.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("could not read directory {}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: io::Error },
}

/// Why a single file could not be moved.
#[derive(Debug, Error)]
pub enum EntryErrorKind {
    #[error("could not create {}: {source}", .path.display())]
    DirectoryCreation { path: PathBuf, source: io::Error },

    #[error("could not move to {}: {source}", .destination.display())]
    MoveFailed {
        destination: PathBuf,
        source: io::Error,
    },

    /// The destination is occupied and the collision policy refused to replace it.
    #[error("{} already exists", .destination.display())]
    Collision { destination: PathBuf },

    /// The category name is not a single directory name, such as `..` or `a/b`.
    #[error("category '{category}' cannot be used as a directory name")]
    InvalidCategory { category: String },
}

/// A per-file failure recorded in [`RunSummary::errors`].
#[derive(Debug, Error)]
#[error("{name}: {kind}")]
pub struct EntryError {
    pub name: String,
    pub kind: EntryErrorKind,
}

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CollisionPolicy {
    /// Replace the existing file.
    Overwrite,
    /// Leave the source where it is and record a collision error.
    Skip,
    /// Pick a free name such as `photo (1).jpg`.
    #[default]
    Rename,
}

/// Why an entry was left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// Directories, symlinks to directories, broken links and special files.
    NotRegularFile,
    /// Unknown extension, or its category is not enabled.
    NoMatchingCategory,
    /// Rejected by the filter rules.
    Excluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NotRegularFile => "not a regular file",
            SkipReason::NoMatchingCategory => "no matching enabled category",
            SkipReason::Excluded => "excluded by filter rules",
        };
        f.write_str(text)
    }
}

/// One entry of the directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: PathBuf,
    /// Follows symlinks: a link to a regular file counts as one.
    pub is_regular_file: bool,
    /// Lower-cased suffix with its dot, or empty.
    pub extension: String,
}

impl DirectoryEntry {
    fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_regular_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
        let extension = file_extension(&name);

        Self {
            name,
            path,
            is_regular_file,
            extension,
        }
    }
}

/// A file that was moved, or would be in a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub name: String,
    pub category: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub name: String,
    pub reason: SkipReason,
}

/// Result of one run.
///
/// Every snapshot entry ends up in exactly one of `relocations`, `skips` or
/// `errors`, so `moved() + skipped() + failed() == total`.
#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub dry_run: bool,
    pub relocations: Vec<Relocation>,
    pub skips: Vec<Skip>,
    pub errors: Vec<EntryError>,
    /// Category directories that did not exist before this run.
    pub created_dirs: Vec<PathBuf>,
}

impl RunSummary {
    fn new(total: usize, dry_run: bool) -> Self {
        Self {
            total,
            dry_run,
            relocations: Vec::new(),
            skips: Vec::new(),
            errors: Vec::new(),
            created_dirs: Vec::new(),
        }
    }

    pub fn moved(&self) -> usize {
        self.relocations.len()
    }

    pub fn skipped(&self) -> usize {
        self.skips.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Number of skips with the given reason.
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skips.iter().filter(|s| s.reason == reason).count()
    }

    /// Moved files per category directory.
    pub fn moved_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for relocation in &self.relocations {
            *counts
                .entry(relocation.category.to_lowercase())
                .or_insert(0) += 1;
        }
        counts
    }

    pub fn is_complete_success(&self) -> bool {
        self.errors.is_empty()
    }

    fn progress(&self, processed: usize) -> Progress {
        Progress {
            processed,
            total: self.total,
            moved: self.moved(),
            skipped: self.skipped(),
            failed: self.failed(),
        }
    }
}

/// Configurable relocation run over a borrowed table and enabled set.
///
/// # Examples
///
/// ```no_run
/// use filesort::category::{CategoryTable, EnabledSet};
/// use filesort::organizer::{CollisionPolicy, Relocator};
/// use filesort::progress::Progress;
/// use std::path::Path;
///
/// let table = CategoryTable::default();
/// let enabled = EnabledSet::all(&table);
/// let summary = Relocator::new(&table, &enabled)
///     .collision_policy(CollisionPolicy::Skip)
///     .run(Path::new("/home/me/Downloads"), &mut |p: Progress| {
///         println!("{}/{}", p.processed, p.total)
///     })?;
/// println!("moved {}, skipped {}", summary.moved(), summary.skipped());
/// # Ok::<(), filesort::organizer::DirectoryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Relocator<'a> {
    table: &'a CategoryTable,
    enabled: &'a EnabledSet,
    filter: Option<EntryFilter>,
    collision_policy: CollisionPolicy,
    dry_run: bool,
}

impl<'a> Relocator<'a> {
    pub fn new(table: &'a CategoryTable, enabled: &'a EnabledSet) -> Self {
        Self {
            table,
            enabled,
            filter: None,
            collision_policy: CollisionPolicy::default(),
            dry_run: false,
        }
    }

    /// Skips entries the filter rejects, before classification.
    pub fn filter(mut self, filter: EntryFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Plans the run without creating directories or moving files.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sorts the immediate entries of `target`.
    ///
    /// `reporter` is called after every entry, in order, on this thread.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] if `target` is missing, is not a directory
    /// or cannot be listed. Per-file failures are not errors of the run; they
    /// are collected in [`RunSummary::errors`].
    pub fn run<R>(&self, target: &Path, reporter: &mut R) -> Result<RunSummary, DirectoryError>
    where
        R: ProgressReporter + ?Sized,
    {
        check_target(target)?;
        let entries = snapshot(target)?;

        let mut summary = RunSummary::new(entries.len(), self.dry_run);
        info!(
            dir = %target.display(),
            total = summary.total,
            dry_run = self.dry_run,
            "sorting directory"
        );

        for (index, entry) in entries.iter().enumerate() {
            self.process(target, entry, &mut summary);
            reporter.report(summary.progress(index + 1));
        }

        info!(
            moved = summary.moved(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "run finished"
        );
        Ok(summary)
    }

    fn process(&self, target: &Path, entry: &DirectoryEntry, summary: &mut RunSummary) {
        let skip = |summary: &mut RunSummary, reason: SkipReason| {
            debug!(file = %entry.name, %reason, "skipped");
            summary.skips.push(Skip {
                name: entry.name.clone(),
                reason,
            });
        };

        if !entry.is_regular_file {
            return skip(summary, SkipReason::NotRegularFile);
        }

        if let Some(filter) = &self.filter
            && !filter.allows(&entry.name)
        {
            return skip(summary, SkipReason::Excluded);
        }

        let Some(category) = classify(&entry.name, self.table, self.enabled) else {
            return skip(summary, SkipReason::NoMatchingCategory);
        };

        match self.move_entry(target, entry, category, &mut summary.created_dirs) {
            Ok(to) => {
                info!(file = %entry.name, category, to = %to.display(), "moved");
                summary.relocations.push(Relocation {
                    name: entry.name.clone(),
                    category: category.to_string(),
                    from: entry.path.clone(),
                    to,
                });
            }
            Err(kind) => {
                warn!(file = %entry.name, error = %kind, "could not move file");
                summary.errors.push(EntryError {
                    name: entry.name.clone(),
                    kind,
                });
            }
        }
    }

    /// Moves `entry` into the directory of `category` and returns where it landed.
    ///
    /// A category directory this call creates is pushed onto `created_dirs`.
    fn move_entry(
        &self,
        target: &Path,
        entry: &DirectoryEntry,
        category: &str,
        created_dirs: &mut Vec<PathBuf>,
    ) -> Result<PathBuf, EntryErrorKind> {
        let dir_name = category.to_lowercase();
        if !is_plain_dir_name(&dir_name) {
            return Err(EntryErrorKind::InvalidCategory {
                category: category.to_string(),
            });
        }
        let category_dir = target.join(dir_name);
        let file_name = entry
            .path
            .file_name()
            .unwrap_or_else(|| OsStr::new(&entry.name));

        match fs::metadata(&category_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                // create_dir_all would fail the same way
                return Err(EntryErrorKind::DirectoryCreation {
                    path: category_dir,
                    source: io::Error::from(io::ErrorKind::AlreadyExists),
                });
            }
            Err(_) if self.dry_run => {}
            Err(_) => {
                fs::create_dir_all(&category_dir).map_err(|source| {
                    EntryErrorKind::DirectoryCreation {
                        path: category_dir.clone(),
                        source,
                    }
                })?;
                debug!(dir = %category_dir.display(), "created category directory");
                created_dirs.push(category_dir.clone());
            }
        }

        let destination = resolve_collision(category_dir.join(file_name), self.collision_policy)?;
        if self.dry_run {
            return Ok(destination);
        }

        move_file(&entry.path, &destination).map_err(|source| EntryErrorKind::MoveFailed {
            destination: destination.clone(),
            source,
        })?;
        Ok(destination)
    }
}

/// Sorts `target` with every option at its default and no filter rules.
pub fn relocate<R>(
    target: &Path,
    table: &CategoryTable,
    enabled: &EnabledSet,
    reporter: &mut R,
) -> Result<RunSummary, DirectoryError>
where
    R: ProgressReporter + ?Sized,
{
    Relocator::new(table, enabled).run(target, reporter)
}

fn check_target(target: &Path) -> Result<(), DirectoryError> {
    match fs::metadata(target) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DirectoryError::NotADirectory(target.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(DirectoryError::NotFound(target.to_path_buf()))
        }
        Err(e) => Err(DirectoryError::Unreadable {
            path: target.to_path_buf(),
            source: e,
        }),
    }
}

/// Lists the immediate entries of `target`, sorted by name.
pub fn snapshot(target: &Path) -> Result<Vec<DirectoryEntry>, DirectoryError> {
    let unreadable = |source| DirectoryError::Unreadable {
        path: target.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(target)
        .map_err(unreadable)?
        .map(|entry| entry.map(|e| DirectoryEntry::from_path(e.path())))
        .collect::<Result<Vec<_>, _>>()
        .map_err(unreadable)?;

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn resolve_collision(
    destination: PathBuf,
    policy: CollisionPolicy,
) -> Result<PathBuf, EntryErrorKind> {
    let Ok(existing) = fs::symlink_metadata(&destination) else {
        return Ok(destination);
    };

    match policy {
        CollisionPolicy::Rename => Ok(unique_destination(&destination)),
        CollisionPolicy::Overwrite if existing.is_file() => {
            warn!(path = %destination.display(), "overwriting existing file");
            Ok(destination)
        }
        CollisionPolicy::Overwrite | CollisionPolicy::Skip => {
            Err(EntryErrorKind::Collision { destination })
        }
    }
}

/// Returns the first free `stem (n).ext` next to `candidate`.
fn unique_destination(candidate: &Path) -> PathBuf {
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| candidate.with_file_name(format!("{} ({}){}", stem, n, ext)))
        .find(|path| fs::symlink_metadata(path).is_err())
        .unwrap_or_else(|| candidate.to_path_buf())
}

/// Renames `from` to `to`, copying across filesystems when rename cannot.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "rename crosses devices, copying instead");
            fs::copy(from, to)?;
            if let Err(e) = fs::remove_file(from) {
                // Leave exactly one copy behind.
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        result => result,
    }
}
