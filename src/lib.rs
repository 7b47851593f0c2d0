//! filesort - sort the files of a directory into category subdirectories
//!
//! Files are classified by extension against an ordered [`CategoryTable`]
//! and moved into `<dir>/<lowercase category>/`. The library exposes the
//! relocation engine, its progress interface, the persisted configuration,
//! and the journal used to undo a run.

pub mod category;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod filter;
pub mod history;
pub mod organizer;
pub mod output;
pub mod progress;
pub mod undo;

pub use category::{Category, CategoryTable, EnabledSet};
pub use classifier::classify;
pub use config::{ConfigError, FilterConfig};
pub use filter::EntryFilter;
pub use history::{History, HistoryError};
pub use organizer::{
    CollisionPolicy, DirectoryError, EntryError, EntryErrorKind, Relocator, RunSummary,
    SkipReason, relocate,
};
pub use progress::{NoProgress, Progress, ProgressReporter};
pub use undo::{UndoManager, UndoReport};

pub use cli::{OrganizeCommand, run_cli};
