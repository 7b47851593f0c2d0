//! Command orchestration for the `filesort` binary.
//!
//! This is the presentation side of the engine: it loads the category table
//! and filter rules, decides which categories are enabled, drives a
//! [`Relocator`] with a progress bar, prints the summary and records the
//! journal used by `--undo`.

use crate::category::{CategoryTable, EnabledSet};
use crate::config::{FilterConfig, default_table_path};
use crate::filter::EntryFilter;
use crate::history::History;
use crate::organizer::{CollisionPolicy, Relocator, RunSummary};
use crate::output::{BarReporter, OutputFormatter};
use crate::progress::NoProgress;
use crate::undo::UndoManager;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeCommand {
    /// Sort the files of a directory.
    Organize {
        /// If true, only report what would happen.
        dry_run: bool,
    },
    /// Reverse the last recorded run.
    Undo,
    /// Print the category table.
    ListCategories,
}

/// Options shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Category table location. Defaults to `~/.config/filesort/filetypes.json`.
    pub categories_path: Option<PathBuf>,
    /// Filter rules location. See [`FilterConfig::load`] for the fallbacks.
    pub filters_path: Option<PathBuf>,
    /// Enable only these categories. Empty means all.
    pub only: Vec<String>,
    /// Disable these categories.
    pub skip: Vec<String>,
    pub on_conflict: CollisionPolicy,
    /// No progress bar and no summary.
    pub quiet: bool,
    /// List every file in the summary.
    pub verbose: bool,
}

/// Runs `command` on `dir_path` with default settings.
///
/// # Examples
///
/// ```no_run
/// use filesort::cli::{OrganizeCommand, run_cli};
/// use std::path::Path;
///
/// if let Err(e) = run_cli(OrganizeCommand::Organize { dry_run: true }, Path::new("/path/to/dir")) {
///     eprintln!("Error: {:#}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, dir_path: &Path) -> Result<()> {
    run_cli_with_settings(command, dir_path, &Settings::default())
}

pub fn run_cli_with_settings(
    command: OrganizeCommand,
    dir_path: &Path,
    settings: &Settings,
) -> Result<()> {
    match command {
        OrganizeCommand::Organize { dry_run } => {
            organize_directory(dir_path, settings, dry_run).map(|_| ())
        }
        OrganizeCommand::Undo => undo_organization(dir_path),
        OrganizeCommand::ListCategories => list_categories(settings),
    }
}

/// Loads the category table named by `settings`, writing the defaults if absent.
pub fn load_table(settings: &Settings) -> Result<CategoryTable> {
    let path = settings
        .categories_path
        .clone()
        .unwrap_or_else(default_table_path);
    CategoryTable::load(&path).context("Error loading category table")
}

/// Applies `--only` and `--skip` to the categories of `table`.
pub fn enabled_categories(table: &CategoryTable, settings: &Settings) -> EnabledSet {
    let mut enabled = if settings.only.is_empty() {
        EnabledSet::all(table)
    } else {
        settings.only.iter().cloned().collect()
    };
    for name in &settings.skip {
        enabled.remove(name);
    }

    for name in enabled.unknown_in(table) {
        warn!(category = name, "unknown category ignored");
    }
    enabled
}

/// Sorts `base_path` and returns the run summary.
///
/// Steps:
/// 1. Load the category table and the filter rules
/// 2. Resolve the enabled categories
/// 3. Run the relocation engine with a progress bar
/// 4. Print the summary
/// 5. Record the moves for undo (real runs that moved something)
pub fn organize_directory(
    base_path: &Path,
    settings: &Settings,
    dry_run: bool,
) -> Result<RunSummary> {
    let table = load_table(settings)?;
    let enabled = enabled_categories(&table, settings);
    let filter_config =
        FilterConfig::load(settings.filters_path.as_deref()).context("Error loading filter rules")?;
    let filter = EntryFilter::compile(&filter_config).context("Error compiling filter rules")?;

    if !settings.quiet {
        if dry_run {
            OutputFormatter::dry_run_notice(&format!("Analyzing {}", base_path.display()));
        } else {
            OutputFormatter::info(&format!("Sorting contents of: {}", base_path.display()));
        }
    }

    let relocator = Relocator::new(&table, &enabled)
        .filter(filter)
        .collision_policy(settings.on_conflict)
        .dry_run(dry_run);

    let summary = if settings.quiet {
        relocator.run(base_path, &mut NoProgress)?
    } else {
        let mut bar = BarReporter::new();
        let result = relocator.run(base_path, &mut bar);
        bar.finish();
        result?
    };

    if !settings.quiet {
        OutputFormatter::run_summary(&summary, settings.verbose);
    }

    if dry_run {
        if !settings.quiet {
            OutputFormatter::dry_run_notice("No files were modified.");
        }
        return Ok(summary);
    }

    if summary.moved() > 0 {
        match History::from_summary(base_path, &summary).save(base_path) {
            Ok(()) if !settings.quiet => OutputFormatter::success(&format!(
                "History saved. Use 'filesort {} --undo' to revert changes.",
                base_path.display()
            )),
            Ok(()) => {}
            Err(e) => OutputFormatter::warning(&format!(
                "Could not save history, undo will not be available: {}",
                e
            )),
        }
    }

    if !summary.is_complete_success() && !settings.quiet {
        OutputFormatter::warning("Some files could not be moved. Please review errors above.");
    }

    Ok(summary)
}

fn undo_organization(base_path: &Path) -> Result<()> {
    OutputFormatter::info("Undoing previous run...");

    let report = UndoManager::undo(base_path)
        .with_context(|| format!("Error undoing run in {}", base_path.display()))?;
    OutputFormatter::undo_report(&report);

    if !report.is_complete_success() {
        OutputFormatter::warning("History file was kept because some files were not restored.");
    }
    Ok(())
}

fn list_categories(settings: &Settings) -> Result<()> {
    let table = load_table(settings)?;
    let enabled = enabled_categories(&table, settings);
    OutputFormatter::category_table(&table, &enabled);
    Ok(())
}
