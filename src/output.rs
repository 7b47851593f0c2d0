//! Terminal output: colored messages, the progress bar and summary tables.
//!
//! Everything the user reads goes through here; diagnostics go through
//! `tracing` instead.

use crate::category::{CategoryTable, EnabledSet};
use crate::organizer::{RunSummary, SkipReason};
use crate::progress::{Progress, ProgressReporter};
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Prints messages with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message to stderr in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Lists the categories of `table` in precedence order, marking disabled ones.
    pub fn category_table(table: &CategoryTable, enabled: &EnabledSet) {
        Self::header("CATEGORIES");
        let width = table.names().map(str::len).max().unwrap_or(0).max(8);

        for category in table.iter() {
            let extensions = category
                .extensions()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            let name = format!("{:<width$}", category.name(), width = width);
            if enabled.contains(category.name()) {
                println!("  {} {} → {}/", name.bold(), extensions, category.dir_name());
            } else {
                println!("  {} {} {}", name.dimmed(), extensions.dimmed(), "(disabled)".dimmed());
            }
        }
    }

    /// Prints the per-file outcome of a run followed by the totals.
    ///
    /// Moved, skipped and failed files are kept apart so that inaction can be
    /// told from failure.
    pub fn run_summary(summary: &RunSummary, verbose: bool) {
        let (moved_verb, moved_word) = if summary.dry_run {
            ("Would move", "would move")
        } else {
            ("Moved", "moved")
        };

        if verbose {
            for relocation in &summary.relocations {
                println!(
                    " - {} {} {}/",
                    relocation.name,
                    "→".green(),
                    relocation.category.to_lowercase()
                );
            }
            for skip in &summary.skips {
                println!(" - {} {}", skip.name, format!("({})", skip.reason).dimmed());
            }
        }

        for error in &summary.errors {
            Self::error(&error.to_string());
        }

        let counts = summary.moved_by_category();
        if !counts.is_empty() {
            Self::header(&format!("{} BY CATEGORY", moved_verb.to_uppercase()));
            let width = counts.keys().map(String::len).max().unwrap_or(0).max(8);
            for (category, count) in &counts {
                println!(
                    "  {:<width$} | {} {}",
                    category,
                    count.to_string().green(),
                    if *count == 1 { "file" } else { "files" },
                    width = width
                );
            }
        }

        Self::header("SUMMARY");
        println!("  {:<10} {}", moved_word, summary.moved().to_string().green().bold());
        println!(
            "  {:<10} {} ({} no matching category, {} not a file, {} excluded)",
            "skipped",
            summary.skipped().to_string().yellow(),
            summary.skipped_for(SkipReason::NoMatchingCategory),
            summary.skipped_for(SkipReason::NotRegularFile),
            summary.skipped_for(SkipReason::Excluded)
        );
        let failed = summary.failed().to_string();
        println!(
            "  {:<10} {}",
            "failed",
            if summary.failed() > 0 {
                failed.red().bold()
            } else {
                failed.normal()
            }
        );
    }

    pub fn undo_report(report: &UndoReport) {
        Self::success(&format!("Restored {} files", report.restored_files));
        if report.already_restored > 0 {
            Self::info(&format!("{} already in place", report.already_restored));
        }

        if !report.skipped_files.is_empty() {
            Self::warning(&format!("Skipped: {}", report.skipped_files.len()));
            for (path, reason) in &report.skipped_files {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed_restores.is_empty() {
            Self::error(&format!("Failed: {}", report.failed_restores.len()));
            for (path, reason) in &report.failed_restores {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }
    }
}

/// A [`ProgressReporter`] drawing an indicatif bar.
///
/// The bar is created lazily on the first update, once the total is known.
#[derive(Default)]
pub struct BarReporter {
    bar: Option<ProgressBar>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_bar(total: u64) -> ProgressBar {
        let bar = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("█▓░"));
        }
        bar
    }

    /// Clears the bar from the terminal.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressReporter for BarReporter {
    fn report(&mut self, progress: Progress) {
        let bar = self
            .bar
            .get_or_insert_with(|| Self::create_bar(progress.total as u64));
        bar.set_position(progress.processed as u64);
        bar.set_message(format!(
            "{} moved, {} skipped, {} failed",
            progress.moved, progress.skipped, progress.failed
        ));
    }
}
