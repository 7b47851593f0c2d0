//! Extension-based classification.
//!
//! Classification is a pure function of the file name, the table and the
//! enabled set. No file content is read.
//!
//! # Examples
//!
//! ```
//! use filesort::category::{CategoryTable, EnabledSet};
//! use filesort::classifier::classify;
//!
//! let table = CategoryTable::default();
//! let enabled = EnabledSet::all(&table);
//! assert_eq!(classify("Holiday.JPG", &table, &enabled), Some("Images"));
//! assert_eq!(classify("README", &table, &enabled), None);
//! ```

use crate::category::CategoryTable;
use crate::category::EnabledSet;

/// Returns the lower-cased last suffix of `file_name`, dot included.
///
/// Names without a dot, dotfiles like `.bashrc` and names ending in a dot
/// have no extension and yield an empty string.
///
/// ```
/// use filesort::classifier::file_extension;
///
/// assert_eq!(file_extension("archive.TAR.GZ"), ".gz");
/// assert_eq!(file_extension(".bashrc"), "");
/// assert_eq!(file_extension("Makefile"), "");
/// ```
pub fn file_extension(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) if idx + 1 == file_name.len() => String::new(),
        Some(idx) => file_name[idx..].to_lowercase(),
    }
}

/// Decides the single category `file_name` belongs to, if any.
///
/// Categories are tried in table order and the first enabled category that
/// lists the extension wins.
pub fn classify<'t>(
    file_name: &str,
    table: &'t CategoryTable,
    enabled: &EnabledSet,
) -> Option<&'t str> {
    let extension = file_extension(file_name);
    if extension.is_empty() {
        return None;
    }

    table
        .iter()
        .find(|category| enabled.contains(category.name()) && category.contains(&extension))
        .map(|category| category.name())
}
