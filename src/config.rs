//! Configuration loading: the persisted category table and the filter rules.
//!
//! Two files are read at startup:
//!
//! - the category table, a JSON object mapping category names to extension
//!   arrays. It is written with the built-in defaults when it does not exist
//!   and is never rewritten afterwards.
//! - optional filter rules in TOML, deciding which entries are left alone:
//!
//! ```toml
//! [filters]
//! include_hidden = false
//! exclude_names = ["Thumbs.db", ".DS_Store"]
//! exclude_patterns = ["*.part", "~*"]
//! exclude_regex = ['^draft_.*']
//! ```

use crate::category::CategoryTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name of the category table inside the config directory.
pub const TABLE_FILE_NAME: &str = "filetypes.json";

/// File name of the filter rules looked up in the current directory.
pub const LOCAL_FILTERS_FILE_NAME: &str = ".filesortrc.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but does not have the expected structure.
    #[error("configuration file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("could not access configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

/// Returns `~/.config/filesort/<file_name>`, or `<file_name>` in the current
/// directory when `HOME` is not set.
fn config_home_file(file_name: &str) -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home)
            .join(".config")
            .join("filesort")
            .join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Default location of the category table.
pub fn default_table_path() -> PathBuf {
    config_home_file(TABLE_FILE_NAME)
}

impl CategoryTable {
    /// Loads the table from `path`, persisting the defaults there if it is absent.
    ///
    /// A file that exists but cannot be parsed is reported as
    /// [`ConfigError::Corrupt`] and left untouched, so a customized table is
    /// never replaced behind the user's back.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filesort::category::CategoryTable;
    /// use std::path::Path;
    ///
    /// let table = CategoryTable::load(Path::new("filetypes.json"))?;
    /// println!("{} categories", table.len());
    /// # Ok::<(), filesort::ConfigError>(())
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let table = Self::default();
                table.save(path)?;
                info!(path = %path.display(), "wrote default category table");
                return Ok(table);
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let table: Self = serde_json::from_str(&content).map_err(|e| ConfigError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), categories = table.len(), "loaded category table");
        Ok(table)
    }

    /// Writes the table to `path` as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(io_err)
    }
}

/// Filter rules deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: FilterRules,
}

/// Rules deciding which top-level entries are excluded from sorting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Sort files whose name starts with `.`. Off by default.
    #[serde(default)]
    pub include_hidden: bool,

    /// Exact file names to leave alone.
    #[serde(default)]
    pub exclude_names: Vec<String>,

    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Regular expressions matched against the file name.
    #[serde(default)]
    pub exclude_regex: Vec<String>,
}

impl FilterConfig {
    /// Loads filter rules, falling back through the usual locations.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.filesortrc.toml` in the current directory
    /// 3. `~/.config/filesort/filters.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_FILTERS_FILE_NAME);
        if local.is_file() {
            return Self::load_from_file(&local);
        }

        let home = config_home_file("filters.toml");
        if home.is_absolute() && home.is_file() {
            return Self::load_from_file(&home);
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = toml::from_str(&content).map_err(|e| ConfigError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded filter rules");
        Ok(config)
    }
}
