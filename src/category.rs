//! Category table: the ordered rules that map extensions to categories.
//!
//! A [`CategoryTable`] is an ordered list of [`Category`] records. Order is
//! significant: when an extension appears in more than one category, the
//! earlier category wins.
//!
//! # Examples
//!
//! ```
//! use filesort::category::CategoryTable;
//!
//! let table = CategoryTable::default();
//! let names: Vec<&str> = table.names().collect();
//! assert_eq!(names[0], "Images");
//! assert_eq!(table.get("PDFs").unwrap().dir_name(), "pdfs");
//! ```

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Component, Path};

/// Built-in categories, in precedence order.
const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("Images", &[".jpg", ".jpeg", ".png", ".gif", ".webp"]),
    ("PDFs", &[".pdf"]),
    ("Archives", &[".zip", ".rar", ".tar", ".gz", ".7z"]),
    ("Office", &[".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"]),
    ("Code", &[".py", ".js", ".ts", ".html", ".css", ".java", ".cpp"]),
    ("Text", &[".txt", ".md", ".csv"]),
    ("Programs", &[".exe", ".msi", ".bat"]),
];

/// A named bucket of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    extensions: BTreeSet<String>,
}

impl Category {
    /// Creates a category. Extensions are lower-cased; leading dots are not added.
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    /// Returns true if `extension` (already lower-cased, with its dot) belongs here.
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Returns the subdirectory name files of this category are moved into.
    ///
    /// # Examples
    ///
    /// ```
    /// use filesort::category::Category;
    ///
    /// assert_eq!(Category::new("Images", [".png"]).dir_name(), "images");
    /// ```
    pub fn dir_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Returns true if `dir_name` names a single subdirectory, so that joining it
/// onto a directory stays directly inside that directory.
///
/// ```
/// use filesort::category::is_plain_dir_name;
///
/// assert!(is_plain_dir_name("images"));
/// assert!(!is_plain_dir_name(".."));
/// assert!(!is_plain_dir_name("a/b"));
/// ```
pub fn is_plain_dir_name(dir_name: &str) -> bool {
    if dir_name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(dir_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == dir_name
    )
}

/// Ordered mapping from category name to its extension set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Builds a table from categories in precedence order.
    pub fn from_categories(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Category names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(Category::name)
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::from_categories(
            DEFAULT_CATEGORIES
                .iter()
                .map(|(name, exts)| Category::new(*name, exts.iter()))
                .collect(),
        )
    }
}

impl Serialize for CategoryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.extensions)?;
        }
        map.end()
    }
}

// serde_json::Map is sorted unless `preserve_order` is on, so walk the map by hand.
struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = CategoryTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping category names to arrays of extensions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut categories = Vec::with_capacity(access.size_hint().unwrap_or(0));
        let mut seen = HashSet::new();

        while let Some((name, extensions)) = access.next_entry::<String, Vec<String>>()? {
            if !seen.insert(name.clone()) {
                return Err(de::Error::custom(format!("duplicate category '{}'", name)));
            }
            if !is_plain_dir_name(&name.to_lowercase()) {
                return Err(de::Error::custom(format!(
                    "category '{}' cannot be used as a directory name",
                    name
                )));
            }
            categories.push(Category::new(name, extensions));
        }

        Ok(CategoryTable::from_categories(categories))
    }
}

impl<'de> Deserialize<'de> for CategoryTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TableVisitor)
    }
}

/// The category names a caller opted into for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledSet {
    names: HashSet<String>,
}

impl EnabledSet {
    /// Enables every category of `table`.
    pub fn all(table: &CategoryTable) -> Self {
        table.names().collect()
    }

    /// Enables nothing; every category is inert.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in this set that `table` does not define.
    pub fn unknown_in<'a>(&'a self, table: &'a CategoryTable) -> impl Iterator<Item = &'a str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|name| table.get(name).is_none())
    }
}

impl<S: Into<String>> FromIterator<S> for EnabledSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
