//! Rule matching for candidate files.
//!
//! This module decides whether a file belongs to a category. Matching is a
//! pure predicate over a [`CandidateFile`] and a [`CompiledCategory`]:
//! extensions are compared case-insensitively, filename patterns
//! case-sensitively, and the category's [`MatchMode`] combines the two.
//!
//! # Examples
//!
//! ```
//! use smartfiler::config::{Category, CompiledCategory, MatchMode};
//! use smartfiler::matcher::{CandidateFile, matches};
//!
//! let mut images = Category::new("images");
//! images.extensions.insert(".jpg".to_string());
//! images.match_mode = MatchMode::Extension;
//! let images = CompiledCategory::new(images).unwrap();
//!
//! assert!(matches(&CandidateFile::from_name("holiday.JPG"), &images));
//! assert!(!matches(&CandidateFile::from_name("notes.txt"), &images));
//! ```

use crate::config::{CompiledCategory, MatchMode};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file found while enumerating the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// The full path to the file.
    pub path: PathBuf,
    /// The file name, including extension.
    pub name: String,
    /// Lower-case extension with leading dot, or empty when there is none.
    pub extension: String,
    /// Last modification time.
    pub modified: SystemTime,
}

impl CandidateFile {
    /// Creates a candidate, deriving name and extension from the path.
    pub fn new(path: PathBuf, modified: SystemTime) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = file_extension(&path);
        Self {
            path,
            name,
            extension,
            modified,
        }
    }

    /// Creates a candidate that exists only as a name, for rule testing.
    pub fn from_name(name: &str) -> Self {
        Self::new(PathBuf::from(name), SystemTime::UNIX_EPOCH)
    }
}

/// Returns the lower-case extension of `path` with a leading dot.
///
/// Files without an extension (including dotfiles such as `.bashrc`) yield an
/// empty string.
pub fn file_extension(path: &Path) -> String {
    match path.extension().map(|ext| ext.to_string_lossy().to_lowercase()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => String::new(),
    }
}

/// Extension check: the file's extension is listed by the category.
pub fn extension_matches(file: &CandidateFile, category: &CompiledCategory) -> bool {
    category.has_extension(&file.extension)
}

/// Pattern check: the file name matches any of the category's globs.
pub fn pattern_matches(file: &CandidateFile, category: &CompiledCategory) -> bool {
    category.matches_pattern(&file.name)
}

/// Decides whether `file` belongs to `category`.
///
/// A category with no extensions and no patterns never matches.
pub fn matches(file: &CandidateFile, category: &CompiledCategory) -> bool {
    match category.match_mode() {
        MatchMode::Extension => extension_matches(file, category),
        MatchMode::Pattern => pattern_matches(file, category),
        MatchMode::Either => extension_matches(file, category) || pattern_matches(file, category),
        MatchMode::Both => extension_matches(file, category) && pattern_matches(file, category),
    }
}

/// Returns the first category, in configured order, that matches `file`.
pub fn first_match<'a>(
    file: &CandidateFile,
    categories: &'a [CompiledCategory],
) -> Option<&'a CompiledCategory> {
    categories.iter().find(|category| matches(file, category))
}

/// Returns every category that matches `file`, in configured order.
pub fn matching_categories<'a>(
    file: &CandidateFile,
    categories: &'a [CompiledCategory],
) -> Vec<&'a CompiledCategory> {
    categories
        .iter()
        .filter(|category| matches(file, category))
        .collect()
}
