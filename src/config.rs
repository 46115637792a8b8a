//! Category rules and global settings.
//!
//! This module loads, validates and saves the JSON configuration that drives an
//! organize run. It supports:
//! - An ordered list of categories (order decides which rule wins)
//! - Extension matching, glob filename matching, or a combination of both
//! - Global rules for hidden/system files and date-based sub-folders
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!   "categories": [
//!     {
//!       "name": "screenshots",
//!       "extensions": [".png"],
//!       "patterns": ["Screenshot*"],
//!       "match_mode": "both",
//!       "destination": "Screenshots"
//!     }
//!   ],
//!   "rules": {
//!     "ignore_hidden": true,
//!     "ignore_system": true,
//!     "create_subdirs_by_date": false
//!   }
//! }
//! ```

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Directory under the user configuration directory holding `config.json`.
pub const CONFIG_DIR_NAME: &str = "smartfiler";

/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Glob options for filename patterns.
///
/// Matching is case-sensitive on every platform and wildcards may match a
/// leading dot, like shell `fnmatch`.
pub const PATTERN_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Errors that can occur while loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid JSON syntax or structure (including unknown match modes).
    #[error("Invalid configuration {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A category carries a glob pattern that does not compile.
    #[error("Invalid glob pattern '{pattern}' in category '{category}': {reason}")]
    InvalidGlobPattern {
        category: String,
        pattern: String,
        reason: String,
    },

    /// A category destination would escape the organized directory.
    #[error(
        "Invalid destination '{destination}' in category '{category}': expected a relative folder inside the organized directory"
    )]
    InvalidDestination {
        category: String,
        destination: String,
    },

    /// The platform has no per-user configuration directory.
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    /// Failed to write the configuration file.
    #[error("Failed to write configuration {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the configuration.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// How a category combines its extension and pattern checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Extension check only; patterns are ignored.
    Extension,
    /// Pattern check only; extensions are ignored.
    Pattern,
    /// Extension OR pattern.
    #[default]
    Either,
    /// Extension AND pattern.
    Both,
}

impl MatchMode {
    /// All modes in display order.
    pub const ALL: [MatchMode; 4] = [
        MatchMode::Both,
        MatchMode::Either,
        MatchMode::Extension,
        MatchMode::Pattern,
    ];

    /// Returns the JSON spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Extension => "extension",
            MatchMode::Pattern => "pattern",
            MatchMode::Either => "either",
            MatchMode::Both => "both",
        }
    }

    /// Returns a human-readable description of this mode.
    pub fn description(&self) -> &'static str {
        match self {
            MatchMode::Extension => "Extension only",
            MatchMode::Pattern => "Pattern only",
            MatchMode::Either => "Extension OR pattern (either can match)",
            MatchMode::Both => "Extension AND pattern (both must match)",
        }
    }

    /// The mode after this one in [`MatchMode::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// The mode before this one in [`MatchMode::ALL`], wrapping around.
    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// One matching rule plus the folder that matching files are moved into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Display name, unique within a configuration.
    pub name: String,

    /// Lower-case extensions with a leading dot (e.g. ".jpg").
    #[serde(default)]
    pub extensions: BTreeSet<String>,

    /// Shell-style glob patterns checked against the file name, in order.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// How extension and pattern checks are combined.
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Folder, relative to the organized directory. Defaults to `name`.
    #[serde(default)]
    pub destination: String,
}

impl Category {
    /// Creates an empty category whose destination is its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            destination: name.clone(),
            name,
            extensions: BTreeSet::new(),
            patterns: Vec::new(),
            match_mode: MatchMode::default(),
        }
    }

    /// Returns a copy with canonical extensions, trimmed patterns and a
    /// defaulted destination.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.extensions = self
            .extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .collect();
        self.patterns = self
            .patterns
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let destination = self.destination.trim();
        self.destination = if destination.is_empty() {
            self.name.clone()
        } else {
            destination.to_string()
        };
        self
    }

    /// True when the category has neither extensions nor patterns and
    /// therefore never matches anything.
    pub fn is_inert(&self) -> bool {
        self.extensions.is_empty() && self.patterns.is_empty()
    }

    /// Checks that the destination stays inside the organized directory.
    pub fn validate_destination(&self) -> Result<(), ConfigError> {
        if is_contained_destination(&self.destination) {
            Ok(())
        } else {
            Err(ConfigError::InvalidDestination {
                category: self.name.clone(),
                destination: self.destination.clone(),
            })
        }
    }
}

/// Canonicalizes an extension: trimmed, lower-case, with a leading dot.
///
/// An empty extension stays empty; it matches files without an extension.
pub fn normalize_extension(raw: &str) -> String {
    let ext = raw.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// A destination is acceptable when it is made only of normal components.
fn is_contained_destination(destination: &str) -> bool {
    let path = Path::new(destination);
    path.components().next().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Settings that apply to every category during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalRules {
    /// Skip files whose name starts with a dot.
    #[serde(default = "default_true")]
    pub ignore_hidden: bool,

    /// Skip well-known OS metadata files (Thumbs.db, Desktop.ini, .DS_Store).
    #[serde(default = "default_true")]
    pub ignore_system: bool,

    /// Place files in `destination/YYYY-MM` using their modification time.
    #[serde(default)]
    pub create_subdirs_by_date: bool,

    /// Always preview instead of moving.
    #[serde(default)]
    pub dry_run: bool,

    /// Directory organized when no source is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_directory: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalRules {
    fn default() -> Self {
        Self {
            ignore_hidden: true,
            ignore_system: true,
            create_subdirs_by_date: false,
            dry_run: false,
            target_directory: None,
        }
    }
}

/// The complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartFilerConfig {
    /// Categories in authored order. The first matching category wins.
    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub rules: GlobalRules,
}

impl SmartFilerConfig {
    /// Returns `<user config dir>/smartfiler/config.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load configuration from a file that must exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::Malformed` if JSON parsing fails and
    /// `ConfigError::InvalidDestination` if a destination escapes the root.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content, path)?;
        debug!(
            path = %path.display(),
            categories = config.categories.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration, falling back to an empty one if the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no configuration yet, starting empty");
            Ok(Self::default())
        }
    }

    /// Parse, normalize and validate JSON content. `origin` is used in errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Self =
            serde_json::from_str(content).map_err(|source| ConfigError::Malformed {
                path: origin.to_path_buf(),
                source,
            })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Normalize every category in place.
    pub fn normalize(&mut self) {
        self.categories = std::mem::take(&mut self.categories)
            .into_iter()
            .map(Category::normalized)
            .collect();
    }

    /// Check every category destination.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.categories
            .iter()
            .try_for_each(Category::validate_destination)
    }

    /// Compile categories into matchers, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob pattern or destination is invalid.
    pub fn compile(&self) -> Result<Vec<CompiledCategory>, ConfigError> {
        self.categories
            .iter()
            .cloned()
            .map(CompiledCategory::new)
            .collect()
    }

    /// Position of the category with the given name.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }
}

/// Rewrites a shell wildcard pattern into the `glob` crate's syntax.
///
/// File names have no path separators, so a run of `*` means the same as a
/// single `*`; the `glob` crate would otherwise read `**` as a recursive
/// wildcard and reject it inside a name. A `[` without a closing `]` is a
/// literal bracket.
pub fn to_glob_syntax(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Index of the `]` closing the character class opened at `start`. A `]`
/// right after `[` or `[!` belongs to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut first = start + 1;
    if chars.get(first) == Some(&'!') {
        first += 1;
    }
    if chars.get(first) == Some(&']') {
        first += 1;
    }
    chars
        .get(first..)?
        .iter()
        .position(|&c| c == ']')
        .map(|offset| first + offset)
}

/// A category with its glob patterns pre-compiled for matching.
#[derive(Debug, Clone)]
pub struct CompiledCategory {
    category: Category,
    patterns: Vec<Pattern>,
}

impl CompiledCategory {
    /// Compile a category.
    ///
    /// # Errors
    ///
    /// Returns an error if a glob pattern or the destination is invalid.
    pub fn new(category: Category) -> Result<Self, ConfigError> {
        let category = category.normalized();
        category.validate_destination()?;

        let patterns = category
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(&to_glob_syntax(pattern)).map_err(|e| ConfigError::InvalidGlobPattern {
                    category: category.name.clone(),
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if category.is_inert() {
            warn!(
                category = %category.name,
                "category has no extensions and no patterns; it will never match"
            );
        }

        Ok(Self { category, patterns })
    }

    /// The underlying rule.
    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.category.name
    }

    pub fn destination(&self) -> &str {
        &self.category.destination
    }

    pub fn match_mode(&self) -> MatchMode {
        self.category.match_mode
    }

    /// Whether `extension` (already lower-case, with dot) is listed.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.category.extensions.contains(extension)
    }

    /// Whether `file_name` matches any pattern.
    pub fn matches_pattern(&self, file_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(file_name, PATTERN_MATCH_OPTIONS))
    }
}
