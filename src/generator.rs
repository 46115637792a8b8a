//! Configuration generation from an already organized directory.
//!
//! Each non-hidden sub-folder of the scanned directory is treated as a
//! category: the extensions of the files it holds become the category's
//! extensions, and recurring filename shapes (screenshots, camera images,
//! downloads, ...) become glob patterns.

use crate::config::{Category, GlobalRules, MatchMode, SmartFilerConfig, normalize_extension};
use crate::matcher::file_extension;
use crate::scanner::{SourceDirectoryError, validate_source};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// A pattern is proposed when more than 3 in 10 files match it.
const PATTERN_THRESHOLD_NUMERATOR: usize = 3;
const PATTERN_THRESHOLD_DENOMINATOR: usize = 10;

/// (regex over the file name, glob proposed when the regex is common)
const PATTERN_CHECKS: &[(&str, &str)] = &[
    (r"^Screenshot", "Screenshot*"),
    (r"^Screen Shot", "Screen Shot*"),
    (r"IMG_\d+", "IMG_*"),
    (r"DSC\d+", "DSC*"),
    (r"^download", "download*"),
    (r"^\d{4}-\d{2}-\d{2}", "[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]*"),
    (r"_\d+x\d+", "*_*x*"),
    (r"^temp", "temp*"),
    (r"^tmp", "tmp*"),
    (r"backup", "*backup*"),
    (r"draft", "*draft*"),
    (r"final", "*final*"),
    (r"copy", "*copy*"),
];

static COMPILED_CHECKS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    PATTERN_CHECKS
        .iter()
        .filter_map(|(regex, glob)| {
            RegexBuilder::new(regex)
                .case_insensitive(true)
                .build()
                .ok()
                .map(|re| (re, *glob))
        })
        .collect()
});

/// What was found in one sub-folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderProfile {
    /// Folder name as it appears on disk.
    pub folder: String,
    /// Lower-case extensions with leading dot.
    pub extensions: BTreeSet<String>,
    /// Non-hidden file names, sorted.
    pub filenames: Vec<String>,
}

impl FolderProfile {
    /// Patterns common enough in this folder to become rules.
    pub fn patterns(&self) -> Vec<String> {
        detect_patterns(&self.filenames)
    }

    /// Turns the profile into a category, or `None` for a folder with
    /// nothing to match on.
    pub fn to_category(&self) -> Option<Category> {
        let patterns = self.patterns();
        let match_mode = match (self.extensions.is_empty(), patterns.is_empty()) {
            (false, false) => MatchMode::Either,
            (false, true) => MatchMode::Extension,
            (true, false) => MatchMode::Pattern,
            (true, true) => return None,
        };

        Some(Category {
            name: self.folder.to_lowercase(),
            extensions: self.extensions.clone(),
            patterns,
            match_mode,
            destination: self.folder.clone(),
        })
    }
}

/// A generated configuration plus the profiles it was built from.
#[derive(Debug, Clone)]
pub struct GeneratedConfig {
    pub config: SmartFilerConfig,
    pub profiles: Vec<FolderProfile>,
}

/// Returns the globs whose shape occurs in more than 30% of `filenames`.
///
/// # Examples
///
/// ```
/// use smartfiler::generator::detect_patterns;
///
/// let names: Vec<String> = ["IMG_0001.jpg", "IMG_0002.jpg", "cat.png"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// assert_eq!(detect_patterns(&names), vec!["IMG_*".to_string()]);
/// ```
pub fn detect_patterns(filenames: &[String]) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();
    if filenames.is_empty() {
        return patterns;
    }

    for (regex, glob) in COMPILED_CHECKS.iter() {
        let hits = filenames.iter().filter(|name| regex.is_match(name)).count();
        if hits * PATTERN_THRESHOLD_DENOMINATOR > filenames.len() * PATTERN_THRESHOLD_NUMERATOR
            && !patterns.iter().any(|p| p == glob)
        {
            patterns.push(glob.to_string());
        }
    }
    patterns
}

/// Profiles every non-hidden sub-folder of `root`, sorted by folder name.
///
/// Only files directly inside each sub-folder are considered; hidden files
/// are ignored.
pub fn analyze_directory(root: &Path) -> Result<Vec<FolderProfile>, SourceDirectoryError> {
    let root = validate_source(root)?;
    let entries = fs::read_dir(&root).map_err(|source| SourceDirectoryError::Unreadable {
        path: root.clone(),
        source,
    })?;

    let mut profiles: BTreeMap<String, FolderProfile> = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(folder) = entry.file_name().to_str().map(str::to_string) else {
            warn!(path = %path.display(), "folder name is not valid UTF-8, skipping");
            continue;
        };
        if folder.starts_with('.') {
            continue;
        }

        let files = match fs::read_dir(&path) {
            Ok(files) => files,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read folder, skipping");
                continue;
            }
        };

        let profile = profiles.entry(folder.clone()).or_insert_with(|| FolderProfile {
            folder,
            ..FolderProfile::default()
        });

        for file in files.flatten() {
            let file_path = file.path();
            let name = file.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !file_path.is_file() {
                continue;
            }
            let extension = file_extension(&file_path);
            if !extension.is_empty() {
                profile.extensions.insert(normalize_extension(&extension));
            }
            profile.filenames.push(name);
        }
        profile.filenames.sort();
    }

    debug!(root = %root.display(), folders = profiles.len(), "analyzed directory");
    Ok(profiles.into_values().collect())
}

/// Builds a configuration from the folder layout under `root`.
///
/// Folders with neither extensions nor detectable patterns are left out.
/// `rules.target_directory` is set to the canonical `root`.
pub fn generate_config(root: &Path) -> Result<GeneratedConfig, SourceDirectoryError> {
    let canonical = validate_source(root)?;
    let profiles = analyze_directory(&canonical)?;

    let categories = profiles.iter().filter_map(FolderProfile::to_category).collect();
    let config = SmartFilerConfig {
        categories,
        rules: GlobalRules {
            target_directory: Some(canonical),
            ..GlobalRules::default()
        },
    };

    Ok(GeneratedConfig { config, profiles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detect_patterns_threshold() {
        // 1 of 4 is 25%: not enough.
        let names = strings(&["Screenshot 1.png", "a.png", "b.png", "c.png"]);
        assert!(detect_patterns(&names).is_empty());

        // 2 of 4 is 50%.
        let names = strings(&["Screenshot 1.png", "screenshot 2.png", "b.png", "c.png"]);
        assert_eq!(detect_patterns(&names), strings(&["Screenshot*"]));
    }

    #[test]
    fn test_detect_patterns_multiple() {
        let names = strings(&["report_draft.docx", "report_final.docx", "notes_draft.txt"]);
        assert_eq!(detect_patterns(&names), strings(&["*draft*", "*final*"]));
    }

    #[test]
    fn test_detect_date_prefix_uses_specific_glob() {
        let names = strings(&["2024-01-02 scan.pdf", "2023-11-30 receipt.pdf"]);
        let patterns = detect_patterns(&names);
        assert_eq!(patterns, strings(&["[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]*"]));
        assert!(glob::Pattern::new(&patterns[0]).is_ok());
    }

    #[test]
    fn test_detect_patterns_empty() {
        assert!(detect_patterns(&[]).is_empty());
    }

    #[test]
    fn test_analyze_and_generate() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::create_dir(root.join("Pictures")).unwrap();
        fs::write(root.join("Pictures/IMG_0001.JPG"), "").unwrap();
        fs::write(root.join("Pictures/IMG_0002.png"), "").unwrap();
        fs::write(root.join("Pictures/.thumb"), "").unwrap();

        fs::create_dir(root.join("Docs")).unwrap();
        fs::write(root.join("Docs/letter.pdf"), "").unwrap();

        fs::create_dir(root.join("Empty")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/HEAD"), "").unwrap();
        fs::write(root.join("loose.txt"), "").unwrap();

        let profiles = analyze_directory(root).expect("analyze failed");
        let folders: Vec<_> = profiles.iter().map(|p| p.folder.as_str()).collect();
        assert_eq!(folders, vec!["Docs", "Empty", "Pictures"]);
        assert_eq!(profiles[2].filenames, strings(&["IMG_0001.JPG", "IMG_0002.png"]));

        let generated = generate_config(root).expect("generate failed");
        let categories = &generated.config.categories;
        assert_eq!(categories.len(), 2);

        assert_eq!(categories[0].name, "docs");
        assert_eq!(categories[0].destination, "Docs");
        assert_eq!(categories[0].match_mode, MatchMode::Extension);

        assert_eq!(categories[1].name, "pictures");
        assert_eq!(categories[1].match_mode, MatchMode::Either);
        assert_eq!(
            categories[1].extensions.iter().cloned().collect::<Vec<_>>(),
            strings(&[".jpg", ".png"])
        );
        assert_eq!(categories[1].patterns, strings(&["IMG_*"]));

        assert_eq!(
            generated.config.rules.target_directory,
            Some(fs::canonicalize(root).unwrap())
        );
    }

    #[test]
    fn test_pattern_only_folder() {
        let profile = FolderProfile {
            folder: "Scratch".to_string(),
            extensions: BTreeSet::new(),
            filenames: strings(&["tmp1", "tmp2"]),
        };
        let category = profile.to_category().expect("category expected");
        assert_eq!(category.match_mode, MatchMode::Pattern);
        assert_eq!(category.patterns, strings(&["tmp*"]));
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = generate_config(&temp_dir.path().join("missing"));
        assert!(matches!(result, Err(SourceDirectoryError::Missing(_))));
    }
}
