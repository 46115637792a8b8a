//! Candidate enumeration.
//!
//! Walks the source root (one level, or recursively) and produces the
//! [`CandidateFile`]s the planner works on. Symbolic links are followed;
//! broken links and unreadable entries are reported as [`ScanIssue`]s and
//! never abort the walk.

use crate::matcher::CandidateFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Fatal problems with the directory being organized.
#[derive(Debug, Error)]
pub enum SourceDirectoryError {
    /// Neither the command line nor the configuration names a directory.
    #[error("No source directory given and no target_directory set in the configuration")]
    NotSpecified,

    /// The directory does not exist.
    #[error("Source directory does not exist: {}", .0.display())]
    Missing(PathBuf),

    /// The path exists but is not a directory.
    #[error("Source path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The directory exists but cannot be read.
    #[error("Cannot read source directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A per-entry problem found during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of enumerating a source directory.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Regular files, sorted by path within each directory.
    pub files: Vec<CandidateFile>,
    /// Entries that were skipped because they could not be inspected.
    pub issues: Vec<ScanIssue>,
}

/// Options for [`scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Descend into sub-directories.
    pub recursive: bool,
    /// Do not descend into directories whose name starts with a dot.
    ///
    /// Hidden files are filtered by name later, at planning time; this only
    /// controls whether hidden directories are walked at all. An organize
    /// run sets it from `ignore_hidden`, so files under `.git` or `.cache`
    /// are never candidates even when their own names are not hidden.
    pub skip_hidden_dirs: bool,
    /// Directories never descended into (category destinations).
    pub excluded_dirs: Vec<PathBuf>,
}

impl ScanOptions {
    /// Options for an organize run: every destination directly under `root`
    /// is excluded from recursion.
    pub fn for_destinations<'a, I>(root: &Path, destinations: I, recursive: bool, skip_hidden_dirs: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            recursive,
            skip_hidden_dirs,
            excluded_dirs: destinations
                .into_iter()
                .map(|destination| root.join(destination))
                .collect(),
        }
    }

    fn prunes(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        if self.excluded_dirs.iter().any(|dir| dir == entry.path()) {
            debug!(path = %entry.path().display(), "skipping destination directory");
            return true;
        }
        self.skip_hidden_dirs && entry.file_name().to_string_lossy().starts_with('.')
    }
}

/// Checks that `path` is an existing, readable directory and returns its
/// canonical form.
pub fn validate_source(path: &Path) -> Result<PathBuf, SourceDirectoryError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SourceDirectoryError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(SourceDirectoryError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if !metadata.is_dir() {
        return Err(SourceDirectoryError::NotADirectory(path.to_path_buf()));
    }

    fs::canonicalize(path).map_err(|source| SourceDirectoryError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Enumerates candidate files under `root`.
///
/// # Errors
///
/// Only a failure to read `root` itself is fatal.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<Scan, SourceDirectoryError> {
    fs::read_dir(root).map_err(|source| SourceDirectoryError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut scan = Scan::default();
    for entry in walker.into_iter().filter_entry(|e| !options.prunes(e)) {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let modified = entry
                    .metadata()
                    .map_err(io::Error::from)
                    .and_then(|metadata| metadata.modified());
                match candidate(entry.into_path(), modified) {
                    Ok(file) => scan.files.push(file),
                    Err(issue) => {
                        warn!(path = %issue.path.display(), reason = %issue.reason, "skipping file");
                        scan.issues.push(issue);
                    }
                }
            }
            Err(err) => {
                let issue = describe_walk_error(&err, root);
                warn!(path = %issue.path.display(), reason = %issue.reason, "skipping entry");
                scan.issues.push(issue);
            }
        }
    }

    debug!(
        root = %root.display(),
        files = scan.files.len(),
        issues = scan.issues.len(),
        recursive = options.recursive,
        "scanned source directory"
    );
    Ok(scan)
}

/// Builds the candidate for a regular file.
///
/// Names that are not valid UTF-8 are refused: rules match on text and the
/// file must keep its exact name when moved.
fn candidate(path: PathBuf, modified: io::Result<SystemTime>) -> Result<CandidateFile, ScanIssue> {
    if path.file_name().and_then(|name| name.to_str()).is_none() {
        return Err(ScanIssue {
            path,
            reason: "file name is not valid UTF-8".to_string(),
        });
    }
    match modified {
        Ok(modified) => Ok(CandidateFile::new(path, modified)),
        Err(e) => Err(ScanIssue {
            path,
            reason: format!("cannot read modification time: {}", e),
        }),
    }
}

fn describe_walk_error(err: &walkdir::Error, root: &Path) -> ScanIssue {
    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());

    let reason = if let Some(ancestor) = err.loop_ancestor() {
        format!("filesystem loop back to {}", ancestor.display())
    } else if fs::symlink_metadata(&path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
        && fs::metadata(&path).is_err()
    {
        "broken symbolic link".to_string()
    } else {
        err.to_string()
    };

    ScanIssue { path, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(scan: &Scan, root: &Path) -> Vec<String> {
        scan.files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(root)
                    .unwrap_or(&f.path)
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.jpg"), "a").unwrap();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("nested/c.pdf"), "c").unwrap();
        fs::write(root.join("nested/deeper/d.png"), "d").unwrap();
        fs::create_dir(root.join("Images")).unwrap();
        fs::write(root.join("Images/old.jpg"), "old").unwrap();
        fs::create_dir(root.join(".cache")).unwrap();
        fs::write(root.join(".cache/e.bin"), "e").unwrap();
        temp_dir
    }

    #[test]
    fn test_flat_scan_lists_top_level_files_only() {
        let temp_dir = setup();
        let root = temp_dir.path();

        let scan = scan(root, &ScanOptions::default()).expect("scan failed");
        assert_eq!(names(&scan, root), vec!["a.jpg", "b.txt"]);
        assert!(scan.issues.is_empty());
    }

    #[test]
    fn test_recursive_scan_skips_destinations_and_hidden_dirs() {
        let temp_dir = setup();
        let root = temp_dir.path();

        let options = ScanOptions::for_destinations(root, ["Images"], true, true);
        let scan = scan(root, &options).expect("scan failed");
        assert_eq!(
            names(&scan, root),
            vec!["a.jpg", "b.txt", "nested/c.pdf", "nested/deeper/d.png"]
        );
    }

    #[test]
    fn test_recursive_scan_can_enter_hidden_dirs() {
        let temp_dir = setup();
        let root = temp_dir.path();

        let options = ScanOptions::for_destinations(root, ["Images"], true, false);
        let scan = scan(root, &options).expect("scan failed");
        assert!(names(&scan, root).contains(&".cache/e.bin".to_string()));
    }

    #[test]
    fn test_validate_source_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");
        assert!(matches!(
            validate_source(&missing),
            Err(SourceDirectoryError::Missing(_))
        ));

        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            validate_source(&file),
            Err(SourceDirectoryError::NotADirectory(_))
        ));

        assert!(validate_source(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_unreadable_mtime_is_reported_not_dated() {
        let path = PathBuf::from("/src/report.pdf");
        let result = candidate(path.clone(), Err(io::Error::other("unsupported")));

        let issue = result.expect_err("file without mtime must not become a candidate");
        assert_eq!(issue.path, path);
        assert!(issue.reason.starts_with("cannot read modification time"));

        let file = candidate(path, Ok(SystemTime::UNIX_EPOCH)).expect("valid candidate");
        assert_eq!(file.name, "report.pdf");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_reported() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join(OsStr::from_bytes(b"caf\xE9.jpg")), "x").unwrap();
        fs::write(root.join("plain.jpg"), "x").unwrap();

        let scan = scan(root, &ScanOptions::default()).expect("scan failed");
        assert_eq!(names(&scan, root), vec!["plain.jpg"]);
        assert_eq!(scan.issues.len(), 1);
        assert_eq!(scan.issues[0].reason, "file name is not valid UTF-8");
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_reported_not_fatal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(root.join("gone.txt"), root.join("dangling.txt")).unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("alias.txt")).unwrap();

        let scan = scan(root, &ScanOptions::default()).expect("scan failed");
        assert_eq!(names(&scan, root), vec!["alias.txt", "real.txt"]);
        assert_eq!(scan.issues.len(), 1);
        assert!(scan.issues[0].path.ends_with("dangling.txt"));
        assert_eq!(scan.issues[0].reason, "broken symbolic link");
    }
}
