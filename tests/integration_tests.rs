/// Integration tests for smartfiler
///
/// These tests simulate real-world usage scenarios, testing the complete
/// end-to-end functionality of the organize pipeline.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. Rule order and match modes
/// 3. Dry-run mode verification
/// 4. Conflict resolution
/// 5. Global rules (exclusions, date folders)
/// 6. Recursive mode
/// 7. Fatal errors
use filetime::{FileTime, set_file_mtime};
use smartfiler::cli::{CliError, OrganizeOptions, RunSummary, organize_directory};
use smartfiler::config::{Category, ConfigError, MatchMode, SmartFilerConfig};
use smartfiler::scanner::SourceDirectoryError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary source directory plus a configuration file stored next to it.
struct TestFixture {
    temp_dir: TempDir,
    source: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with an empty `inbox` source directory.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("inbox");
        fs::create_dir(&source).expect("Failed to create source directory");
        TestFixture { temp_dir, source }
    }

    /// Get the path to the source directory.
    fn path(&self) -> &Path {
        &self.source
    }

    fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.json")
    }

    /// Create a file with content, creating parent directories.
    fn create_file(&self, rel_path: &str, content: &str) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_file(name, name);
        }
    }

    fn write_config(&self, config: &SmartFilerConfig) {
        config.save(&self.config_path()).expect("Failed to save config");
    }

    fn write_categories(&self, categories: Vec<Category>) {
        self.write_config(&SmartFilerConfig {
            categories,
            ..SmartFilerConfig::default()
        });
    }

    fn organize(&self, dry_run: bool, recursive: bool) -> RunSummary {
        self.try_organize(dry_run, recursive)
            .expect("organize should succeed")
    }

    fn try_organize(&self, dry_run: bool, recursive: bool) -> Result<RunSummary, CliError> {
        let options = OrganizeOptions {
            source: Some(self.source.clone()),
            dry_run,
            recursive,
        };
        organize_directory(&options, &self.config_path())
    }

    /// Assert that a file exists at the given relative path.
    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    /// Assert that nothing exists at the given relative path.
    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// Every file under the source directory, relative and sorted.
    fn list_files_recursive(&self) -> Vec<String> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(root: &Path, dir: &Path, files: &mut Vec<String>) {
        for entry in fs::read_dir(dir).expect("Failed to read directory").flatten() {
            let path = entry.path();
            if path.is_dir() {
                Self::walk_dir(root, &path, files);
            } else {
                let rel = path.strip_prefix(root).expect("path under root");
                files.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
}

fn category(name: &str, extensions: &[&str], patterns: &[&str], mode: MatchMode, destination: &str) -> Category {
    let mut category = Category::new(name);
    category.extensions = extensions.iter().map(|e| e.to_string()).collect();
    category.patterns = patterns.iter().map(|p| p.to_string()).collect();
    category.match_mode = mode;
    category.destination = destination.to_string();
    category
}

fn default_categories() -> Vec<Category> {
    vec![
        category("screenshots", &[], &["Screenshot*"], MatchMode::Pattern, "Screenshots"),
        category("images", &[".jpg", ".png"], &[], MatchMode::Extension, "Images"),
        category("documents", &[".pdf", ".txt"], &[], MatchMode::Either, "Documents"),
    ]
}

// ============================================================================
// 1. Basic organization workflows
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());

    let summary = fixture.organize(false, false);

    assert!(summary.report.completed.is_empty());
    assert!(summary.unmatched.is_empty());
    assert!(fixture.list_files_recursive().is_empty());
}

#[test]
fn test_organize_mixed_files() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_files(&["photo.jpg", "Screenshot 1.png", "cv.pdf", "song.mp3"]);

    let summary = fixture.organize(false, false);

    assert_eq!(summary.report.completed.len(), 3);
    assert_eq!(summary.unmatched.len(), 1);
    assert!(summary.report.failed.is_empty());
    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            "Documents/cv.pdf",
            "Images/photo.jpg",
            "Screenshots/Screenshot 1.png",
            "song.mp3",
        ]
    );
}

#[test]
fn test_organize_preserves_file_content() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("notes.txt", "important content");

    fixture.organize(false, false);

    assert_eq!(fixture.read("Documents/notes.txt"), "important content");
}

#[test]
fn test_organize_mixed_case_extensions() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_files(&["HOLIDAY.JPG", "Scan.Pdf"]);

    fixture.organize(false, false);

    fixture.assert_file_exists("Images/HOLIDAY.JPG");
    fixture.assert_file_exists("Documents/Scan.Pdf");
}

#[test]
fn test_organize_files_with_multiple_dots_and_no_extension() {
    let fixture = TestFixture::new();
    let mut categories = default_categories();
    categories.push(category("bare", &[""], &[], MatchMode::Extension, "Bare"));
    fixture.write_categories(categories);
    fixture.create_files(&["archive.tar.txt", "README"]);

    fixture.organize(false, false);

    fixture.assert_file_exists("Documents/archive.tar.txt");
    fixture.assert_file_exists("Bare/README");
}

#[test]
fn test_organize_idempotent() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_files(&["a.jpg", "b.pdf"]);

    fixture.organize(false, false);
    let first = fixture.list_files_recursive();
    let summary = fixture.organize(false, false);

    assert!(summary.report.completed.is_empty());
    assert_eq!(fixture.list_files_recursive(), first);
}

// ============================================================================
// 2. Rule order and match modes
// ============================================================================

#[test]
fn test_first_matching_category_wins() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    // Matches both screenshots (pattern) and images (extension).
    fixture.create_file("Screenshot 2024.png", "");

    fixture.organize(false, false);

    fixture.assert_file_exists("Screenshots/Screenshot 2024.png");
    fixture.assert_not_exists("Images");
}

#[test]
fn test_reordered_categories_change_winner() {
    let fixture = TestFixture::new();
    let mut categories = default_categories();
    categories.swap(0, 1);
    fixture.write_categories(categories);
    fixture.create_file("Screenshot 2024.png", "");

    fixture.organize(false, false);

    fixture.assert_file_exists("Images/Screenshot 2024.png");
}

#[test]
fn test_both_mode_requires_extension_and_pattern() {
    let fixture = TestFixture::new();
    fixture.write_categories(vec![category(
        "invoices",
        &[".pdf"],
        &["invoice_*"],
        MatchMode::Both,
        "Invoices",
    )]);
    fixture.create_files(&["invoice_01.pdf", "invoice_02.txt", "letter.pdf"]);

    let summary = fixture.organize(false, false);

    assert_eq!(summary.report.completed.len(), 1);
    fixture.assert_file_exists("Invoices/invoice_01.pdf");
    fixture.assert_file_exists("invoice_02.txt");
    fixture.assert_file_exists("letter.pdf");
}

#[test]
fn test_patterns_are_case_sensitive() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("screenshot.gif", "");

    let summary = fixture.organize(false, false);

    assert_eq!(summary.unmatched.len(), 1);
    fixture.assert_file_exists("screenshot.gif");
}

// ============================================================================
// 3. Dry-run mode verification
// ============================================================================

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_files(&["a.jpg", "b.pdf"]);

    let summary = fixture.organize(true, false);

    assert!(summary.is_dry_run());
    assert_eq!(summary.report.completed.len(), 2);
    assert_eq!(fixture.list_files_recursive(), vec!["a.jpg", "b.pdf"]);
    fixture.assert_not_exists("Images");
    fixture.assert_not_exists("Documents");
}

#[test]
fn test_dry_run_matches_live_run() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_files(&["a.jpg", "Screenshot.png", "c.pdf", "d.mp3"]);
    fixture.create_file("Images/a.jpg", "already there");

    let preview: Vec<PathBuf> = fixture
        .organize(true, false)
        .report
        .completed
        .into_iter()
        .map(|m| m.destination)
        .collect();
    let live: Vec<PathBuf> = fixture
        .organize(false, false)
        .report
        .completed
        .into_iter()
        .map(|m| m.destination)
        .collect();

    assert_eq!(preview, live);
    for destination in &live {
        assert!(destination.is_file(), "missing {}", destination.display());
    }
}

// ============================================================================
// 4. Conflict resolution
// ============================================================================

#[test]
fn test_conflict_with_existing_file_gets_number() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("Documents/report.pdf", "old");
    fixture.create_file("Documents/report (1).pdf", "older");
    fixture.create_file("report.pdf", "new");

    fixture.organize(false, false);

    assert_eq!(fixture.read("Documents/report.pdf"), "old");
    assert_eq!(fixture.read("Documents/report (1).pdf"), "older");
    assert_eq!(fixture.read("Documents/report (2).pdf"), "new");
}

#[test]
fn test_same_name_in_one_run_gets_distinct_names() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("a/photo.jpg", "first");
    fixture.create_file("b/photo.jpg", "second");

    let summary = fixture.organize(false, true);

    assert_eq!(summary.report.completed.len(), 2);
    assert_eq!(fixture.read("Images/photo.jpg"), "first");
    assert_eq!(fixture.read("Images/photo (1).jpg"), "second");
}

// ============================================================================
// 5. Global rules
// ============================================================================

#[test]
fn test_hidden_and_system_files_are_excluded() {
    let fixture = TestFixture::new();
    fixture.write_categories(vec![category("all", &[], &["*"], MatchMode::Pattern, "All")]);
    fixture.create_files(&[".hidden", "Thumbs.db", "Desktop.ini", "keep.txt"]);

    let summary = fixture.organize(false, false);

    assert_eq!(summary.excluded, 3);
    assert!(summary.unmatched.is_empty());
    fixture.assert_file_exists(".hidden");
    fixture.assert_file_exists("Thumbs.db");
    fixture.assert_file_exists("All/keep.txt");
}

#[test]
fn test_exclusions_can_be_disabled() {
    let fixture = TestFixture::new();
    let mut config = SmartFilerConfig {
        categories: vec![category("all", &[], &["*"], MatchMode::Pattern, "All")],
        ..SmartFilerConfig::default()
    };
    config.rules.ignore_hidden = false;
    config.rules.ignore_system = false;
    fixture.write_config(&config);
    fixture.create_files(&[".hidden", "Thumbs.db"]);

    let summary = fixture.organize(false, false);

    assert_eq!(summary.excluded, 0);
    fixture.assert_file_exists("All/.hidden");
    fixture.assert_file_exists("All/Thumbs.db");
}

#[test]
fn test_date_subfolders_use_modification_time() {
    let fixture = TestFixture::new();
    let mut config = SmartFilerConfig {
        categories: default_categories(),
        ..SmartFilerConfig::default()
    };
    config.rules.create_subdirs_by_date = true;
    fixture.write_config(&config);
    fixture.create_file("old.pdf", "");

    // 2021-06-15 12:00 UTC: mid-month, so the bucket holds in any timezone.
    set_file_mtime(fixture.path().join("old.pdf"), FileTime::from_unix_time(1_623_758_400, 0))
        .expect("Failed to set mtime");

    fixture.organize(false, false);

    fixture.assert_file_exists("Documents/2021-06/old.pdf");
}

// ============================================================================
// 6. Recursive mode
// ============================================================================

#[test]
fn test_flat_mode_ignores_subdirectories() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("nested/deep.pdf", "");

    let summary = fixture.organize(false, false);

    assert!(summary.report.completed.is_empty());
    fixture.assert_file_exists("nested/deep.pdf");
}

#[test]
fn test_recursive_skips_destinations_and_hidden_dirs() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("Documents/already.pdf", "");
    fixture.create_file(".git/objects/blob.txt", "");
    fixture.create_file("projects/2024/plan.pdf", "");

    let summary = fixture.organize(false, true);

    assert_eq!(summary.report.completed.len(), 1);
    fixture.assert_file_exists("Documents/already.pdf");
    fixture.assert_file_exists("Documents/plan.pdf");
    fixture.assert_file_exists(".git/objects/blob.txt");
}

#[cfg(unix)]
#[test]
fn test_broken_symlink_is_reported_not_fatal() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("ok.pdf", "");
    std::os::unix::fs::symlink(fixture.path().join("gone.pdf"), fixture.path().join("link.pdf"))
        .expect("Failed to create symlink");

    let summary = fixture.organize(false, false);

    assert_eq!(summary.report.completed.len(), 1);
    assert_eq!(summary.issues.len(), 1);
    assert_eq!(summary.issues[0].reason, "broken symbolic link");
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_is_left_in_place_and_reported() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    let odd_name = OsStr::from_bytes(b"caf\xE9.jpg");
    fs::write(fixture.path().join(odd_name), "bytes").expect("Failed to write file");
    fixture.create_file("plain.jpg", "");

    let summary = fixture.organize(false, false);

    assert_eq!(summary.report.completed.len(), 1);
    assert_eq!(summary.issues.len(), 1);
    assert!(summary.issues[0].path.ends_with(odd_name));
    assert!(fixture.path().join(odd_name).is_file());
    fixture.assert_file_exists("Images/plain.jpg");
    let images: Vec<_> = fs::read_dir(fixture.path().join("Images"))
        .expect("Failed to read Images")
        .flatten()
        .map(|e| e.file_name())
        .collect();
    assert_eq!(images, vec![OsStr::new("plain.jpg").to_os_string()]);
}

// ============================================================================
// 7. Fatal errors
// ============================================================================

#[test]
fn test_missing_config_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_file("a.pdf", "");

    let result = fixture.try_organize(false, false);

    assert!(matches!(result, Err(CliError::Config(ConfigError::ConfigNotFound(_)))));
    fixture.assert_file_exists("a.pdf");
}

#[test]
fn test_malformed_config_is_fatal() {
    let fixture = TestFixture::new();
    fs::write(fixture.config_path(), "{ not json").expect("Failed to write config");

    let result = fixture.try_organize(false, false);

    assert!(matches!(result, Err(CliError::Config(ConfigError::Malformed { .. }))));
}

#[test]
fn test_escaping_destination_is_fatal() {
    let fixture = TestFixture::new();
    fs::write(
        fixture.config_path(),
        r#"{"categories": [{"name": "x", "extensions": [".pdf"], "destination": "../out"}]}"#,
    )
    .expect("Failed to write config");
    fixture.create_file("a.pdf", "");

    let result = fixture.try_organize(false, false);

    assert!(matches!(result, Err(CliError::Config(ConfigError::InvalidDestination { .. }))));
    fixture.assert_file_exists("a.pdf");
}

#[test]
fn test_missing_source_is_fatal() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    let options = OrganizeOptions {
        source: Some(fixture.path().join("nope")),
        ..OrganizeOptions::default()
    };

    let result = organize_directory(&options, &fixture.config_path());

    assert!(matches!(result, Err(CliError::Source(SourceDirectoryError::Missing(_)))));
}

#[test]
fn test_source_that_is_a_file_is_fatal() {
    let fixture = TestFixture::new();
    fixture.write_categories(default_categories());
    fixture.create_file("plain.txt", "");
    let options = OrganizeOptions {
        source: Some(fixture.path().join("plain.txt")),
        ..OrganizeOptions::default()
    };

    let result = organize_directory(&options, &fixture.config_path());

    assert!(matches!(result, Err(CliError::Source(SourceDirectoryError::NotADirectory(_)))));
}
