//! Destination name conflict resolution.
//!
//! Policy:
//! - A free name (not on disk, not already claimed this run) is used as-is.
//! - Otherwise `stem (n).ext` is probed for n = 1, 2, ... and the first free
//!   candidate is used.
//! - Every chosen name is claimed immediately, so later files planned into
//!   the same directory during the same run never receive it.
//!
//! Notes:
//! - Only what is observable at plan time is considered: the directory's
//!   current contents and this run's claims.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Default on-disk probe: anything at `path`, including a dangling symlink.
pub fn path_is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Splits a file name into stem and extension (extension keeps its dot).
///
/// Examples:
/// - "photo.jpg" -> ("photo", ".jpg")
/// - "archive.tar.gz" -> ("archive.tar", ".gz")
/// - ".env" -> (".env", "")
/// - "README" -> ("README", "")
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Returns the first name in the sequence `desired`, `stem (1).ext`,
/// `stem (2).ext`, ... that is neither in `already_planned` nor present in
/// `destination_dir` according to `exists`.
///
/// Does not record anything; identical inputs always give the same answer.
pub fn next_free_name<F>(
    destination_dir: &Path,
    desired_name: &str,
    already_planned: &HashSet<String>,
    exists: F,
) -> String
where
    F: Fn(&Path) -> bool,
{
    let is_free =
        |candidate: &str| !already_planned.contains(candidate) && !exists(&destination_dir.join(candidate));

    if is_free(desired_name) {
        return desired_name.to_string();
    }

    let (stem, ext) = split_name(desired_name);
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if is_free(&candidate) {
            trace!(
                desired = desired_name,
                chosen = %candidate,
                dir = %destination_dir.display(),
                "resolved name conflict"
            );
            return candidate;
        }
        n += 1;
    }
}

/// Tracks names claimed per destination directory for one organize run.
#[derive(Debug, Default, Clone)]
pub struct ConflictResolver {
    planned: HashMap<PathBuf, HashSet<String>>,
}

impl ConflictResolver {
    /// Creates a resolver with no claimed names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a non-colliding name in `destination_dir` and claims it.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartfiler::resolver::ConflictResolver;
    /// use std::path::Path;
    ///
    /// let mut resolver = ConflictResolver::new();
    /// let dir = Path::new("/nowhere/Images");
    /// let nothing_on_disk = |_: &Path| false;
    ///
    /// assert_eq!(resolver.resolve(dir, "photo.jpg", nothing_on_disk), "photo.jpg");
    /// assert_eq!(resolver.resolve(dir, "photo.jpg", nothing_on_disk), "photo (1).jpg");
    /// ```
    pub fn resolve<F>(&mut self, destination_dir: &Path, desired_name: &str, exists: F) -> String
    where
        F: Fn(&Path) -> bool,
    {
        let planned = self
            .planned
            .entry(destination_dir.to_path_buf())
            .or_default();
        let name = next_free_name(destination_dir, desired_name, planned, exists);
        planned.insert(name.clone());
        name
    }

    /// Names claimed so far in `destination_dir`.
    pub fn planned_in(&self, destination_dir: &Path) -> Option<&HashSet<String>> {
        self.planned.get(destination_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn nothing_on_disk(_: &Path) -> bool {
        false
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("photo.jpg"), ("photo", ".jpg"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name(".env"), (".env", ""));
        assert_eq!(split_name("README"), ("README", ""));
    }

    #[test]
    fn test_free_name_is_unchanged() {
        let name = next_free_name(Path::new("/d"), "a.txt", &HashSet::new(), nothing_on_disk);
        assert_eq!(name, "a.txt");
    }

    #[test]
    fn test_collision_on_disk_gets_suffix_one() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("file.txt"), "x").expect("Failed to write file");

        let name = next_free_name(temp_dir.path(), "file.txt", &HashSet::new(), path_is_taken);
        assert_eq!(name, "file (1).txt");
    }

    #[test]
    fn test_multiple_collisions_increment_suffix() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for name in ["file.txt", "file (1).txt", "file (2).txt"] {
            fs::write(temp_dir.path().join(name), name).expect("Failed to write file");
        }

        let name = next_free_name(temp_dir.path(), "file.txt", &HashSet::new(), path_is_taken);
        assert_eq!(name, "file (3).txt");
    }

    #[test]
    fn test_planned_names_count_as_taken() {
        let planned: HashSet<String> = ["song.mp3".to_string(), "song (1).mp3".to_string()].into();
        let name = next_free_name(Path::new("/d"), "song.mp3", &planned, nothing_on_disk);
        assert_eq!(name, "song (2).mp3");
    }

    #[test]
    fn test_disk_and_plan_are_both_checked() {
        let planned: HashSet<String> = ["a.txt".to_string()].into();
        let on_disk = |p: &Path| p.ends_with("a (1).txt");
        let name = next_free_name(Path::new("/d"), "a.txt", &planned, on_disk);
        assert_eq!(name, "a (2).txt");
    }

    #[test]
    fn test_dotfile_and_extensionless_suffixing() {
        let planned: HashSet<String> = [".env".to_string(), "Makefile".to_string()].into();
        assert_eq!(
            next_free_name(Path::new("/d"), ".env", &planned, nothing_on_disk),
            ".env (1)"
        );
        assert_eq!(
            next_free_name(Path::new("/d"), "Makefile", &planned, nothing_on_disk),
            "Makefile (1)"
        );
    }

    #[test]
    fn test_next_free_name_is_repeatable() {
        let planned: HashSet<String> = ["x.jpg".to_string()].into();
        let first = next_free_name(Path::new("/d"), "x.jpg", &planned, nothing_on_disk);
        let second = next_free_name(Path::new("/d"), "x.jpg", &planned, nothing_on_disk);
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_claims_names_per_directory() {
        let mut resolver = ConflictResolver::new();
        let images = Path::new("/root/Images");
        let docs = Path::new("/root/Docs");

        assert_eq!(resolver.resolve(images, "a.png", nothing_on_disk), "a.png");
        assert_eq!(resolver.resolve(images, "a.png", nothing_on_disk), "a (1).png");
        assert_eq!(resolver.resolve(images, "a.png", nothing_on_disk), "a (2).png");
        // A different directory has its own namespace.
        assert_eq!(resolver.resolve(docs, "a.png", nothing_on_disk), "a.png");

        assert_eq!(resolver.planned_in(images).map(|s| s.len()), Some(3));
    }

    #[test]
    fn test_suffixed_name_already_planned_is_skipped() {
        let mut resolver = ConflictResolver::new();
        let dir = Path::new("/d");

        // "a (1).png" arrives as a real file name first.
        assert_eq!(resolver.resolve(dir, "a (1).png", nothing_on_disk), "a (1).png");
        assert_eq!(resolver.resolve(dir, "a.png", nothing_on_disk), "a.png");
        assert_eq!(resolver.resolve(dir, "a.png", nothing_on_disk), "a (2).png");
    }
}
