//! Move planning.
//!
//! The planner turns the enumerated candidate files into [`MoveDirective`]s:
//! 1. Exclusion filters (hidden files, system files) drop files entirely
//! 2. Categories are consulted in configured order; the first match wins
//! 3. Unmatched files are reported and left in place
//! 4. Optional `YYYY-MM` sub-folders are derived from modification time
//! 5. The [`ConflictResolver`] finalizes each destination file name

use crate::config::{CompiledCategory, GlobalRules};
use crate::matcher::{CandidateFile, first_match};
use crate::resolver::{ConflictResolver, path_is_taken};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

/// OS metadata files skipped when `ignore_system` is set.
pub const SYSTEM_FILES: [&str; 3] = ["Thumbs.db", "Desktop.ini", ".DS_Store"];

/// A single planned move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDirective {
    /// The file to move.
    pub source: PathBuf,
    /// The directory the file goes into (created on demand).
    pub destination_dir: PathBuf,
    /// The conflict-free file name inside `destination_dir`.
    pub final_name: String,
    /// Name of the category that claimed the file.
    pub category: String,
}

impl MoveDirective {
    /// Full destination path.
    pub fn destination(&self) -> PathBuf {
        self.destination_dir.join(&self.final_name)
    }
}

/// The outcome of planning one organize run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Moves in enumeration order.
    pub directives: Vec<MoveDirective>,
    /// Files no category matched.
    pub unmatched: Vec<CandidateFile>,
    /// Number of files dropped by the hidden/system filters.
    pub excluded: usize,
}

/// Returns true if `name` is removed by the global exclusion filters.
pub fn is_excluded(name: &str, rules: &GlobalRules) -> bool {
    (rules.ignore_hidden && name.starts_with('.'))
        || (rules.ignore_system && SYSTEM_FILES.contains(&name))
}

/// `YYYY-MM` folder name for a modification time, in local time.
pub fn date_bucket(modified: SystemTime) -> String {
    DateTime::<Local>::from(modified).format("%Y-%m").to_string()
}

/// Plans moves for one source root.
pub struct Planner<'a> {
    root: &'a Path,
    categories: &'a [CompiledCategory],
    rules: &'a GlobalRules,
}

impl<'a> Planner<'a> {
    /// Creates a planner whose destinations live under `root`.
    pub fn new(root: &'a Path, categories: &'a [CompiledCategory], rules: &'a GlobalRules) -> Self {
        Self {
            root,
            categories,
            rules,
        }
    }

    /// Plans against the current filesystem state.
    pub fn plan(&self, files: &[CandidateFile]) -> Plan {
        self.plan_with_probe(files, path_is_taken)
    }

    /// Plans with a custom existence probe for destination paths.
    ///
    /// Each file is either excluded, unmatched, or becomes exactly one
    /// directive. Final names within one destination directory are unique.
    pub fn plan_with_probe<F>(&self, files: &[CandidateFile], exists: F) -> Plan
    where
        F: Fn(&Path) -> bool,
    {
        let mut plan = Plan::default();
        let mut resolver = ConflictResolver::new();

        for file in files {
            if is_excluded(&file.name, self.rules) {
                trace!(path = %file.path.display(), "excluded by global rules");
                plan.excluded += 1;
                continue;
            }

            let Some(category) = first_match(file, self.categories) else {
                trace!(path = %file.path.display(), "no category matched");
                plan.unmatched.push(file.clone());
                continue;
            };

            let destination_dir = self.destination_dir(category, file);
            let final_name = resolver.resolve(&destination_dir, &file.name, &exists);
            debug!(
                path = %file.path.display(),
                category = category.name(),
                destination = %destination_dir.join(&final_name).display(),
                "planned move"
            );

            plan.directives.push(MoveDirective {
                source: file.path.clone(),
                destination_dir,
                final_name,
                category: category.name().to_string(),
            });
        }

        plan
    }

    fn destination_dir(&self, category: &CompiledCategory, file: &CandidateFile) -> PathBuf {
        let dir = self.root.join(category.destination());
        if self.rules.create_subdirs_by_date {
            dir.join(date_bucket(file.modified))
        } else {
            dir
        }
    }
}
