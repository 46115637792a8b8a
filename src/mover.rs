/// Execution of planned moves.
///
/// This module performs (or, in dry-run mode, records) the moves produced by
/// the planner. It creates destination directories as needed and moves files
/// one at a time. A failing move is reported for that file only; the remaining
/// directives are still applied.
use crate::planner::MoveDirective;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while moving a single file.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Something appeared at the destination after planning.
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// The filesystem refused the move.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A move that could not be carried out.
#[derive(Debug)]
pub struct MoveFailure {
    /// The file that stayed in place.
    pub path: PathBuf,
    pub error: MoveError,
}

/// A move that was performed (or, in dry-run mode, would be performed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
}

/// Whether the mover touches the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// Create directories and move files.
    Live,
    /// Record the moves without changing anything.
    DryRun,
}

/// Outcome of executing a plan.
#[derive(Debug, Default)]
pub struct MoveReport {
    /// Moves performed (or recorded, in dry-run mode), in plan order.
    pub completed: Vec<CompletedMove>,
    /// Moves that failed.
    pub failed: Vec<MoveFailure>,
}

/// Applies move directives.
#[derive(Debug, Clone, Copy)]
pub struct Mover {
    mode: MoveMode,
}

impl Mover {
    pub fn new(mode: MoveMode) -> Self {
        Self { mode }
    }

    pub fn live() -> Self {
        Self::new(MoveMode::Live)
    }

    pub fn dry_run() -> Self {
        Self::new(MoveMode::DryRun)
    }

    pub fn mode(&self) -> MoveMode {
        self.mode
    }

    /// Moves a single file into its destination directory.
    ///
    /// If the destination directory (including a date sub-folder) doesn't
    /// exist, it is created. The destination file must not exist; it is never
    /// overwritten.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use smartfiler::mover::Mover;
    /// use smartfiler::planner::MoveDirective;
    /// use std::path::PathBuf;
    ///
    /// let directive = MoveDirective {
    ///     source: PathBuf::from("/path/to/base/image.png"),
    ///     destination_dir: PathBuf::from("/path/to/base/Images"),
    ///     final_name: "image.png".to_string(),
    ///     category: "images".to_string(),
    /// };
    ///
    /// match Mover::live().apply(&directive) {
    ///     Ok(done) => println!("Moved to {}", done.destination.display()),
    ///     Err(e) => eprintln!("Move failed: {}", e),
    /// }
    /// ```
    pub fn apply(&self, directive: &MoveDirective) -> Result<CompletedMove, MoveError> {
        let destination = directive.destination();

        if self.mode == MoveMode::Live {
            if !directive.destination_dir.is_dir() {
                fs::create_dir_all(&directive.destination_dir).map_err(|source| {
                    MoveError::DirectoryCreationFailed {
                        path: directive.destination_dir.clone(),
                        source,
                    }
                })?;
            }

            if fs::symlink_metadata(&destination).is_ok() {
                return Err(MoveError::DestinationExists(destination));
            }

            fs::rename(&directive.source, &destination).map_err(|source| {
                MoveError::FileMoveFailure {
                    from: directive.source.clone(),
                    to: destination.clone(),
                    source,
                }
            })?;
            debug!(from = %directive.source.display(), to = %destination.display(), "moved file");
        }

        Ok(CompletedMove {
            source: directive.source.clone(),
            destination,
            category: directive.category.clone(),
        })
    }

    /// Applies every directive in order, calling `observe` after each one.
    pub fn execute<F>(&self, directives: &[MoveDirective], mut observe: F) -> MoveReport
    where
        F: FnMut(&MoveDirective, &Result<CompletedMove, MoveError>),
    {
        let mut report = MoveReport::default();

        for directive in directives {
            let result = self.apply(directive);
            observe(directive, &result);
            match result {
                Ok(done) => report.completed.push(done),
                Err(error) => {
                    warn!(path = %directive.source.display(), %error, "move failed");
                    report.failed.push(MoveFailure {
                        path: directive.source.clone(),
                        error,
                    });
                }
            }
        }

        report
    }
}
