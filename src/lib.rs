//! smartfiler - rule-based file organization
//!
//! This library moves files out of a directory into category folders. Each
//! category matches files by extension, by filename glob pattern, or both;
//! the first matching category in configured order wins. Planning happens
//! before anything is moved so a dry run shows exactly what a live run would
//! do, and name collisions are resolved by numbering (`report (1).pdf`).
//!
//! Categories live in a JSON configuration that can be generated from an
//! already organized directory or edited in an interactive terminal UI.

pub mod cli;
pub mod config;
pub mod editor;
pub mod generator;
pub mod logging;
pub mod matcher;
pub mod mover;
pub mod output;
pub mod planner;
pub mod resolver;
pub mod scanner;

pub use config::{Category, CompiledCategory, ConfigError, GlobalRules, MatchMode, SmartFilerConfig};
pub use generator::generate_config;
pub use matcher::{CandidateFile, first_match, matches};
pub use mover::{MoveError, MoveReport, Mover};
pub use planner::{MoveDirective, Plan, Planner};
pub use resolver::ConflictResolver;
pub use scanner::{ScanOptions, SourceDirectoryError, scan};

pub use cli::{Cli, run_cli};
