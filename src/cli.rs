//! Command-line interface module for smartfiler.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (clap)
//! - Configuration path resolution
//! - Organize orchestration: scan, plan, move, report
//! - Config generation and preview
//! - Launching the interactive editor

use crate::config::{ConfigError, SmartFilerConfig};
use crate::editor::{self, EditorError};
use crate::generator::{GeneratedConfig, generate_config};
use crate::matcher::CandidateFile;
use crate::mover::{MoveMode, MoveReport, Mover};
use crate::output::{OutputFormatter, plural};
use crate::planner::Planner;
use crate::scanner::{ScanIssue, ScanOptions, SourceDirectoryError, scan, validate_source};
use clap::{ArgAction, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Number of sample file names shown per folder in a generate preview.
const PREVIEW_SAMPLES: usize = 3;

#[derive(Debug, Parser)]
#[command(
    name = "smartfiler",
    version,
    about = "Organize files into folders using extension and filename-pattern rules"
)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/smartfiler/config.json)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Move files from a directory into category folders
    Organize {
        /// Directory to organize (defaults to rules.target_directory)
        source: Option<PathBuf>,

        /// Show what would be moved without touching anything
        #[arg(short, long)]
        dry_run: bool,

        /// Also organize files in sub-directories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Build a configuration from an already organized directory
    Generate {
        /// Directory whose sub-folders become categories
        source: PathBuf,

        /// Print what was found without writing a configuration
        #[arg(short, long)]
        preview: bool,
    },

    /// Edit the configuration interactively
    Edit,
}

/// Fatal errors; a run that returns one has not moved anything.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceDirectoryError),

    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// Options of one organize run.
#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    pub source: Option<PathBuf>,
    pub dry_run: bool,
    pub recursive: bool,
}

/// Everything an organize run did, for reporting.
#[derive(Debug)]
pub struct RunSummary {
    /// Canonical source directory.
    pub root: PathBuf,
    pub mode: MoveMode,
    pub report: MoveReport,
    pub unmatched: Vec<CandidateFile>,
    pub excluded: usize,
    pub issues: Vec<ScanIssue>,
}

impl RunSummary {
    pub fn is_dry_run(&self) -> bool {
        self.mode == MoveMode::DryRun
    }

    /// Moved (or would-move) counts keyed by destination folder relative to
    /// the source root.
    pub fn destination_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for done in &self.report.completed {
            let folder = done
                .destination
                .parent()
                .map(|dir| self.relative(dir))
                .unwrap_or_default();
            *counts.entry(folder).or_insert(0) += 1;
        }
        counts
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Runs the parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use smartfiler::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["smartfiler", "organize", "--dry-run", "/path/to/Downloads"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), CliError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => SmartFilerConfig::default_path()?,
    };

    match cli.command {
        Command::Organize {
            source,
            dry_run,
            recursive,
        } => {
            let options = OrganizeOptions {
                source,
                dry_run,
                recursive,
            };
            let summary = organize_directory(&options, &config_path)?;
            print_report(&summary);
        }
        Command::Generate { source, preview } => {
            let generated = generate_config(&source)?;
            if preview {
                print_preview(&source, &generated);
            } else {
                print_generated(&source, &generated);
                generated.config.save(&config_path)?;
                OutputFormatter::success(&format!(
                    "Config generated with {} categories",
                    generated.config.categories.len()
                ));
                OutputFormatter::plain(&format!("Saved to: {}", config_path.display()));
                OutputFormatter::info("You can now review it with 'smartfiler edit'");
            }
        }
        Command::Edit => editor::run(&config_path)?,
    }
    Ok(())
}

/// Loads the configuration, plans every move and carries the plan out.
///
/// Nothing is touched on disk until the configuration and the source
/// directory have both been validated. Per-file failures end up in the
/// returned summary; only configuration and source problems are errors.
pub fn organize_directory(
    options: &OrganizeOptions,
    config_path: &Path,
) -> Result<RunSummary, CliError> {
    let config = SmartFilerConfig::load(config_path)?;
    let categories = config.compile()?;

    let source = options
        .source
        .clone()
        .or_else(|| config.rules.target_directory.clone())
        .ok_or(SourceDirectoryError::NotSpecified)?;
    let root = validate_source(&source)?;

    let mode = if options.dry_run || config.rules.dry_run {
        MoveMode::DryRun
    } else {
        MoveMode::Live
    };

    let scan_options = ScanOptions::for_destinations(
        &root,
        categories.iter().map(|c| c.destination()),
        options.recursive,
        config.rules.ignore_hidden,
    );
    let found = scan(&root, &scan_options)?;
    let plan = Planner::new(&root, &categories, &config.rules).plan(&found.files);
    info!(
        root = %root.display(),
        files = found.files.len(),
        moves = plan.directives.len(),
        unmatched = plan.unmatched.len(),
        excluded = plan.excluded,
        ?mode,
        "planned organize run"
    );

    let progress = if mode == MoveMode::Live && !plan.directives.is_empty() {
        Some(OutputFormatter::create_progress_bar(plan.directives.len() as u64))
    } else {
        None
    };

    let report = Mover::new(mode).execute(&plan.directives, |directive, result| {
        if let Some(pb) = &progress {
            if let Err(e) = result {
                pb.println(OutputFormatter::error_line(&e.to_string()));
            }
            pb.set_message(directive.final_name.clone());
            pb.inc(1);
        }
    });

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(RunSummary {
        root,
        mode,
        report,
        unmatched: plan.unmatched,
        excluded: plan.excluded,
        issues: found.issues,
    })
}

/// Prints the end-of-run report.
pub fn print_report(summary: &RunSummary) {
    let moved = summary.report.completed.len();

    if summary.is_dry_run() {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            summary.root.display()
        ));
        if moved > 0 {
            OutputFormatter::header("Files would be organized as follows:");
            for done in &summary.report.completed {
                OutputFormatter::plain(&format!(
                    " - {} → {}",
                    summary.relative(&done.source),
                    summary.relative(&done.destination)
                ));
            }
        }
    } else {
        OutputFormatter::plain(&format!("Organized contents of: {}", summary.root.display()));
    }

    if !summary.unmatched.is_empty() {
        OutputFormatter::header("No matching category:");
        for file in &summary.unmatched {
            OutputFormatter::plain(&format!(" - {}", summary.relative(&file.path)));
        }
    }

    if !summary.issues.is_empty() {
        OutputFormatter::header("Skipped:");
        for issue in &summary.issues {
            OutputFormatter::warning(&format!("{}: {}", issue.path.display(), issue.reason));
        }
    }

    if !summary.report.failed.is_empty() {
        OutputFormatter::header("Failed:");
        for failure in &summary.report.failed {
            OutputFormatter::error(&format!(
                "{}: {}",
                summary.relative(&failure.path),
                failure.error
            ));
        }
    }

    if moved > 0 {
        OutputFormatter::summary_table(&summary.destination_counts(), moved);
    }

    OutputFormatter::header("RESULT");
    let moved_label = if summary.is_dry_run() { "Would move" } else { "Moved" };
    OutputFormatter::count_line(moved_label, moved);
    OutputFormatter::count_line("Unmatched", summary.unmatched.len());
    OutputFormatter::count_line("Excluded", summary.excluded);
    OutputFormatter::count_line("Skipped", summary.issues.len());
    OutputFormatter::count_line("Failed", summary.report.failed.len());

    if summary.is_dry_run() {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else if summary.report.failed.is_empty() {
        OutputFormatter::success(&format!("Organization complete: {} {} moved", moved, plural(moved)));
    } else {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }
}

fn print_preview(source: &Path, generated: &GeneratedConfig) {
    OutputFormatter::header(&format!(
        "Preview of directory structure in: {}",
        source.display()
    ));
    OutputFormatter::plain(&"=".repeat(60));

    for profile in &generated.profiles {
        let samples: Vec<&str> = profile
            .filenames
            .iter()
            .take(PREVIEW_SAMPLES)
            .map(String::as_str)
            .collect();
        OutputFormatter::plain(&format!("\n{}:", profile.folder));
        OutputFormatter::plain(&format!("  Extensions: {}", join_or_none(profile.extensions.iter())));
        OutputFormatter::plain(&format!("  Detected patterns: {}", join_or_none(profile.patterns().iter())));
        OutputFormatter::plain(&format!("  Sample files: {}", join_or_none(samples.iter())));
    }
}

fn print_generated(source: &Path, generated: &GeneratedConfig) {
    OutputFormatter::plain(&format!("Analyzing directory: {}", source.display()));
    OutputFormatter::plain(&"=".repeat(60));

    for profile in &generated.profiles {
        match profile.to_category() {
            Some(category) => {
                OutputFormatter::plain(&format!("\n{}:", profile.folder));
                OutputFormatter::plain(&format!(
                    "  Extensions: {}",
                    join_or_none(category.extensions.iter())
                ));
                OutputFormatter::plain(&format!("  Patterns: {}", join_or_none(category.patterns.iter())));
                OutputFormatter::plain(&format!("  Match mode: {}", category.match_mode.as_str()));
                OutputFormatter::plain(&format!("  Files analyzed: {}", profile.filenames.len()));
            }
            None => OutputFormatter::warning(&format!(
                "{}: no extensions or patterns found, skipped",
                profile.folder
            )),
        }
    }
    OutputFormatter::plain(&"=".repeat(60));
}

fn join_or_none<I, S>(items: I) -> String
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    let joined: Vec<String> = items.map(|s| s.as_ref().to_string()).collect();
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined.join(", ")
    }
}
