//! Interactive configuration editor.
//!
//! Browse, add, update, delete and reorder categories in a full-screen
//! terminal UI. Changes stay in memory until the user saves.

pub mod form;
pub mod render;
pub mod state;
mod terminal;

pub use form::{CategoryForm, FormError, FormField};
pub use state::{EditorOutcome, EditorState, Mode};

use crate::config::{ConfigError, SmartFilerConfig};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Opens the editor on `config_path`, starting empty if the file is absent.
pub fn run(config_path: &Path) -> Result<(), EditorError> {
    let config = SmartFilerConfig::load_or_default(config_path)?;
    let mut state = EditorState::new(config_path.to_path_buf(), config);
    terminal::run_terminal(&mut state)?;
    Ok(())
}
