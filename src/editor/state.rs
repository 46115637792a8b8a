//! Editor state and key handling.
//!
//! The editor is a small state machine:
//! - `Browsing`: move through the category list and pick an action
//! - `Editing`: fill in the form for a new or existing category
//! - `ConfirmingDelete`: yes/no before removing a category
//! - `Prompt`: single-line input for opening another file or testing a name
//!
//! [`EditorState::handle_key`] is the only entry point for input and never
//! touches the terminal, so every transition can be exercised in tests.

use crate::config::{CompiledCategory, SmartFilerConfig};
use crate::editor::form::{CategoryForm, FormError, FormField};
use crate::matcher::{CandidateFile, matching_categories};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of handling one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOutcome {
    Continue,
    Quit,
}

/// Which category an edit session writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    New,
    Existing(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub target: EditTarget,
    pub form: CategoryForm,
    pub field: FormField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Switch to another configuration file.
    OpenConfig,
    /// Show which categories a file name would match.
    TestFilename,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::OpenConfig => "Open config file",
            PromptKind::TestFilename => "Test filename",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    /// Output lines of the last submission (filename tests only).
    pub result: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Editing(EditSession),
    ConfirmingDelete { index: usize },
    Prompt(Prompt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Everything the editor knows while it runs.
#[derive(Debug, Clone)]
pub struct EditorState {
    config_path: PathBuf,
    config: SmartFilerConfig,
    selected: usize,
    mode: Mode,
    dirty: bool,
    quit_armed: bool,
    status: Option<StatusMessage>,
}

impl EditorState {
    pub fn new(config_path: PathBuf, config: SmartFilerConfig) -> Self {
        Self {
            config_path,
            config,
            selected: 0,
            mode: Mode::Browsing,
            dirty: false,
            quit_armed: false,
            status: None,
        }
    }

    pub fn config(&self) -> &SmartFilerConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Processes one key event.
    pub fn handle_key(&mut self, key: KeyEvent) -> EditorOutcome {
        if key.kind == KeyEventKind::Release {
            return EditorOutcome::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return EditorOutcome::Quit;
        }

        match std::mem::replace(&mut self.mode, Mode::Browsing) {
            Mode::Browsing => self.handle_browsing(key),
            Mode::Editing(session) => {
                self.handle_editing(session, key);
                EditorOutcome::Continue
            }
            Mode::ConfirmingDelete { index } => {
                self.handle_confirm_delete(index, key);
                EditorOutcome::Continue
            }
            Mode::Prompt(prompt) => {
                self.handle_prompt(prompt, key);
                EditorOutcome::Continue
            }
        }
    }

    fn handle_browsing(&mut self, key: KeyEvent) -> EditorOutcome {
        if key.code != KeyCode::Char('q') {
            self.quit_armed = false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return self.request_quit(),
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('a') => {
                self.status = None;
                self.mode = Mode::Editing(EditSession {
                    target: EditTarget::New,
                    form: CategoryForm::default(),
                    field: FormField::Name,
                });
            }
            KeyCode::Char('u') | KeyCode::Enter => match self.config.categories.get(self.selected) {
                Some(category) => {
                    self.status = None;
                    self.mode = Mode::Editing(EditSession {
                        target: EditTarget::Existing(self.selected),
                        form: CategoryForm::from_category(category),
                        field: FormField::Name,
                    });
                }
                None => self.warn("Select a category first"),
            },
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.selected < self.config.categories.len() {
                    self.mode = Mode::ConfirmingDelete {
                        index: self.selected,
                    };
                } else {
                    self.warn("Select a category first");
                }
            }
            KeyCode::Char('o') => {
                self.mode = Mode::Prompt(Prompt {
                    kind: PromptKind::OpenConfig,
                    input: self.config_path.display().to_string(),
                    result: Vec::new(),
                });
            }
            KeyCode::Char('t') => {
                self.mode = Mode::Prompt(Prompt {
                    kind: PromptKind::TestFilename,
                    input: String::new(),
                    result: Vec::new(),
                });
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.config.categories.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('K') => self.move_selected_up(),
            KeyCode::Char('J') => self.move_selected_down(),
            _ => {}
        }
        EditorOutcome::Continue
    }

    fn handle_editing(&mut self, mut session: EditSession, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.info("Edit cancelled");
                return;
            }
            KeyCode::Enter => {
                if let Err(e) = self.commit(&session) {
                    self.error(&e.to_string());
                    self.mode = Mode::Editing(session);
                }
                return;
            }
            KeyCode::Tab | KeyCode::Down => session.field = session.field.next(),
            KeyCode::BackTab | KeyCode::Up => session.field = session.field.previous(),
            KeyCode::Left if session.field == FormField::MatchMode => {
                session.form.match_mode = session.form.match_mode.previous();
            }
            KeyCode::Right | KeyCode::Char(' ') if session.field == FormField::MatchMode => {
                session.form.match_mode = session.form.match_mode.next();
            }
            KeyCode::Backspace => {
                if let Some(text) = session.form.text_mut(session.field) {
                    text.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(text) = session.form.text_mut(session.field) {
                    text.push(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::Editing(session);
    }

    fn commit(&mut self, session: &EditSession) -> Result<(), FormError> {
        let category = session.form.to_category()?;
        let existing = self.config.position_of(&category.name);
        let name = category.name.clone();

        match session.target {
            EditTarget::New => {
                if existing.is_some() {
                    return Err(FormError::DuplicateName(name));
                }
                self.config.categories.push(category);
                self.selected = self.config.categories.len() - 1;
                self.info(&format!("Added category: {} (press s to save)", name));
            }
            EditTarget::Existing(index) => {
                if existing.is_some_and(|i| i != index) {
                    return Err(FormError::DuplicateName(name));
                }
                match self.config.categories.get_mut(index) {
                    Some(slot) => *slot = category,
                    None => self.config.categories.push(category),
                }
                self.selected = index.min(self.config.categories.len() - 1);
                self.info(&format!("Updated category: {} (press s to save)", name));
            }
        }

        debug!(category = %name, "committed category");
        self.dirty = true;
        self.mode = Mode::Browsing;
        Ok(())
    }

    fn handle_confirm_delete(&mut self, index: usize, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if index < self.config.categories.len() {
                    let removed = self.config.categories.remove(index);
                    self.selected = self
                        .selected
                        .min(self.config.categories.len().saturating_sub(1));
                    self.dirty = true;
                    self.info(&format!("Deleted category: {} (press s to save)", removed.name));
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.info("Delete cancelled");
            }
            _ => self.mode = Mode::ConfirmingDelete { index },
        }
    }

    fn handle_prompt(&mut self, mut prompt: Prompt, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => return,
            KeyCode::Enter => match prompt.kind {
                PromptKind::OpenConfig => {
                    self.open_config(PathBuf::from(prompt.input.trim()));
                    return;
                }
                PromptKind::TestFilename => {
                    prompt.result = self.test_filename(prompt.input.trim());
                }
            },
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.input.push(c);
            }
            _ => {}
        }
        self.mode = Mode::Prompt(prompt);
    }

    /// Lists which categories `name` matches, marking the one that wins.
    pub fn test_filename(&self, name: &str) -> Vec<String> {
        if name.is_empty() {
            return vec!["Enter a filename".to_string()];
        }

        let compiled: Vec<CompiledCategory> = self
            .config
            .categories
            .iter()
            .cloned()
            .filter_map(|category| CompiledCategory::new(category).ok())
            .collect();
        let file = CandidateFile::from_name(name);
        let matched = matching_categories(&file, &compiled);

        if matched.is_empty() {
            return vec!["No matches found".to_string()];
        }

        matched
            .iter()
            .enumerate()
            .map(|(i, category)| {
                let marker = if i == 0 { "  (wins)" } else { "" };
                format!("✓ {} → {}{}", category.name(), category.destination(), marker)
            })
            .collect()
    }

    fn open_config(&mut self, path: PathBuf) {
        if path.as_os_str().is_empty() {
            self.warn("Enter a path to open");
            return;
        }
        if self.dirty {
            self.warn("Unsaved changes: press s to save before opening another file");
            return;
        }

        match SmartFilerConfig::load_or_default(&path) {
            Ok(config) => {
                self.info(&format!("Opened {}", path.display()));
                self.config = config;
                self.config_path = path;
                self.selected = 0;
            }
            Err(e) => self.error(&e.to_string()),
        }
    }

    fn save(&mut self) {
        match self.config.save(&self.config_path) {
            Ok(()) => {
                self.dirty = false;
                self.info(&format!("Config saved to {}", self.config_path.display()));
            }
            Err(e) => self.error(&e.to_string()),
        }
    }

    fn request_quit(&mut self) -> EditorOutcome {
        if self.dirty && !self.quit_armed {
            self.quit_armed = true;
            self.warn("You have unsaved changes! Press q again to quit anyway.");
            EditorOutcome::Continue
        } else {
            EditorOutcome::Quit
        }
    }

    fn move_selected_up(&mut self) {
        if self.selected > 0 && self.selected < self.config.categories.len() {
            self.config.categories.swap(self.selected, self.selected - 1);
            self.selected -= 1;
            self.dirty = true;
        }
    }

    fn move_selected_down(&mut self) {
        if self.selected + 1 < self.config.categories.len() {
            self.config.categories.swap(self.selected, self.selected + 1);
            self.selected += 1;
            self.dirty = true;
        }
    }

    fn info(&mut self, text: &str) {
        self.set_status(StatusKind::Info, text);
    }

    fn warn(&mut self, text: &str) {
        self.set_status(StatusKind::Warning, text);
    }

    fn error(&mut self, text: &str) {
        self.set_status(StatusKind::Error, text);
    }

    fn set_status(&mut self, kind: StatusKind, text: &str) {
        self.status = Some(StatusMessage {
            kind,
            text: text.to_string(),
        });
    }
}
