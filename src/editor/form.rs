//! Category edit form.
//!
//! Holds the text the user is typing for one category and converts it back
//! into a validated [`Category`].

use crate::config::{Category, CompiledCategory, ConfigError, MatchMode, normalize_extension};

/// The fields of the form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Extensions,
    Patterns,
    MatchMode,
    Destination,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Name,
        FormField::Extensions,
        FormField::Patterns,
        FormField::MatchMode,
        FormField::Destination,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Extensions => "Extensions",
            FormField::Patterns => "Patterns",
            FormField::MatchMode => "Match mode",
            FormField::Destination => "Destination",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            FormField::Name => "e.g. screenshots",
            FormField::Extensions => "comma separated, e.g. .png, .jpg",
            FormField::Patterns => "comma separated globs, e.g. Screenshot*, IMG_*",
            FormField::MatchMode => "←/→ or space to change",
            FormField::Destination => "folder name; empty uses the category name",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Editable text for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: String,
    pub extensions: String,
    pub patterns: String,
    pub match_mode: MatchMode,
    pub destination: String,
}

impl CategoryForm {
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            extensions: category
                .extensions
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            patterns: category.patterns.join(", "),
            match_mode: category.match_mode,
            destination: category.destination.clone(),
        }
    }

    /// The text buffer behind `field`; `None` for the match mode selector.
    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Name => Some(&mut self.name),
            FormField::Extensions => Some(&mut self.extensions),
            FormField::Patterns => Some(&mut self.patterns),
            FormField::Destination => Some(&mut self.destination),
            FormField::MatchMode => None,
        }
    }

    /// Display value of `field`.
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Extensions => &self.extensions,
            FormField::Patterns => &self.patterns,
            FormField::MatchMode => self.match_mode.description(),
            FormField::Destination => &self.destination,
        }
    }

    /// Builds the category the form describes.
    ///
    /// Extensions are split on commas and whitespace, patterns on commas.
    /// Patterns and destination are validated the same way as on load.
    pub fn to_category(&self) -> Result<Category, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::MissingName);
        }

        let category = Category {
            name: name.to_string(),
            extensions: self
                .extensions
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|ext| !ext.trim().is_empty())
                .map(normalize_extension)
                .collect(),
            patterns: self
                .patterns
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            match_mode: self.match_mode,
            destination: self.destination.trim().to_string(),
        }
        .normalized();

        CompiledCategory::new(category.clone())?;
        Ok(category)
    }
}

/// Why a form cannot be committed.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Category name required")]
    MissingName,

    #[error("A category named '{0}' already exists")]
    DuplicateName(String),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
