//! Category domain model.
//!
//! # Responsibility
//! - Define the canonical category record shared by user and supplier
//!   families.
//! - Own field validation rules applied before any storage write.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused within a family.
//! - `version` starts at [`INITIAL_VERSION`] and only ever grows by one per
//!   committed update.
//! - `name` is non-blank and at most [`NAME_MAX_CHARS`] characters after trim.
//! - `description` is at most [`DESCRIPTION_MAX_CHARS`] characters after trim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage-assigned identifier, unique within one category family.
pub type CategoryId = i64;

/// Version stamp assigned to every freshly created category.
pub const INITIAL_VERSION: i64 = 0;
/// Upper bound for `name`, counted in characters after trimming.
pub const NAME_MAX_CHARS: usize = 100;
/// Upper bound for `description`, counted in characters after trimming.
pub const DESCRIPTION_MAX_CHARS: usize = 255;

/// Category family. Each family is persisted in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Categories assigned to users.
    User,
    /// Categories assigned to suppliers.
    Supplier,
}

impl CategoryKind {
    /// Every family known by core, in schema order.
    pub const ALL: [CategoryKind; 2] = [CategoryKind::User, CategoryKind::Supplier];

    /// Backing table name for this family.
    pub fn table(self) -> &'static str {
        match self {
            Self::User => "user_categories",
            Self::Supplier => "supplier_categories",
        }
    }

    /// Stable lowercase label used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Supplier => "supplier",
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct CategoryValidationError {
    /// Offending field name (`name` or `description`).
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl CategoryValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Persisted category record.
///
/// `created_at` and `updated_at` are Unix epoch milliseconds taken from the
/// storage clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// Last version observed by the holder of this value.
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Category {
    /// Validates the mutable fields of this record.
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_fields(&self.name, &self.description)
    }
}

/// Mutable fields of a category, as supplied by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Returns a copy with surrounding whitespace removed from both fields.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_fields(&self.name, &self.description)
    }
}

impl From<&Category> for CategoryDraft {
    fn from(value: &Category) -> Self {
        Self::new(value.name.clone(), value.description.clone())
    }
}

/// Validates category fields.
///
/// Both limits are measured after trimming and in characters, not bytes.
pub fn validate_fields(name: &str, description: &str) -> Result<(), CategoryValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CategoryValidationError::new("name", "must not be blank"));
    }
    let name_len = name.chars().count();
    if name_len > NAME_MAX_CHARS {
        return Err(CategoryValidationError::new(
            "name",
            format!("must be at most {NAME_MAX_CHARS} characters, got {name_len}"),
        ));
    }

    let description_len = description.trim().chars().count();
    if description_len > DESCRIPTION_MAX_CHARS {
        return Err(CategoryValidationError::new(
            "description",
            format!("must be at most {DESCRIPTION_MAX_CHARS} characters, got {description_len}"),
        ));
    }

    Ok(())
}
