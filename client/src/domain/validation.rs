//! Field-level validation errors for user-facing forms.
//!
//! Validation runs before any request is sent. Every failing field is
//! reported at once so a form can annotate all of them in one pass.

use std::fmt;

/// One invalid form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Wire name of the field, for example `email`.
    pub field: &'static str,
    /// Human-readable message shown next to the field.
    pub message: String,
}

/// Collection of field errors produced by a form constructor.
///
/// # Examples
/// ```
/// use skillswap_client::domain::FieldErrors;
///
/// let mut errors = FieldErrors::default();
/// errors.push("title", "title must not be empty");
/// assert_eq!(errors.message_for("title"), Some("title must not be empty"));
/// assert!(errors.into_result(()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Record a failing field.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All recorded errors in insertion order.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// First message recorded for `field`.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    /// Return `value` when nothing failed, otherwise `self` as the error.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for FieldErrors {}

/// Trim `raw` and check its character count against `min..=max`.
pub(crate) fn check_length(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    min: usize,
    max: usize,
) -> String {
    let trimmed = raw.trim();
    let length = trimmed.chars().count();
    if length == 0 && min > 0 {
        errors.push(field, format!("{field} must not be empty"));
    } else if length < min {
        errors.push(field, format!("{field} must be at least {min} characters"));
    } else if length > max {
        errors.push(field, format!("{field} must be at most {max} characters"));
    }
    trimmed.to_owned()
}

/// Trim, drop blanks, reject over-long entries and collapse
/// case-insensitive duplicates keeping the first spelling.
pub(crate) fn normalise_terms(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &[String],
    max_items: usize,
    max_chars: usize,
) -> Vec<String> {
    let mut terms: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            errors.push(field, format!("{field} must not contain blank entries"));
            continue;
        }
        if trimmed.chars().count() > max_chars {
            errors.push(
                field,
                format!("{field} entries must be at most {max_chars} characters"),
            );
            continue;
        }
        let lowered = trimmed.to_lowercase();
        if !terms.iter().any(|term| term.to_lowercase() == lowered) {
            terms.push(trimmed.to_owned());
        }
    }
    if terms.len() > max_items {
        errors.push(field, format!("at most {max_items} {field} are allowed"));
    }
    terms
}
