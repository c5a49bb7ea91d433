//! Shared helpers for collecting field-level validation failures.
//!
//! Form validation reports every problem at once rather than stopping at the
//! first, so callers push messages into a [`Violations`] and convert it into
//! a single [`CoreError::Validation`] at the end.

use crate::error::CoreError;

/// Accumulates `field: message` pairs.
#[derive(Debug, Default)]
pub struct Violations {
    messages: Vec<String>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field`.
    pub fn push(&mut self, field: &str, message: impl AsRef<str>) {
        self.messages.push(format!("{field}: {}", message.as_ref()));
    }

    /// Record a violation when `failed` is true.
    pub fn check(&mut self, failed: bool, field: &str, message: impl AsRef<str>) {
        if failed {
            self.push(field, message);
        }
    }

    /// Merge another collector's messages, prefixing each with `prefix`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: Violations) {
        self.messages
            .extend(other.messages.into_iter().map(|m| format!("{prefix}.{m}")));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// `Ok(())` when nothing was recorded, otherwise a joined validation error.
    pub fn into_result(self) -> Result<(), CoreError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self.messages.join("; ")))
        }
    }
}

/// Flatten `validator` derive output into a single [`CoreError::Validation`].
///
/// Fields are sorted so the message is stable across runs.
pub fn from_validator(errors: validator::ValidationErrors) -> CoreError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(move |e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{field}: {msg}")
                })
                .collect::<Vec<_>>()
        })
        .collect();
    messages.sort();
    CoreError::Validation(messages.join("; "))
}

/// Run `validator` on a DTO and convert failures into [`CoreError`].
pub fn validate_dto<T: validator::Validate>(dto: &T) -> Result<(), CoreError> {
    dto.validate().map_err(from_validator)
}
