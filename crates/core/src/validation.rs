//! Field-level validation rules.
//!
//! Each rule is a plain function returning `Some(FieldViolation)` when the
//! value breaks the rule. Entity inputs compose the rules they need through
//! [`Validator`] and report every violation at once, before any mutation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All violations found while validating one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error set holding exactly one violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldViolation::new(field, message)])
    }

    pub fn push(&mut self, violation: FieldViolation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Whether any violation was reported against `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

/// Collects the outcome of several rules into one result.
///
/// ```ignore
/// Validator::new()
///     .check(required("name", Some(&input.name)))
///     .check(first_letter_uppercase("name", Some(&input.name)))
///     .finish()?;
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the violation, if any.
    pub fn check(mut self, outcome: Option<FieldViolation>) -> Self {
        if let Some(violation) = outcome {
            self.errors.push(violation);
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The field must be present and contain something besides whitespace.
pub fn required(field: &str, value: Option<&str>) -> Option<FieldViolation> {
    match value {
        Some(v) if !v.trim().is_empty() => None,
        _ => Some(FieldViolation::new(field, format!("The field {field} is required"))),
    }
}

/// The field, when present, must not exceed `max` characters.
pub fn max_length(field: &str, value: Option<&str>, max: usize) -> Option<FieldViolation> {
    let len = value.map(|v| v.chars().count()).unwrap_or(0);
    if len > max {
        Some(FieldViolation::new(
            field,
            format!("The field {field} must be at most {max} characters long"),
        ))
    } else {
        None
    }
}

/// The first character must equal its own uppercase form.
///
/// Empty or absent values pass; presence is the job of [`required`].
/// Characters whose uppercase form is several characters (`ß` -> `SS`) have
/// no single-character capital and pass as well.
pub fn first_letter_uppercase(field: &str, value: Option<&str>) -> Option<FieldViolation> {
    let first = value.and_then(|v| v.chars().next())?;
    let mut upper = first.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(capital), None) if capital != first => Some(FieldViolation::new(
            field,
            format!("The first letter of {field} must be uppercase"),
        )),
        _ => None,
    }
}
