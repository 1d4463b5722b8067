//! Validation error types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for a single validator
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Failure reported by a single validator
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("Ensure this value has at least {min} characters (it has {length})")]
	TooShort { length: usize, min: usize },

	#[error("Ensure this value has at most {max} characters (it has {length})")]
	TooLong { length: usize, max: usize },

	#[error(
		"Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens"
	)]
	InvalidSlug(String),

	#[error("\"{value}\" is not a valid choice")]
	InvalidChoice { value: String, choices: Vec<String> },
}

/// One error attached to a field, as rendered to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	pub code: String,
	pub message: String,
}

impl FieldError {
	pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			message: message.into(),
		}
	}
}

/// All field errors of one request, in the order they were found
///
/// Serializes as `{"field": [{"code": ..., "message": ...}], ...}`.
///
/// # Examples
///
/// ```
/// use todo_core::validators::{FieldError, ValidationErrors};
///
/// let mut errors = ValidationErrors::new();
/// assert!(errors.is_empty());
///
/// errors.add("title", FieldError::new("title_length", "too long"));
/// assert_eq!(errors.first_code(), Some("title_length"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, Vec<FieldError>>);

impl ValidationErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a collection holding a single field error
	pub fn single(
		field: impl Into<String>,
		code: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		let mut errors = Self::new();
		errors.add(field, FieldError::new(code, message));
		errors
	}

	pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
		self.0.entry(field.into()).or_default().push(error);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn get(&self, field: &str) -> Option<&[FieldError]> {
		self.0.get(field).map(Vec::as_slice)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.0.contains_key(field)
	}

	/// Code of the first error recorded
	pub fn first_code(&self) -> Option<&str> {
		self.0
			.values()
			.next()
			.and_then(|errors| errors.first())
			.map(|error| error.code.as_str())
	}

	/// Message of the first error recorded
	pub fn first_message(&self) -> Option<&str> {
		self.0
			.values()
			.next()
			.and_then(|errors| errors.first())
			.map(|error| error.message.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<FieldError>)> {
		self.0.iter()
	}

	/// `Ok(())` when empty, otherwise the collected errors
	pub fn into_result(self) -> Result<(), ValidationErrors> {
		if self.is_empty() { Ok(()) } else { Err(self) }
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (field, errors) in &self.0 {
			for error in errors {
				if !first {
					write!(f, "; ")?;
				}
				write!(f, "{}: {}", field, error.message)?;
				first = false;
			}
		}
		Ok(())
	}
}
