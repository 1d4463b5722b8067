//! String validators
//!
//! Lengths are counted in characters, so multi-byte text is measured the
//! way a user would count it.

use super::{ValidationError, ValidationResult, Validator};
use regex::Regex;
use std::sync::LazyLock;

// Letters, digits, underscores and hyphens, Django's `validate_slug`.
static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[-a-zA-Z0-9_]+\z").expect("SLUG_REGEX: invalid regex pattern")
});

/// Minimum length validator
#[derive(Debug, Clone, Copy)]
pub struct MinLengthValidator {
	min: usize,
}

impl MinLengthValidator {
	/// Creates a new MinLengthValidator with the specified minimum length.
	///
	/// # Examples
	///
	/// ```
	/// use todo_core::validators::{MinLengthValidator, Validator};
	///
	/// let validator = MinLengthValidator::new(1);
	/// assert!(validator.validate("a").is_ok());
	/// assert!(validator.validate("").is_err());
	/// ```
	pub fn new(min: usize) -> Self {
		Self { min }
	}
}

impl Validator<str> for MinLengthValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		let length = value.chars().count();
		if length >= self.min {
			Ok(())
		} else {
			Err(ValidationError::TooShort {
				length,
				min: self.min,
			})
		}
	}
}

/// Maximum length validator
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthValidator {
	max: usize,
}

impl MaxLengthValidator {
	/// Creates a new MaxLengthValidator with the specified maximum length.
	///
	/// # Examples
	///
	/// ```
	/// use todo_core::validators::{MaxLengthValidator, Validator};
	///
	/// let validator = MaxLengthValidator::new(3);
	/// assert!(validator.validate("äöü").is_ok());
	/// assert!(validator.validate("abcd").is_err());
	/// ```
	pub fn new(max: usize) -> Self {
		Self { max }
	}
}

impl Validator<str> for MaxLengthValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		let length = value.chars().count();
		if length <= self.max {
			Ok(())
		} else {
			Err(ValidationError::TooLong {
				length,
				max: self.max,
			})
		}
	}
}

/// Slug validator
///
/// Accepts a non-empty run of ASCII letters, digits, underscores and hyphens.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugValidator;

impl SlugValidator {
	pub fn new() -> Self {
		Self
	}
}

impl Validator<str> for SlugValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		if SLUG_REGEX.is_match(value) {
			Ok(())
		} else {
			Err(ValidationError::InvalidSlug(value.to_string()))
		}
	}
}
