//! Field validators
//!
//! Django-style validator objects. Each validator checks one property of a
//! value and reports a [`ValidationError`]; the todo field rules in
//! [`crate::validation`] combine them and collect the failures into
//! [`ValidationErrors`], keyed by field name.

pub mod choice;
pub mod errors;
pub mod string;

pub use choice::ChoiceValidator;
pub use errors::{FieldError, ValidationError, ValidationErrors, ValidationResult};
pub use string::{MaxLengthValidator, MinLengthValidator, SlugValidator};

/// Trait for validators
pub trait Validator<T: ?Sized> {
	fn validate(&self, value: &T) -> ValidationResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_validators_compose() {
		let validators: Vec<Box<dyn Validator<str>>> = vec![
			Box::new(MinLengthValidator::new(1)),
			Box::new(MaxLengthValidator::new(5)),
			Box::new(SlugValidator::new()),
		];

		let passes = |value: &str| validators.iter().all(|v| v.validate(value).is_ok());

		assert!(passes("home"));
		assert!(!passes(""));
		assert!(!passes("too-long"));
		assert!(!passes("a b"));
	}
}
