//! Choice validator

use super::{ValidationError, ValidationResult, Validator};

/// Accepts only values from a fixed list
///
/// # Examples
///
/// ```
/// use todo_core::validators::{ChoiceValidator, Validator};
///
/// let validator = ChoiceValidator::new(["OPEN", "COMPLETED"]);
/// assert!(validator.validate("OPEN").is_ok());
/// assert!(validator.validate("open").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ChoiceValidator {
	choices: Vec<String>,
}

impl ChoiceValidator {
	pub fn new<I, S>(choices: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			choices: choices.into_iter().map(Into::into).collect(),
		}
	}

	pub fn choices(&self) -> &[String] {
		&self.choices
	}
}

impl Validator<str> for ChoiceValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		if self.choices.iter().any(|choice| choice == value) {
			Ok(())
		} else {
			Err(ValidationError::InvalidChoice {
				value: value.to_string(),
				choices: self.choices.clone(),
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_choice_is_case_sensitive() {
		let validator = ChoiceValidator::new(["OPEN", "WORKING"]);

		assert!(validator.validate("WORKING").is_ok());
		assert!(matches!(
			validator.validate("working"),
			Err(ValidationError::InvalidChoice { .. })
		));
		assert_eq!(validator.choices().len(), 2);
	}
}
