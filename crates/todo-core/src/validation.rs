//! Todo field rules
//!
//! Every create and update runs [`validate_fields`] on the complete candidate
//! record. The API layer also uses the individual checks to report errors for
//! the fields a client supplied, before the store sees the request.

use crate::models::{TodoFields, TodoStatus};
use crate::validators::{
	ChoiceValidator, FieldError, MaxLengthValidator, MinLengthValidator, SlugValidator,
	ValidationErrors, Validator,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const TITLE_MAX_LENGTH: usize = 100;
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;
pub const TAG_MAX_LENGTH: usize = 50;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
	"%Y-%m-%dT%H:%M:%S%.f",
	"%Y-%m-%dT%H:%M",
	"%Y-%m-%d %H:%M:%S%.f",
	"%Y-%m-%d %H:%M",
];

fn check_length(value: &str, max: usize) -> bool {
	MinLengthValidator::new(1).validate(value).is_ok()
		&& MaxLengthValidator::new(max).validate(value).is_ok()
}

pub fn validate_title(title: &str) -> Result<(), FieldError> {
	if check_length(title, TITLE_MAX_LENGTH) {
		Ok(())
	} else {
		Err(FieldError::new(
			"title_length",
			format!("Title must be between 1 and {} characters", TITLE_MAX_LENGTH),
		))
	}
}

pub fn validate_description(description: &str) -> Result<(), FieldError> {
	if check_length(description, DESCRIPTION_MAX_LENGTH) {
		Ok(())
	} else {
		Err(FieldError::new(
			"description_length",
			format!(
				"Description must be between 1 and {} characters",
				DESCRIPTION_MAX_LENGTH
			),
		))
	}
}

/// Checks a non-empty tag; callers normalise blanks with [`normalize_tag`] first
pub fn validate_tag(tag: &str) -> Result<(), FieldError> {
	if MaxLengthValidator::new(TAG_MAX_LENGTH).validate(tag).is_err() {
		return Err(FieldError::new(
			"tag_length",
			format!(
				"Ensure this field has no more than {} characters.",
				TAG_MAX_LENGTH
			),
		));
	}
	SlugValidator::new().validate(tag).map_err(|e| {
		FieldError::new("invalid_slug", format!("{}.", e))
	})
}

/// A blank tag means "no tag"
pub fn normalize_tag(tag: Option<String>) -> Option<String> {
	tag.filter(|t| !t.is_empty())
}

pub fn parse_status(value: &str) -> Result<TodoStatus, FieldError> {
	let validator = ChoiceValidator::new(TodoStatus::ALL.iter().map(TodoStatus::as_str));
	validator
		.validate(value)
		.map_err(|e| FieldError::new("invalid_status", format!("{}.", e)))?;
	value
		.parse()
		.map_err(|e| FieldError::new("invalid_status", format!("{}.", e)))
}

/// Parse a client-supplied deadline
///
/// Accepts RFC 3339 (any offset, converted to UTC), naive date-times and
/// plain dates. Values without an offset are taken as UTC.
///
/// # Examples
///
/// ```
/// use todo_core::validation::parse_datetime;
///
/// let a = parse_datetime("2024-06-01T10:00:00+02:00").unwrap();
/// let b = parse_datetime("2024-06-01 08:00").unwrap();
/// assert_eq!(a, b);
/// assert!(parse_datetime("tomorrow").is_err());
/// ```
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, FieldError> {
	let value = value.trim();
	if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
		return Ok(dt.with_timezone(&Utc));
	}
	for format in NAIVE_DATETIME_FORMATS {
		if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
			return Ok(naive.and_utc());
		}
	}
	if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
		&& let Some(naive) = date.and_hms_opt(0, 0, 0)
	{
		return Ok(naive.and_utc());
	}
	Err(FieldError::new(
		"invalid_datetime",
		"Datetime has wrong format. Use one of these formats instead: \
		 YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].",
	))
}

/// Run every field rule on a complete candidate record
pub fn validate_fields(fields: &TodoFields) -> Result<(), ValidationErrors> {
	let mut errors = ValidationErrors::new();
	if let Err(e) = validate_title(&fields.title) {
		errors.add("title", e);
	}
	if let Err(e) = validate_description(&fields.description) {
		errors.add("description", e);
	}
	if let Some(tag) = fields.tag.as_deref()
		&& let Err(e) = validate_tag(tag)
	{
		errors.add("tag", e);
	}
	errors.into_result()
}
