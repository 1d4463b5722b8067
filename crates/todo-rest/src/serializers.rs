//! Todo serializer
//!
//! Turns request JSON into [`TodoFields`] / [`TodoPatch`] values and records
//! into response JSON. Every field error of a request is collected before
//! failing, so a client sees all problems at once. Read-only fields (`id`,
//! `created_at`, `updated_at`) and unknown keys in request bodies are
//! ignored.

use serde_json::{Map, Value};
use todo_core::exception::{Error, Result};
use todo_core::models::{TodoFields, TodoItem, TodoPatch, TodoStatus};
use todo_core::validation::{
	normalize_tag, parse_datetime, parse_status, validate_description, validate_tag,
	validate_title,
};
use todo_core::validators::{FieldError, ValidationErrors};

pub const READ_ONLY_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

pub const FIELDS: [&str; 8] = [
	"id",
	"title",
	"description",
	"due_date",
	"tag",
	"status",
	"created_at",
	"updated_at",
];

fn required() -> FieldError {
	FieldError::new("required", "This field is required.")
}

fn not_null() -> FieldError {
	FieldError::new("null", "This field may not be null.")
}

fn not_a_string() -> FieldError {
	FieldError::new("invalid_type", "Not a valid string.")
}

/// Value of a key that may be absent, null or a string
enum Input<'a> {
	Missing,
	Null,
	Text(&'a str),
	Invalid,
}

fn input<'a>(data: &'a Map<String, Value>, field: &str) -> Input<'a> {
	match data.get(field) {
		None => Input::Missing,
		Some(Value::Null) => Input::Null,
		Some(Value::String(s)) => Input::Text(s),
		Some(_) => Input::Invalid,
	}
}

fn as_object(data: &Value) -> Result<&Map<String, Value>> {
	data.as_object().ok_or_else(|| {
		let kind = match data {
			Value::Array(_) => "list",
			Value::String(_) => "str",
			Value::Number(_) => "number",
			Value::Bool(_) => "bool",
			_ => "null",
		};
		Error::Validation(ValidationErrors::single(
			"non_field_errors",
			"invalid",
			format!("Invalid data. Expected a dictionary, but got {}.", kind),
		))
	})
}

/// A required-on-create string field checked by `check`
///
/// Surrounding whitespace is trimmed first, so a blank value fails the
/// length check. `Ok(None)` means the field was omitted from a partial update.
fn text_field(
	data: &Map<String, Value>,
	field: &str,
	partial: bool,
	check: fn(&str) -> std::result::Result<(), FieldError>,
) -> std::result::Result<Option<String>, FieldError> {
	match input(data, field) {
		Input::Missing if partial => Ok(None),
		Input::Missing => Err(required()),
		Input::Null => Err(not_null()),
		Input::Invalid => Err(not_a_string()),
		Input::Text(value) => {
			let value = value.trim();
			check(value).map(|_| Some(value.to_string()))
		}
	}
}

fn status_field(value: Option<&Value>) -> std::result::Result<TodoStatus, FieldError> {
	match value {
		None => Err(required()),
		Some(Value::Null) => Err(not_null()),
		Some(Value::String(value)) => parse_status(value),
		Some(other) => Err(FieldError::new(
			"invalid_status",
			format!("\"{}\" is not a valid choice.", other),
		)),
	}
}

/// Serializer for [`TodoItem`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoSerializer;

impl TodoSerializer {
	/// Response JSON of a record
	pub fn to_representation(item: &TodoItem) -> Result<Value> {
		Ok(serde_json::to_value(item)?)
	}

	pub fn many(items: &[TodoItem]) -> Result<Value> {
		Ok(serde_json::to_value(items)?)
	}

	/// Validate a create request
	///
	/// `title` and `description` are required; `status` defaults to `OPEN`.
	///
	/// # Examples
	///
	/// ```
	/// use serde_json::json;
	/// use todo_core::TodoStatus;
	/// use todo_rest::serializers::TodoSerializer;
	///
	/// let fields = TodoSerializer::validate_create(&json!({
	///     "title": "Buy milk",
	///     "description": "Two litres",
	///     "id": 99,
	/// }))
	/// .unwrap();
	///
	/// assert_eq!(fields.title, "Buy milk");
	/// assert_eq!(fields.status, TodoStatus::Open);
	/// ```
	pub fn validate_create(data: &Value) -> Result<TodoFields> {
		let patch = Self::validate(data, false)?;
		let mut fields = TodoFields::new(
			patch.title.unwrap_or_default(),
			patch.description.unwrap_or_default(),
		);
		fields.due_date = patch.due_date.flatten();
		fields.tag = patch.tag.flatten();
		fields.status = patch.status.unwrap_or_default();
		Ok(fields)
	}

	/// Validate an update request
	///
	/// A full update (`partial == false`) requires `title` and
	/// `description`; omitted optional fields keep their stored values.
	pub fn validate_update(data: &Value, partial: bool) -> Result<TodoPatch> {
		Self::validate(data, partial)
	}

	/// Validate the body of a `change-status` request
	///
	/// Anything but one of the six status names, including a missing or null
	/// `status`, is `invalid_status`.
	pub fn validate_status(data: &Value) -> Result<TodoStatus> {
		let data = as_object(data)?;
		let status = match data.get("status") {
			None | Some(Value::Null) => Err(FieldError::new(
				"invalid_status",
				"Invalid status value",
			)),
			value => status_field(value),
		};
		status
			.map_err(|error| Error::from(ValidationErrors::single("status", error.code, error.message)))
	}

	fn validate(data: &Value, partial: bool) -> Result<TodoPatch> {
		let data = as_object(data)?;
		let mut errors = ValidationErrors::new();
		let mut patch = TodoPatch::default();

		match text_field(data, "title", partial, validate_title) {
			Ok(title) => patch.title = title,
			Err(error) => errors.add("title", error),
		}
		match text_field(data, "description", partial, validate_description) {
			Ok(description) => patch.description = description,
			Err(error) => errors.add("description", error),
		}

		match input(data, "due_date") {
			Input::Missing => {}
			Input::Null => patch.due_date = Some(None),
			Input::Text(value) => match parse_datetime(value) {
				Ok(due_date) => patch.due_date = Some(Some(due_date)),
				Err(error) => errors.add("due_date", error),
			},
			Input::Invalid => errors.add(
				"due_date",
				FieldError::new(
					"invalid_type",
					"Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].",
				),
			),
		}

		match input(data, "tag") {
			Input::Missing => {}
			Input::Null => patch.tag = Some(None),
			Input::Text(value) => match normalize_tag(Some(value.to_string())) {
				None => patch.tag = Some(None),
				Some(tag) => match validate_tag(&tag) {
					Ok(()) => patch.tag = Some(Some(tag)),
					Err(error) => errors.add("tag", error),
				},
			},
			Input::Invalid => errors.add("tag", not_a_string()),
		}

		if data.contains_key("status") {
			match status_field(data.get("status")) {
				Ok(status) => patch.status = Some(status),
				Err(error) => errors.add("status", error),
			}
		}

		errors.into_result()?;
		Ok(patch)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{TimeZone, Utc};
	use rstest::rstest;
	use serde_json::json;

	fn codes(err: Error) -> Vec<(String, String)> {
		let errors = err.field_errors().unwrap();
		errors
			.iter()
			.flat_map(|(field, list)| list.iter().map(move |e| (field.clone(), e.code.clone())))
			.collect()
	}

	#[rstest]
	fn test_create_parses_optional_fields() {
		let fields = TodoSerializer::validate_create(&json!({
			"title": "Test Todo",
			"description": "Test Description",
			"due_date": "2030-01-02T03:04:05Z",
			"tag": "work",
			"status": "WORKING",
			"created_at": "ignored",
		}))
		.unwrap();

		assert_eq!(
			fields.due_date,
			Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap())
		);
		assert_eq!(fields.tag.as_deref(), Some("work"));
		assert_eq!(fields.status, TodoStatus::Working);
	}

	#[rstest]
	fn test_create_collects_every_error() {
		let err = TodoSerializer::validate_create(&json!({
			"title": "",
			"due_date": "tomorrow-ish",
			"tag": "not a slug",
			"status": "NOT_A_STATUS",
		}))
		.unwrap_err();

		assert_eq!(
			codes(err),
			vec![
				("title".to_string(), "title_length".to_string()),
				("description".to_string(), "required".to_string()),
				("due_date".to_string(), "invalid_datetime".to_string()),
				("tag".to_string(), "invalid_slug".to_string()),
				("status".to_string(), "invalid_status".to_string()),
			]
		);
	}

	#[rstest]
	#[case(json!({"title": 5, "description": "d"}), "title", "invalid_type")]
	#[case(json!({"title": null, "description": "d"}), "title", "null")]
	#[case(json!({"title": "t", "description": "d", "tag": 3}), "tag", "invalid_type")]
	#[case(json!({"title": "t", "description": "d", "status": 1}), "status", "invalid_status")]
	fn test_wrong_types(#[case] body: Value, #[case] field: &str, #[case] code: &str) {
		let err = TodoSerializer::validate_create(&body).unwrap_err();
		assert_eq!(codes(err), vec![(field.to_string(), code.to_string())]);
	}

	#[rstest]
	#[case(json!({"title": "   ", "description": "d"}), "title", "title_length")]
	#[case(json!({"title": "t", "description": " \n\t"}), "description", "description_length")]
	fn test_blank_text_is_rejected(#[case] body: Value, #[case] field: &str, #[case] code: &str) {
		let err = TodoSerializer::validate_create(&body).unwrap_err();
		assert_eq!(codes(err), vec![(field.to_string(), code.to_string())]);
	}

	#[rstest]
	fn test_text_fields_are_trimmed() {
		let fields = TodoSerializer::validate_create(&json!({
			"title": "  Buy milk ",
			"description": "\tTwo litres\n",
		}))
		.unwrap();

		assert_eq!(fields.title, "Buy milk");
		assert_eq!(fields.description, "Two litres");
	}

	#[rstest]
	fn test_blank_tag_means_no_tag() {
		let patch = TodoSerializer::validate_update(&json!({"tag": ""}), true).unwrap();
		assert_eq!(patch.tag, Some(None));
	}

	#[rstest]
	fn test_partial_update_only_touches_supplied_fields() {
		let patch = TodoSerializer::validate_update(&json!({"due_date": null}), true).unwrap();

		assert_eq!(patch.title, None);
		assert_eq!(patch.due_date, Some(None));
		assert_eq!(patch.status, None);
	}

	#[rstest]
	fn test_full_update_requires_title_and_description() {
		let err = TodoSerializer::validate_update(&json!({"status": "OPEN"}), false).unwrap_err();

		assert_eq!(
			codes(err),
			vec![
				("title".to_string(), "required".to_string()),
				("description".to_string(), "required".to_string()),
			]
		);
	}

	#[rstest]
	#[case(json!({"status": "COMPLETED"}), Ok(TodoStatus::Completed))]
	#[case(json!({"status": "NOT_A_STATUS"}), Err("invalid_status"))]
	#[case(json!({}), Err("invalid_status"))]
	#[case(json!({"status": null}), Err("invalid_status"))]
	#[case(json!({"title": "x"}), Err("invalid_status"))]
	#[case(json!({"status": 3}), Err("invalid_status"))]
	fn test_validate_status(
		#[case] body: Value,
		#[case] expected: std::result::Result<TodoStatus, &str>,
	) {
		let result = TodoSerializer::validate_status(&body).map_err(|e| e.code());
		assert_eq!(result, expected.map_err(str::to_string));
	}

	#[rstest]
	fn test_non_object_body() {
		let err = TodoSerializer::validate_create(&json!([1, 2])).unwrap_err();
		assert_eq!(err.code(), "invalid");
	}

	#[rstest]
	fn test_representation_fields() {
		let now = Utc::now();
		let item = TodoItem {
			id: 1,
			title: "t".into(),
			description: "d".into(),
			due_date: None,
			tag: None,
			status: TodoStatus::Open,
			created_at: now,
			updated_at: now,
		};

		let value = TodoSerializer::to_representation(&item).unwrap();
		let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

		for field in FIELDS {
			assert!(keys.contains(&field), "missing {field}");
		}
		assert_eq!(value["status"], "OPEN");
		assert!(value["due_date"].is_null());
	}
}
