//! Error taxonomy
//!
//! Every layer reports failures through [`Error`]. Each variant knows the
//! HTTP status it maps to and the machine-readable code sent to clients, so
//! the HTTP layer can render any error without inspecting its origin.

use crate::validators::ValidationErrors;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Client input failed one or more field rules
	#[error("Validation error: {0}")]
	Validation(ValidationErrors),

	/// The referenced record or route does not exist
	#[error("Not found: {0}")]
	NotFound(String),

	/// No credentials were supplied
	#[error("Authentication credentials were not provided")]
	NotAuthenticated,

	/// Credentials were supplied but rejected
	#[error("Authentication failed: {0}")]
	AuthenticationFailed(String),

	/// The caller is authenticated but lacks the required privilege
	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	/// A unique field value is already taken by another record
	#[error("{field} '{value}' is already in use")]
	Conflict { field: String, value: String },

	/// The request body could not be parsed
	#[error("Malformed request: {0}")]
	ParseError(String),

	/// The route exists but does not accept the method
	#[error("Method \"{method}\" not allowed")]
	MethodNotAllowed { method: String, allowed: Vec<String> },

	/// An admin action name outside the registered set
	#[error("Invalid action: {0}")]
	InvalidAction(String),

	#[error("Database error: {0}")]
	Database(String),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl Error {
	/// Shorthand for a missing todo item
	pub fn todo_not_found(id: impl std::fmt::Display) -> Self {
		Self::NotFound(format!("Todo item {} does not exist", id))
	}

	/// Shorthand for a tag uniqueness violation
	pub fn tag_conflict(tag: impl Into<String>) -> Self {
		Self::Conflict {
			field: "tag".to_string(),
			value: tag.into(),
		}
	}

	/// HTTP status code for this error
	pub fn status_code(&self) -> u16 {
		match self {
			Error::Validation(_)
			| Error::Conflict { .. }
			| Error::ParseError(_)
			| Error::InvalidAction(_) => 400,
			Error::NotAuthenticated | Error::AuthenticationFailed(_) => 401,
			Error::PermissionDenied(_) => 403,
			Error::NotFound(_) => 404,
			Error::MethodNotAllowed { .. } => 405,
			Error::Database(_)
			| Error::Serialization(_)
			| Error::ImproperlyConfigured(_)
			| Error::Other(_) => 500,
		}
	}

	/// Machine-readable error code
	///
	/// For validation failures this is the code of the first field error,
	/// e.g. `title_length` or `invalid_status`.
	pub fn code(&self) -> String {
		match self {
			Error::Validation(errors) => errors
				.first_code()
				.unwrap_or("invalid")
				.to_string(),
			Error::NotFound(_) => "not_found".to_string(),
			Error::NotAuthenticated => "not_authenticated".to_string(),
			Error::AuthenticationFailed(_) => "authentication_failed".to_string(),
			Error::PermissionDenied(_) => "permission_denied".to_string(),
			Error::Conflict { field, .. } => format!("{}_conflict", field),
			Error::ParseError(_) => "parse_error".to_string(),
			Error::MethodNotAllowed { .. } => "method_not_allowed".to_string(),
			Error::InvalidAction(_) => "invalid_action".to_string(),
			Error::Database(_)
			| Error::Serialization(_)
			| Error::ImproperlyConfigured(_)
			| Error::Other(_) => "server_error".to_string(),
		}
	}

	/// Whether the error is the server's fault rather than the client's
	pub fn is_server_error(&self) -> bool {
		self.status_code() >= 500
	}

	/// Per-field error details, when the error concerns specific fields
	pub fn field_errors(&self) -> Option<ValidationErrors> {
		match self {
			Error::Validation(errors) => Some(errors.clone()),
			Error::Conflict { field, value } => {
				let mut errors = ValidationErrors::new();
				errors.add(
					field.clone(),
					crate::validators::FieldError::new(
						format!("{}_conflict", field),
						format!("todo item with this {} ('{}') already exists.", field, value),
					),
				);
				Some(errors)
			}
			_ => None,
		}
	}
}

impl From<ValidationErrors> for Error {
	fn from(errors: ValidationErrors) -> Self {
		Error::Validation(errors)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}
