//! `POST /api/auth/token/`

use crate::tokens::TokenStore;
use async_trait::async_trait;
use hyper::Method;
use serde_json::Value;
use todo_core::exception::{Error, Result};
use todo_core::validators::{FieldError, ValidationErrors};
use todo_db::DatabaseConnection;
use todo_http::{Handler, Request, Response};

/// Exchange a username and password for the user's API token
#[derive(Clone)]
pub struct ObtainAuthToken {
	tokens: TokenStore,
}

impl ObtainAuthToken {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self {
			tokens: TokenStore::new(conn),
		}
	}
}

fn required_string(body: &Value, field: &str, errors: &mut ValidationErrors) -> Option<String> {
	match body.get(field) {
		Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
		Some(Value::String(_)) | None | Some(Value::Null) => {
			errors.add(field, FieldError::new("required", "This field is required."));
			None
		}
		Some(_) => {
			errors.add(field, FieldError::new("invalid_type", "Not a valid string."));
			None
		}
	}
}

#[async_trait]
impl Handler for ObtainAuthToken {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.method != Method::POST {
			return Err(Error::MethodNotAllowed {
				method: request.method.to_string(),
				allowed: vec!["POST".to_string()],
			});
		}

		let body: Value = request.json()?;
		let mut errors = ValidationErrors::new();
		let username = required_string(&body, "username", &mut errors);
		let password = required_string(&body, "password", &mut errors);
		let (Some(username), Some(password)) = (username, password) else {
			return Err(errors.into());
		};

		let Some(user) = self.tokens.users().authenticate(&username, &password).await? else {
			tracing::warn!(username = %username, "Token request with invalid credentials");
			return Err(ValidationErrors::single(
				"non_field_errors",
				"invalid_credentials",
				"Unable to log in with provided credentials.",
			)
			.into());
		};

		let token = self.tokens.get_or_create(&user).await?;
		Response::json(&serde_json::json!({ "token": token.key }))
	}
}
