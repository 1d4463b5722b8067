use bytes::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;
use todo_core::exception::{Error, Result};

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use todo_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = header::HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Set the response body to JSON and add appropriate Content-Type header
	///
	/// # Examples
	///
	/// ```
	/// use todo_http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({"status": "ok"})).unwrap();
	///
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "application/json"
	/// );
	/// assert_eq!(response.body_str(), r#"{"status":"ok"}"#);
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}

	/// Shorthand for a `200 OK` JSON response
	pub fn json<T: Serialize>(data: &T) -> Result<Self> {
		Self::ok().with_json(data)
	}

	/// Body as UTF-8 text (lossy)
	pub fn body_str(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Parse the body as JSON
	pub fn body_json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
		Ok(serde_json::from_slice(&self.body)?)
	}

	/// Render an error as a JSON response
	///
	/// The body is `{"code": ..., "message": ...}` plus `"errors"` for field
	/// level failures. Server errors are logged and their detail withheld.
	pub fn from_error(error: &Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		let message = if error.is_server_error() {
			tracing::error!(error = %error, "Request failed with server error");
			"A server error occurred.".to_string()
		} else {
			match error {
				Error::Validation(errors) => errors
					.first_message()
					.map(str::to_string)
					.unwrap_or_else(|| error.to_string()),
				_ => error.to_string(),
			}
		};

		let mut body = serde_json::json!({
			"code": error.code(),
			"message": message,
		});
		if let Some(errors) = error.field_errors()
			&& let Ok(value) = serde_json::to_value(errors)
		{
			body["errors"] = value;
		}

		let mut response = Response::new(status);
		response.body = Bytes::from(body.to_string());
		response.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);

		match error {
			Error::NotAuthenticated | Error::AuthenticationFailed(_) => {
				response.headers.insert(
					header::WWW_AUTHENTICATE,
					HeaderValue::from_static("Token"),
				);
			}
			Error::MethodNotAllowed { allowed, .. } => {
				if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
					response.headers.insert(header::ALLOW, value);
				}
			}
			_ => {}
		}

		response
	}
}

impl From<Error> for Response {
	fn from(error: Error) -> Self {
		Response::from_error(&error)
	}
}
