//! HTTP request representation

mod params;

use crate::Extensions;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri, Version};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;
use todo_core::exception::{Error, Result};

/// A fully buffered HTTP request
#[derive(Debug)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Raw (still percent-encoded) query parameters
	pub query_params: HashMap<String, String>,
	/// Parameters captured by the router, e.g. `id` in `/api/todos/{id}/`
	pub path_params: HashMap<String, String>,
	pub remote_addr: Option<SocketAddr>,
	pub extensions: Extensions,
}

impl Request {
	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use todo_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/api/todos/?status=OPEN")
	///     .header("content-type", "application/json")
	///     .body(r#"{"title": "Buy milk"}"#)
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/api/todos/");
	/// assert_eq!(request.query("status").as_deref(), Some("OPEN"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Deserialize the JSON body
	///
	/// An empty body is read as `{}` so that missing fields are reported as
	/// validation errors rather than a parse failure.
	pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
		let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
			b"{}"
		} else {
			&self.body
		};
		serde_json::from_slice(body).map_err(|e| Error::ParseError(format!("JSON parse error - {}", e)))
	}

	/// First value of a header as a string
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}
}

/// Builder for [`Request`]
#[derive(Debug)]
pub struct RequestBuilder {
	method: Method,
	uri: String,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
	invalid_header: Option<String>,
}

impl Default for RequestBuilder {
	fn default() -> Self {
		Self {
			method: Method::GET,
			uri: "/".to_string(),
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			remote_addr: None,
			invalid_header: None,
		}
	}
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = uri.into();
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append a header; invalid names or values fail at [`build`](Self::build)
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.append(name, value);
			}
			_ => self.invalid_header = Some(name.to_string()),
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Serialize `value` as the JSON body and set the content type
	pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
		match serde_json::to_vec(value) {
			Ok(body) => {
				self.body = Bytes::from(body);
				self.headers.insert(
					hyper::header::CONTENT_TYPE,
					HeaderValue::from_static("application/json"),
				);
			}
			Err(_) => self.invalid_header = Some("body".to_string()),
		}
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	pub fn build(self) -> Result<Request> {
		if let Some(name) = self.invalid_header {
			return Err(Error::ParseError(format!("Invalid header: {}", name)));
		}
		let uri: Uri = self
			.uri
			.parse()
			.map_err(|e| Error::ParseError(format!("Invalid URI: {}", e)))?;
		let query_params = Request::parse_query_params(&uri);

		Ok(Request {
			method: self.method,
			uri,
			version: self.version,
			headers: self.headers,
			body: self.body,
			query_params,
			path_params: HashMap::new(),
			remote_addr: self.remote_addr,
			extensions: Extensions::new(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::Value;

	#[rstest]
	fn test_json_body() {
		let request = Request::builder()
			.method(Method::POST)
			.body(r#"{"title": "a"}"#)
			.build()
			.unwrap();

		let value: Value = request.json().unwrap();
		assert_eq!(value["title"], "a");
	}

	#[rstest]
	fn test_empty_body_reads_as_empty_object() {
		let request = Request::builder().body("  \n").build().unwrap();

		let value: Value = request.json().unwrap();
		assert_eq!(value, serde_json::json!({}));
	}

	#[rstest]
	fn test_malformed_json_is_parse_error() {
		let request = Request::builder().body("{not json").build().unwrap();

		let err = request.json::<Value>().unwrap_err();
		assert_eq!(err.code(), "parse_error");
		assert_eq!(err.status_code(), 400);
	}

	#[rstest]
	fn test_invalid_header_fails_build() {
		let result = Request::builder().header("bad header", "x").build();
		assert!(matches!(result, Err(Error::ParseError(_))));
	}

	#[rstest]
	fn test_header_lookup() {
		let request = Request::builder()
			.header("Authorization", "Token abc")
			.build()
			.unwrap();

		assert_eq!(request.header("authorization"), Some("Token abc"));
		assert_eq!(request.header("x-missing"), None);
	}
}
