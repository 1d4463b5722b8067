//! Plain views that are not part of a viewset

use async_trait::async_trait;
use hyper::Method;
use todo_core::exception::{Error, Result};
use todo_http::{Handler, Request, Response};

/// `GET /health`
///
/// Answers `{"status": "ok"}` without authentication or database access.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCheck;

#[async_trait]
impl Handler for HealthCheck {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.method != Method::GET && request.method != Method::HEAD {
			return Err(Error::MethodNotAllowed {
				method: request.method.to_string(),
				allowed: vec!["GET".to_string(), "HEAD".to_string()],
			});
		}
		Response::json(&serde_json::json!({ "status": "ok" }))
	}
}
