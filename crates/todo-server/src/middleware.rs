//! Server-level middleware

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use todo_conf::Settings;
use todo_core::exception::{Error, Result};
use todo_http::{Handler, Middleware, Request, Response};

/// Logs method, path, status and latency of every request
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLoggingMiddleware;

impl RequestLoggingMiddleware {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for RequestLoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let start = Instant::now();
		let method = request.method.to_string();
		let path = request.path().to_string();

		let result = next.handle(request).await;

		let latency_ms = start.elapsed().as_millis() as u64;
		match &result {
			Ok(response) => {
				tracing::info!(
					method = %method,
					path = %path,
					status = response.status.as_u16(),
					latency_ms,
					"Request completed"
				);
			}
			Err(err) if err.is_server_error() => {
				tracing::error!(
					method = %method,
					path = %path,
					status = err.status_code(),
					latency_ms,
					error = %err,
					"Request failed"
				);
			}
			Err(err) => {
				tracing::info!(
					method = %method,
					path = %path,
					status = err.status_code(),
					latency_ms,
					code = %err.code(),
					"Request rejected"
				);
			}
		}

		result
	}
}

/// Rejects requests whose `Host` is not in `allowed_hosts`
///
/// Requests without a host (in-process calls) pass through.
pub struct AllowedHostsMiddleware {
	settings: Arc<Settings>,
}

impl AllowedHostsMiddleware {
	pub fn new(settings: Arc<Settings>) -> Self {
		Self { settings }
	}

	fn host(request: &Request) -> Option<String> {
		request
			.header("host")
			.map(str::to_string)
			.or_else(|| request.uri.authority().map(|a| a.to_string()))
	}
}

#[async_trait]
impl Middleware for AllowedHostsMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		if let Some(host) = Self::host(&request)
			&& !self.settings.is_host_allowed(&host)
		{
			tracing::warn!(host = %host, "Rejected request for disallowed host");
			return Err(Error::ParseError(format!(
				"Invalid HTTP_HOST header: '{}'. You may need to add it to allowed_hosts.",
				host
			)));
		}
		next.handle(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	struct Ok200;

	#[async_trait]
	impl Handler for Ok200 {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::ok().with_body("OK"))
		}
	}

	struct Fails;

	#[async_trait]
	impl Handler for Fails {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err(Error::NotFound("gone".to_string()))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_logging_passes_response_through() {
		let request = Request::builder().uri("/api/todos/").build().unwrap();

		let response = RequestLoggingMiddleware::new()
			.process(request, Arc::new(Ok200))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.body_str(), "OK");
	}

	#[rstest]
	#[tokio::test]
	async fn test_logging_passes_errors_through() {
		let request = Request::builder().uri("/nope").build().unwrap();

		let err = RequestLoggingMiddleware::new()
			.process(request, Arc::new(Fails))
			.await
			.unwrap_err();

		assert_eq!(err.status_code(), 404);
	}

	#[rstest]
	#[case(Some("localhost:8000"), true)]
	#[case(Some("127.0.0.1"), true)]
	#[case(Some("evil.example.com"), false)]
	#[case(None, true)]
	#[tokio::test]
	async fn test_allowed_hosts(#[case] host: Option<&str>, #[case] allowed: bool) {
		let middleware = AllowedHostsMiddleware::new(Arc::new(Settings::default()));
		let mut builder = Request::builder().uri("/health");
		if let Some(host) = host {
			builder = builder.header("host", host);
		}

		let result = middleware
			.process(builder.build().unwrap(), Arc::new(Ok200))
			.await;

		assert_eq!(result.is_ok(), allowed);
		if let Err(err) = result {
			assert_eq!(err.status_code(), 400);
		}
	}
}
