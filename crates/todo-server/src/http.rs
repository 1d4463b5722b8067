use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use todo_http::{Handler, Middleware, MiddlewareChain, Request, Response};

use crate::shutdown::ShutdownCoordinator;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Invalid address '{0}'")]
	InvalidAddress(String),

	#[error("Failed to bind {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// HTTP Server with middleware support
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	middlewares: Vec<Arc<dyn Middleware>>,
}

impl HttpServer {
	/// Create a new server with the given handler
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use todo_server::HttpServer;
	/// use todo_http::{Handler, Request, Response, Result};
	///
	/// struct Hello;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for Hello {
	///     async fn handle(&self, _req: Request) -> Result<Response> {
	///         Ok(Response::ok().with_body("Hello"))
	///     }
	/// }
	///
	/// let server = HttpServer::new(Arc::new(Hello));
	/// assert_eq!(server.middleware_count(), 0);
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			middlewares: Vec::new(),
		}
	}

	/// Add a middleware; the first one added sees each request first
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	pub fn middleware_count(&self) -> usize {
		self.middlewares.len()
	}

	/// The handler every connection dispatches to
	pub fn handler(&self) -> Arc<dyn Handler> {
		if self.middlewares.is_empty() {
			return self.handler.clone();
		}

		let mut chain = MiddlewareChain::new(self.handler.clone());
		for middleware in &self.middlewares {
			chain.add_middleware(middleware.clone());
		}
		Arc::new(chain)
	}

	/// Bind `addr` and serve until `coordinator` shuts down
	pub async fn listen_with_shutdown(
		self,
		addr: &str,
		coordinator: ShutdownCoordinator,
	) -> ServerResult<()> {
		let listener = bind(addr).await?;
		self.serve(listener, coordinator).await
	}

	/// Serve connections from an already bound listener
	///
	/// On shutdown the accept loop stops, open connections finish their
	/// in-flight request, and whatever is still open after the coordinator's
	/// timeout is aborted.
	pub async fn serve(
		self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> ServerResult<()> {
		let handler = self.handler();
		let mut connections = JoinSet::new();
		tracing::info!(addr = %listener.local_addr()?, "Server listening");

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, remote_addr) = match accepted {
						Ok(accepted) => accepted,
						Err(err) => {
							tracing::warn!(error = %err, "Failed to accept connection");
							continue;
						}
					};
					let handler = handler.clone();
					let coordinator = coordinator.clone();
					connections.spawn(async move {
						if let Err(err) = handle_connection(stream, remote_addr, handler, coordinator).await {
							tracing::debug!(remote_addr = %remote_addr, error = %err, "Connection closed with error");
						}
					});
				}
				Some(_) = connections.join_next(), if !connections.is_empty() => {}
				_ = coordinator.wait() => break,
			}
		}

		if !connections.is_empty() {
			tracing::info!(open = connections.len(), "Waiting for open connections");
		}
		let drained = tokio::time::timeout(coordinator.timeout(), async {
			while connections.join_next().await.is_some() {}
		})
		.await;
		if drained.is_err() {
			tracing::warn!(
				remaining = connections.len(),
				"Shutdown timeout elapsed, aborting open connections"
			);
			connections.abort_all();
		}

		tracing::info!("Server stopped");
		Ok(())
	}
}

/// Parse and bind a `host:port` address
pub async fn bind(addr: &str) -> ServerResult<TcpListener> {
	let addr: SocketAddr = addr
		.parse()
		.map_err(|_| ServerError::InvalidAddress(addr.to_string()))?;
	TcpListener::bind(addr)
		.await
		.map_err(|source| ServerError::Bind { addr, source })
}

async fn handle_connection(
	stream: TcpStream,
	remote_addr: SocketAddr,
	handler: Arc<dyn Handler>,
	coordinator: ShutdownCoordinator,
) -> Result<(), hyper::Error> {
	let io = TokioIo::new(stream);
	let service = RequestService {
		handler,
		remote_addr,
	};
	let conn = http1::Builder::new().serve_connection(io, service);
	tokio::pin!(conn);

	tokio::select! {
		result = conn.as_mut() => result,
		_ = coordinator.wait() => {
			conn.as_mut().graceful_shutdown();
			conn.await
		}
	}
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future =
		Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = body.collect().await?.to_bytes();

			let request = Request::builder()
				.method(parts.method)
				.uri(parts.uri.to_string())
				.version(parts.version)
				.headers(parts.headers)
				.body(body)
				.remote_addr(remote_addr)
				.build();
			let response = match request {
				Ok(request) => handler.handle(request).await.unwrap_or_else(Response::from),
				Err(err) => Response::from(err),
			};

			let mut hyper_response = hyper::Response::builder().status(response.status);
			for (key, value) in response.headers.iter() {
				hyper_response = hyper_response.header(key, value);
			}
			Ok(hyper_response.body(Full::new(response.body))?)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;
	use std::time::Duration;
	use todo_core::exception::{Error, Result};

	struct Hello;

	#[async_trait::async_trait]
	impl Handler for Hello {
		async fn handle(&self, request: Request) -> Result<Response> {
			match request.path() {
				"/missing" => Err(Error::NotFound("nothing here".to_string())),
				_ => Ok(Response::ok().with_body("Hello, World!")),
			}
		}
	}

	struct Prefix(&'static str);

	#[async_trait::async_trait]
	impl Middleware for Prefix {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			let response = next.handle(request).await?;
			let body = format!("{}{}", self.0, String::from_utf8_lossy(&response.body));
			Ok(Response::ok().with_body(body))
		}
	}

	async fn start(server: HttpServer) -> (SocketAddr, ShutdownCoordinator, tokio::task::JoinHandle<ServerResult<()>>) {
		let listener = bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
		let handle = tokio::spawn(server.serve(listener, coordinator.clone()));
		(addr, coordinator, handle)
	}

	#[rstest]
	#[tokio::test]
	async fn test_middleware_order() {
		let server = HttpServer::new(Arc::new(Hello))
			.with_middleware(Arc::new(Prefix("First:")))
			.with_middleware(Arc::new(Prefix("Second:")));
		let request = Request::builder().uri("/").build().unwrap();

		let response = server.handler().handle(request).await.unwrap();

		assert_eq!(server.middleware_count(), 2);
		assert_eq!(response.body_str(), "First:Second:Hello, World!");
	}

	#[rstest]
	#[tokio::test]
	async fn test_serves_and_renders_errors() {
		let (addr, coordinator, handle) = start(HttpServer::new(Arc::new(Hello))).await;

		let ok = reqwest::get(format!("http://{}/", addr)).await.unwrap();
		assert_eq!(ok.status().as_u16(), 200);
		assert_eq!(ok.text().await.unwrap(), "Hello, World!");

		let missing = reqwest::get(format!("http://{}/missing", addr)).await.unwrap();
		assert_eq!(missing.status().as_u16(), StatusCode::NOT_FOUND.as_u16());
		let body: serde_json::Value = missing.json().await.unwrap();
		assert_eq!(body["code"], "not_found");

		coordinator.shutdown();
		handle.await.unwrap().unwrap();
	}

	#[rstest]
	#[tokio::test]
	async fn test_stops_accepting_after_shutdown() {
		let (addr, coordinator, handle) = start(HttpServer::new(Arc::new(Hello))).await;

		coordinator.shutdown();
		tokio::time::timeout(Duration::from_secs(2), handle)
			.await
			.unwrap()
			.unwrap()
			.unwrap();

		assert!(TcpStream::connect(addr).await.is_err());
	}

	#[rstest]
	#[case("not-an-address")]
	#[case("127.0.0.1")]
	#[tokio::test]
	async fn test_bind_rejects_invalid_address(#[case] addr: &str) {
		let err = bind(addr).await.unwrap_err();
		assert!(matches!(err, ServerError::InvalidAddress(_)));
	}
}
