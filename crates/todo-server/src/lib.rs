//! HTTP server for todo-web
//!
//! A hyper HTTP/1.1 server that runs every request through a
//! [`Handler`](todo_http::Handler), usually a middleware chain in front of
//! the router. Each connection is served on its own tokio task.
//!
//! ```rust,ignore
//! use todo_server::{HttpServer, ShutdownCoordinator, RequestLoggingMiddleware};
//!
//! let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
//! HttpServer::new(router)
//!     .with_middleware(Arc::new(RequestLoggingMiddleware::new()))
//!     .listen_with_shutdown(addr, coordinator)
//!     .await?;
//! ```

pub mod http;
pub mod middleware;
pub mod shutdown;

pub use http::{HttpServer, ServerError, ServerResult};
pub use middleware::{AllowedHostsMiddleware, RequestLoggingMiddleware};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
