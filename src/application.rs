//! Application wiring
//!
//! ```text
//! settings -> database -> migrations -> router -> middleware
//! ```
//!
//! Requests pass through request logging, the allowed-hosts check and token
//! authentication, in that order, before reaching the router.

use std::sync::Arc;
use todo_admin::{ADMIN_PREFIX, TodoItemAdmin};
use todo_auth::TokenAuthentication;
use todo_conf::Settings;
use todo_core::exception::Result;
use todo_db::{DatabaseConnection, Migrator, TodoStore};
use todo_http::{Handler, MiddlewareChain};
use todo_rest::{DefaultRouter, register_api_routes};
use todo_server::{
	AllowedHostsMiddleware, HttpServer, RequestLoggingMiddleware, ServerResult, ShutdownCoordinator,
};
use tokio::net::TcpListener;

/// Every migration of the project, in dependency order
pub fn migrator() -> Migrator {
	Migrator::new()
		.with_migrations(todo_db::schema::migrations())
		.with_migrations(todo_auth::schema::migrations())
}

/// The API, token endpoint, health check and admin routes
pub fn build_router(conn: &DatabaseConnection, settings: &Settings) -> Result<DefaultRouter> {
	let mut router = DefaultRouter::new();
	register_api_routes(&mut router, conn)?;
	router.mount(
		ADMIN_PREFIX,
		todo_admin::routes(
			TodoStore::new(conn.clone()),
			TodoItemAdmin::new()
				.with_list_per_page(settings.admin_page_size)
				.with_time_zone(settings.timezone()?),
		),
	)?;
	Ok(router)
}

/// A fully wired todo-web instance
pub struct Application {
	settings: Arc<Settings>,
	conn: DatabaseConnection,
	router: Arc<DefaultRouter>,
}

impl Application {
	/// Validate settings, connect, migrate and build the router
	pub async fn build(settings: Settings) -> Result<Self> {
		settings.validate()?;
		let conn = DatabaseConnection::connect(&settings.database_url).await?;

		let applied = migrator().migrate(&conn).await?;
		if !applied.is_empty() {
			tracing::info!(count = applied.len(), "Applied pending migrations");
		}

		let router = build_router(&conn, &settings)?;
		tracing::info!(
			profile = %settings.profile,
			routes = router.get_routes().len(),
			"Application ready"
		);

		Ok(Self {
			settings: Arc::new(settings),
			conn,
			router: Arc::new(router),
		})
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn connection(&self) -> &DatabaseConnection {
		&self.conn
	}

	pub fn router(&self) -> &DefaultRouter {
		&self.router
	}

	pub fn store(&self) -> TodoStore {
		TodoStore::new(self.conn.clone())
	}

	/// The router behind the full middleware chain
	pub fn handler(&self) -> Arc<dyn Handler> {
		Arc::new(
			MiddlewareChain::new(self.router.clone())
				.with_middleware(Arc::new(RequestLoggingMiddleware::new()))
				.with_middleware(Arc::new(AllowedHostsMiddleware::new(self.settings.clone())))
				.with_middleware(Arc::new(TokenAuthentication::new(self.conn.clone()))),
		)
	}

	fn server(&self) -> HttpServer {
		HttpServer::new(self.handler())
	}

	/// Serve on `addr` until `coordinator` shuts down
	pub async fn serve(&self, addr: &str, coordinator: ShutdownCoordinator) -> ServerResult<()> {
		self.server().listen_with_shutdown(addr, coordinator).await
	}

	/// Serve on an already bound listener
	pub async fn serve_listener(
		&self,
		listener: TcpListener,
		coordinator: ShutdownCoordinator,
	) -> ServerResult<()> {
		self.server().serve(listener, coordinator).await
	}

	pub async fn close(&self) {
		self.conn.close().await;
	}
}
