//! REST API for todo-web
//!
//! - [`serializers`]: request validation and response rendering
//! - [`viewsets`]: the [`ViewSet`] trait and its [`Action`]s
//! - [`todos`]: the `todos` resource
//! - [`routers`]: path patterns and [`DefaultRouter`]
//! - [`views`]: the health check
//!
//! [`register_api_routes`] installs every API endpoint on a router:
//!
//! | Path | Methods |
//! |---|---|
//! | `/api/todos/` | GET, POST |
//! | `/api/todos/overdue/` | GET |
//! | `/api/todos/{id}/` | GET, PUT, PATCH, DELETE |
//! | `/api/todos/{id}/change-status/` | PATCH |
//! | `/api/auth/token/` | POST |
//! | `/health` | GET |

pub mod routers;
pub mod serializers;
pub mod todos;
pub mod views;
pub mod viewsets;

pub use routers::{DefaultRouter, PathPattern, Route};
pub use serializers::TodoSerializer;
pub use todos::TodoViewSet;
pub use views::HealthCheck;
pub use viewsets::{Action, ActionMetadata, ViewSet};

use hyper::Method;
use std::sync::Arc;
use todo_auth::ObtainAuthToken;
use todo_core::exception::Result;
use todo_db::{DatabaseConnection, TodoStore};

/// Register the todo API, the token endpoint and the health check
pub fn register_api_routes(router: &mut DefaultRouter, conn: &DatabaseConnection) -> Result<()> {
	router.register_viewset(
		"/api/todos/",
		Arc::new(TodoViewSet::new(TodoStore::new(conn.clone()))),
	)?;
	router.add_route(
		Route::from_handler("/api/auth/token/", ObtainAuthToken::new(conn.clone()))
			.with_name("api-token-auth")
			.with_methods([Method::POST]),
	)?;
	router.add_route(
		Route::from_handler("/health", HealthCheck)
			.with_name("health")
			.with_methods([Method::GET]),
	)?;
	Ok(())
}
