//! URL routing
//!
//! [`DefaultRouter`] dispatches requests to handlers by path, registering
//! viewsets DRF-style: a list route, a detail route and one route per extra
//! action.

mod pattern;
mod route;
mod router;

pub use pattern::PathPattern;
pub use route::Route;
pub use router::DefaultRouter;

use std::sync::Arc;
use todo_http::Handler;

/// Shorthand for [`Route::new`]
pub fn path(path: &str, handler: Arc<dyn Handler>) -> Route {
	Route::new(path, handler)
}
