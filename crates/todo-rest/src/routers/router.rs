use super::{PathPattern, Route};
use crate::viewsets::{Action, ActionMetadata, ViewSet, method_not_allowed};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use todo_core::exception::{Error, Result};
use todo_http::{Handler, Request, Response};

/// URL router
///
/// Routes are tried in registration order; the first pattern matching the
/// request path wins and its captured parameters are stored in
/// `request.path_params`. Unmatched paths are `404 not_found`.
#[derive(Default)]
pub struct DefaultRouter {
	routes: Vec<(PathPattern, Route)>,
}

impl DefaultRouter {
	/// Create a new DefaultRouter
	///
	/// # Examples
	///
	/// ```
	/// use todo_rest::routers::DefaultRouter;
	///
	/// let router = DefaultRouter::new();
	/// assert!(router.get_routes().is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_route(&mut self, route: Route) -> Result<()> {
		let pattern = PathPattern::new(&route.path).map_err(Error::ImproperlyConfigured)?;
		tracing::debug!(path = %route.path, name = ?route.name, "Registered route");
		self.routes.push((pattern, route));
		Ok(())
	}

	/// Add `routes` with `prefix` prepended to each path
	pub fn mount(&mut self, prefix: &str, routes: Vec<Route>) -> Result<()> {
		let prefix = prefix.trim_end_matches('/');
		for mut route in routes {
			route.path = if route.path.starts_with('/') {
				format!("{}{}", prefix, route.path)
			} else {
				format!("{}/{}", prefix, route.path)
			};
			self.add_route(route)?;
		}
		Ok(())
	}

	/// Register the standard routes of a viewset under `prefix`
	///
	/// - `{prefix}/` (`{basename}-list`): list and create
	/// - `{prefix}/{action}/` for each collection-level extra action
	/// - `{prefix}/{lookup}/` (`{basename}-detail`): retrieve, update, destroy
	/// - `{prefix}/{lookup}/{action}/` for each detail extra action
	pub fn register_viewset<V: ViewSet + 'static>(
		&mut self,
		prefix: &str,
		viewset: Arc<V>,
	) -> Result<()> {
		let prefix = prefix.trim_matches('/');
		let basename = viewset.get_basename().to_string();
		let lookup = viewset.get_lookup_field().to_string();
		let (detail_actions, list_actions): (Vec<_>, Vec<_>) =
			viewset.extra_actions().into_iter().partition(|a| a.detail);

		self.add_route(
			Route::new(
				format!("/{}/", prefix),
				Arc::new(ViewSetListHandler {
					viewset: viewset.clone(),
				}),
			)
			.with_name(format!("{}-list", basename))
			.with_methods(Action::LIST_METHODS),
		)?;

		for action in list_actions {
			let path = format!("/{}/{}/", prefix, action.url_path());
			self.add_extra_action(path, &basename, action, viewset.clone())?;
		}

		self.add_route(
			Route::new(
				format!("/{}/{{{}}}/", prefix, lookup),
				Arc::new(ViewSetDetailHandler {
					viewset: viewset.clone(),
				}),
			)
			.with_name(format!("{}-detail", basename))
			.with_methods(Action::DETAIL_METHODS),
		)?;

		for action in detail_actions {
			let path = format!("/{}/{{{}}}/{}/", prefix, lookup, action.url_path());
			self.add_extra_action(path, &basename, action, viewset.clone())?;
		}

		Ok(())
	}

	fn add_extra_action<V: ViewSet + 'static>(
		&mut self,
		path: String,
		basename: &str,
		action: ActionMetadata,
		viewset: Arc<V>,
	) -> Result<()> {
		let name = format!("{}-{}", basename, action.url_path());
		let methods = action.methods.clone();
		self.add_route(
			Route::new(path, Arc::new(ExtraActionHandler { viewset, action }))
				.with_name(name)
				.with_methods(methods),
		)
	}

	pub fn get_routes(&self) -> Vec<&Route> {
		self.routes.iter().map(|(_, route)| route).collect()
	}

	/// Find the route serving `path`
	pub fn resolve(&self, path: &str) -> Option<(&Route, HashMap<String, String>)> {
		self.routes
			.iter()
			.find_map(|(pattern, route)| pattern.matches(path).map(|params| (route, params)))
	}

	pub async fn route(&self, mut request: Request) -> Result<Response> {
		let path = request.path().to_string();

		match self.resolve(&path) {
			Some((route, params)) => {
				tracing::debug!(path = %path, route = ?route.name, "Resolved route");
				request.path_params = params;
				route.handler().handle(request).await
			}
			None => Err(Error::NotFound(format!("No route found for {}", path))),
		}
	}
}

#[async_trait]
impl Handler for DefaultRouter {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.route(request).await
	}
}

struct ViewSetListHandler<V> {
	viewset: Arc<V>,
}

#[async_trait]
impl<V: ViewSet + 'static> Handler for ViewSetListHandler<V> {
	async fn handle(&self, request: Request) -> Result<Response> {
		match Action::for_list(&request.method) {
			Some(action) => self.viewset.dispatch(request, action).await,
			None => Err(method_not_allowed(&request, &Action::LIST_METHODS)),
		}
	}
}

struct ViewSetDetailHandler<V> {
	viewset: Arc<V>,
}

#[async_trait]
impl<V: ViewSet + 'static> Handler for ViewSetDetailHandler<V> {
	async fn handle(&self, request: Request) -> Result<Response> {
		match Action::for_detail(&request.method) {
			Some(action) => self.viewset.dispatch(request, action).await,
			None => Err(method_not_allowed(&request, &Action::DETAIL_METHODS)),
		}
	}
}

struct ExtraActionHandler<V> {
	viewset: Arc<V>,
	action: ActionMetadata,
}

#[async_trait]
impl<V: ViewSet + 'static> Handler for ExtraActionHandler<V> {
	async fn handle(&self, request: Request) -> Result<Response> {
		if !self.action.methods.contains(&request.method) {
			return Err(method_not_allowed(&request, &self.action.methods));
		}
		self.viewset
			.dispatch(request, Action::Extra(self.action.name.clone()))
			.await
	}
}
