use hyper::Method;
use std::sync::Arc;
use todo_http::Handler;

/// Route definition
///
/// Couples a path pattern with the handler serving it. `methods` is what the
/// handler accepts and is only used for listings such as `manage showurls`.
#[derive(Clone)]
pub struct Route {
	pub path: String,
	handler: Arc<dyn Handler>,
	pub name: Option<String>,
	pub methods: Vec<Method>,
}

impl Route {
	pub fn new(path: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
		Self {
			path: path.into(),
			handler,
			name: None,
			methods: Vec::new(),
		}
	}

	pub fn from_handler<H>(path: impl Into<String>, handler: H) -> Self
	where
		H: Handler + 'static,
	{
		Self::new(path, Arc::new(handler))
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
		self.methods = methods.into_iter().collect();
		self
	}

	pub fn handler(&self) -> &Arc<dyn Handler> {
		&self.handler
	}
}

impl std::fmt::Debug for Route {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Route")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("methods", &self.methods)
			.finish()
	}
}
