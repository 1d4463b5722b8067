//! ViewSet abstraction
//!
//! A viewset groups the handlers of one resource. The router maps each
//! (route, method) pair onto an [`Action`] and calls [`ViewSet::dispatch`].

use async_trait::async_trait;
use hyper::Method;
use todo_core::exception::{Error, Result};
use todo_http::{Request, Response};

/// What a request asks a viewset to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
	List,
	Create,
	Retrieve,
	Update,
	PartialUpdate,
	Destroy,
	/// A custom action declared through [`ViewSet::extra_actions`]
	Extra(String),
}

impl Action {
	pub fn name(&self) -> &str {
		match self {
			Action::List => "list",
			Action::Create => "create",
			Action::Retrieve => "retrieve",
			Action::Update => "update",
			Action::PartialUpdate => "partial_update",
			Action::Destroy => "destroy",
			Action::Extra(name) => name,
		}
	}

	/// Actions of the collection route, by method
	pub fn for_list(method: &Method) -> Option<Self> {
		match *method {
			Method::GET => Some(Action::List),
			Method::POST => Some(Action::Create),
			_ => None,
		}
	}

	/// Actions of the detail route, by method
	pub fn for_detail(method: &Method) -> Option<Self> {
		match *method {
			Method::GET => Some(Action::Retrieve),
			Method::PUT => Some(Action::Update),
			Method::PATCH => Some(Action::PartialUpdate),
			Method::DELETE => Some(Action::Destroy),
			_ => None,
		}
	}

	pub const LIST_METHODS: [Method; 2] = [Method::GET, Method::POST];
	pub const DETAIL_METHODS: [Method; 4] = [Method::GET, Method::PUT, Method::PATCH, Method::DELETE];
}

/// A custom `@action`-style endpoint
#[derive(Debug, Clone)]
pub struct ActionMetadata {
	/// Action name, also the URL segment unless `url_path` is set
	pub name: String,
	pub url_path: Option<String>,
	/// Whether the action targets a single record (`/{lookup}/name/`)
	pub detail: bool,
	pub methods: Vec<Method>,
}

impl ActionMetadata {
	pub fn new(name: impl Into<String>, detail: bool, methods: impl IntoIterator<Item = Method>) -> Self {
		Self {
			name: name.into(),
			url_path: None,
			detail,
			methods: methods.into_iter().collect(),
		}
	}

	pub fn with_url_path(mut self, url_path: impl Into<String>) -> Self {
		self.url_path = Some(url_path.into());
		self
	}

	pub fn url_path(&self) -> &str {
		self.url_path.as_deref().unwrap_or(&self.name)
	}
}

/// 405 for `request` given the methods a route supports
pub fn method_not_allowed(request: &Request, allowed: &[Method]) -> Error {
	Error::MethodNotAllowed {
		method: request.method.to_string(),
		allowed: allowed.iter().map(|m| m.to_string()).collect(),
	}
}

#[async_trait]
pub trait ViewSet: Send + Sync {
	/// Prefix of route names, e.g. `todos` for `todos-list`
	fn get_basename(&self) -> &str;

	/// Path parameter identifying a record, with its converter
	fn get_lookup_field(&self) -> &str {
		"id:int"
	}

	fn extra_actions(&self) -> Vec<ActionMetadata> {
		Vec::new()
	}

	async fn dispatch(&self, request: Request, action: Action) -> Result<Response>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Method::GET, Some(Action::Retrieve))]
	#[case(Method::PUT, Some(Action::Update))]
	#[case(Method::PATCH, Some(Action::PartialUpdate))]
	#[case(Method::DELETE, Some(Action::Destroy))]
	#[case(Method::POST, None)]
	fn test_detail_actions(#[case] method: Method, #[case] expected: Option<Action>) {
		assert_eq!(Action::for_detail(&method), expected);
	}

	#[rstest]
	fn test_action_url_path() {
		let action = ActionMetadata::new("change_status", true, [Method::PATCH])
			.with_url_path("change-status");

		assert_eq!(action.url_path(), "change-status");
		assert_eq!(Action::Extra(action.name.clone()).name(), "change_status");
	}

	#[rstest]
	fn test_method_not_allowed_lists_methods() {
		let request = Request::builder().method(Method::POST).build().unwrap();

		let err = method_not_allowed(&request, &Action::DETAIL_METHODS);

		match err {
			Error::MethodNotAllowed { method, allowed } => {
				assert_eq!(method, "POST");
				assert_eq!(allowed, vec!["GET", "PUT", "PATCH", "DELETE"]);
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}
}
