//! The `todos` resource

use crate::serializers::TodoSerializer;
use crate::viewsets::{Action, ActionMetadata, ViewSet};
use async_trait::async_trait;
use hyper::Method;
use serde_json::Value;
use todo_auth::{IsAuthenticated, Permission};
use todo_core::exception::{Error, Result};
use todo_core::models::{TodoPatch, TodoStatus};
use todo_db::{TodoFilter, TodoStore};
use todo_http::{Request, Response};

/// CRUD plus `change-status` and `overdue` over [`TodoStore`]
///
/// Every action requires an authenticated caller.
#[derive(Clone)]
pub struct TodoViewSet {
	store: TodoStore,
}

impl TodoViewSet {
	pub fn new(store: TodoStore) -> Self {
		Self { store }
	}

	fn lookup(request: &Request) -> Result<i64> {
		request
			.path_param("id")
			.and_then(|id| id.parse().ok())
			.ok_or_else(|| Error::NotFound("No todo item matches the given query.".to_string()))
	}

	/// `GET /api/todos/?status=...`
	///
	/// An empty `status` means no filter; a value that is not a status
	/// matches nothing.
	async fn list(&self, request: &Request) -> Result<Response> {
		let mut filter = TodoFilter::new();
		if let Some(status) = request.query("status").filter(|s| !s.is_empty()) {
			match status.parse::<TodoStatus>() {
				Ok(status) => filter = filter.status(status),
				Err(_) => return Response::json(&Vec::<Value>::new()),
			}
		}
		let items = self.store.list(&filter).await?;
		Response::json(&TodoSerializer::many(&items)?)
	}

	async fn create(&self, request: &Request) -> Result<Response> {
		let fields = TodoSerializer::validate_create(&request.json::<Value>()?)?;
		let item = self.store.create(fields).await?;
		Response::created().with_json(&TodoSerializer::to_representation(&item)?)
	}

	async fn retrieve(&self, id: i64) -> Result<Response> {
		let item = self.store.get(id).await?;
		Response::json(&TodoSerializer::to_representation(&item)?)
	}

	async fn update(&self, id: i64, request: &Request, partial: bool) -> Result<Response> {
		self.store.get(id).await?;
		let patch = TodoSerializer::validate_update(&request.json::<Value>()?, partial)?;
		let item = self.store.update(id, patch).await?;
		Response::json(&TodoSerializer::to_representation(&item)?)
	}

	async fn destroy(&self, id: i64) -> Result<Response> {
		self.store.delete(id).await?;
		Ok(Response::no_content())
	}

	/// `PATCH /api/todos/{id}/change-status/`
	///
	/// Runs through the regular update path, so the overdue rule still
	/// applies to the new status.
	async fn change_status(&self, id: i64, request: &Request) -> Result<Response> {
		self.store.get(id).await?;
		let status = TodoSerializer::validate_status(&request.json::<Value>()?)?;
		let item = self.store.update(id, TodoPatch::status(status)).await?;
		Response::json(&TodoSerializer::to_representation(&item)?)
	}

	/// `GET /api/todos/overdue/`: records whose stored status is `OVERDUE`
	async fn overdue(&self) -> Result<Response> {
		let items = self.store.overdue().await?;
		Response::json(&TodoSerializer::many(&items)?)
	}
}

#[async_trait]
impl ViewSet for TodoViewSet {
	fn get_basename(&self) -> &str {
		"todo"
	}

	fn extra_actions(&self) -> Vec<ActionMetadata> {
		vec![
			ActionMetadata::new("change_status", true, [Method::PATCH])
				.with_url_path("change-status"),
			ActionMetadata::new("overdue", false, [Method::GET]),
		]
	}

	async fn dispatch(&self, request: Request, action: Action) -> Result<Response> {
		IsAuthenticated.check_request(&request)?;

		match action {
			Action::List => self.list(&request).await,
			Action::Create => self.create(&request).await,
			Action::Retrieve => self.retrieve(Self::lookup(&request)?).await,
			Action::Update => self.update(Self::lookup(&request)?, &request, false).await,
			Action::PartialUpdate => self.update(Self::lookup(&request)?, &request, true).await,
			Action::Destroy => self.destroy(Self::lookup(&request)?).await,
			Action::Extra(name) => match name.as_str() {
				"change_status" => self.change_status(Self::lookup(&request)?, &request).await,
				"overdue" => self.overdue().await,
				other => Err(Error::NotFound(format!("Unknown action {}", other))),
			},
		}
	}
}
