//! Admin endpoints
//!
//! - `GET /admin/todo_app/todoitem/`: changelist
//! - `GET /admin/todo_app/todoitem/{id}/`: detail
//! - `POST /admin/todo_app/todoitem/actions/`: bulk action
//!
//! All three are staff only.

use crate::actions::AdminAction;
use crate::filters::{DateRangePreset, ListFilter};
use crate::model_admin::{ModelAdmin, TodoItemAdmin};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use hyper::Method;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use todo_auth::{IsAdminUser, Permission};
use todo_core::exception::{Error, Result};
use todo_core::models::{TodoItem, TodoStatus};
use todo_core::validation::parse_datetime;
use todo_core::validators::{FieldError, ValidationErrors};
use todo_db::{TodoFilter, TodoStore, now};
use todo_http::{Handler, Request, Response};
use todo_rest::Route;
use todo_rest::viewsets::method_not_allowed;

/// Shared state of the admin views
pub struct AdminSite {
	store: TodoStore,
	admin: TodoItemAdmin,
}

impl AdminSite {
	pub fn new(store: TodoStore, admin: TodoItemAdmin) -> Self {
		Self { store, admin }
	}

	pub fn admin(&self) -> &TodoItemAdmin {
		&self.admin
	}
}

/// Query parameters of the changelist, resolved against the request time
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeListQuery {
	pub filter: TodoFilter,
	/// Set when `status` names no status; the result is then empty
	pub matches_nothing: bool,
	pub page: u64,
	pub page_size: u64,
}

fn date_bounds(
	request: &Request,
	field: &str,
	now: DateTime<Utc>,
	tz: Tz,
	errors: &mut ValidationErrors,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
	let (mut gte, mut lt) = (None, None);

	if let Some(preset) = request.query(field).filter(|v| !v.is_empty()) {
		match preset.parse::<DateRangePreset>() {
			Ok(preset) => {
				let (start, end) = preset.bounds(now, tz);
				gte = Some(start);
				lt = Some(end);
			}
			Err(message) => errors.add(field, FieldError::new("invalid_choice", message)),
		}
	}

	for (suffix, slot) in [("gte", &mut gte), ("lt", &mut lt)] {
		let param = format!("{}__{}", field, suffix);
		if let Some(value) = request.query(&param).filter(|v| !v.is_empty()) {
			match parse_datetime(&value) {
				Ok(bound) => *slot = Some(bound),
				Err(error) => errors.add(param, error),
			}
		}
	}

	(gte, lt)
}

impl ChangeListQuery {
	/// Resolve the query string of `request`; date presets use the calendar of `tz`
	pub fn from_request(
		request: &Request,
		now: DateTime<Utc>,
		tz: Tz,
		default_page_size: usize,
	) -> Result<Self> {
		let mut errors = ValidationErrors::new();
		let mut filter = TodoFilter::new();
		let mut matches_nothing = false;

		if let Some(status) = request.query("status").filter(|s| !s.is_empty()) {
			match status.parse::<TodoStatus>() {
				Ok(status) => filter = filter.status(status),
				Err(_) => matches_nothing = true,
			}
		}

		let (gte, lt) = date_bounds(request, "due_date", now, tz, &mut errors);
		filter = filter.due_between(gte, lt);
		let (gte, lt) = date_bounds(request, "created_at", now, tz, &mut errors);
		filter = filter.created_between(gte, lt);

		if let Some(q) = request.query("q")
			&& !q.trim().is_empty()
		{
			filter = filter.search(q.trim());
		}
		errors.into_result()?;

		let page = match request.query("page") {
			None => 1,
			Some(value) => value
				.parse::<u64>()
				.ok()
				.filter(|p| *p >= 1)
				.ok_or_else(|| Error::NotFound("Invalid page.".to_string()))?,
		};
		let page_size = request
			.query("page_size")
			.and_then(|v| v.parse::<usize>().ok())
			.map(|size| size.clamp(1, todo_conf::settings::MAX_ADMIN_PAGE_SIZE))
			.unwrap_or(default_page_size);

		Ok(Self {
			filter,
			matches_nothing,
			page,
			page_size: page_size as u64,
		})
	}
}

fn changelist_row(item: &TodoItem, columns: &[&str], now: DateTime<Utc>) -> Result<Value> {
	let full = serde_json::to_value(item)?;
	let mut row = Map::new();
	row.insert("id".to_string(), json!(item.id));
	for column in columns {
		let value = match *column {
			"is_overdue" => json!(item.is_overdue(now)),
			other => full.get(other).cloned().unwrap_or(Value::Null),
		};
		row.insert(column.to_string(), value);
	}
	Ok(Value::Object(row))
}

/// `GET /admin/todo_app/todoitem/`
pub struct ChangeListView {
	site: Arc<AdminSite>,
}

impl ChangeListView {
	pub fn new(site: Arc<AdminSite>) -> Self {
		Self { site }
	}
}

#[async_trait]
impl Handler for ChangeListView {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.method != Method::GET {
			return Err(method_not_allowed(&request, &[Method::GET]));
		}
		IsAdminUser.check_request(&request)?;

		let admin = &self.site.admin;
		let now = now();
		let query =
			ChangeListQuery::from_request(&request, now, admin.time_zone(), admin.list_per_page())?;

		let count = if query.matches_nothing {
			0
		} else {
			self.site.store.count(&query.filter).await?
		};
		let total_pages = count.div_ceil(query.page_size).max(1);
		if query.page > total_pages {
			return Err(Error::NotFound("Invalid page.".to_string()));
		}

		let items = if query.matches_nothing {
			Vec::new()
		} else {
			let filter = query
				.filter
				.clone()
				.limit(query.page_size)
				.offset((query.page - 1) * query.page_size);
			self.site.store.list(&filter).await?
		};

		let columns = admin.list_display();
		let results = items
			.iter()
			.map(|item| changelist_row(item, &columns, now))
			.collect::<Result<Vec<_>>>()?;
		let filters: Vec<_> = admin.list_filter().iter().map(|f| f.info()).collect();
		let actions: Vec<_> = admin.actions().iter().map(AdminAction::info).collect();

		Response::json(&json!({
			"model_name": admin.model_name(),
			"app_label": admin.app_label(),
			"count": count,
			"page": query.page,
			"page_size": query.page_size,
			"total_pages": total_pages,
			"list_display": columns,
			"search_fields": admin.search_fields(),
			"results": results,
			"filters": filters,
			"actions": actions,
		}))
	}
}

/// `GET /admin/todo_app/todoitem/{id}/`
pub struct ChangeView {
	site: Arc<AdminSite>,
}

impl ChangeView {
	pub fn new(site: Arc<AdminSite>) -> Self {
		Self { site }
	}
}

#[async_trait]
impl Handler for ChangeView {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.method != Method::GET {
			return Err(method_not_allowed(&request, &[Method::GET]));
		}
		IsAdminUser.check_request(&request)?;

		let id = request
			.path_param("id")
			.and_then(|id| id.parse::<i64>().ok())
			.ok_or_else(|| Error::NotFound("No todo item matches the given query.".to_string()))?;
		let item = self.site.store.get(id).await?;
		let full = serde_json::to_value(&item)?;

		let fieldsets: Vec<Value> = self
			.site
			.admin
			.fieldsets()
			.into_iter()
			.map(|fieldset| {
				let fields: Map<String, Value> = fieldset
					.fields
					.iter()
					.map(|f| (f.to_string(), full.get(*f).cloned().unwrap_or(Value::Null)))
					.collect();
				json!({
					"name": fieldset.name,
					"classes": fieldset.classes,
					"fields": fields,
				})
			})
			.collect();

		Response::json(&json!({
			"id": item.id,
			"object_repr": item.to_string(),
			"is_overdue": item.is_overdue(now()),
			"fieldsets": fieldsets,
			"readonly_fields": self.site.admin.readonly_fields(),
		}))
	}
}

/// `POST /admin/todo_app/todoitem/actions/`
pub struct ActionView {
	site: Arc<AdminSite>,
}

impl ActionView {
	pub fn new(site: Arc<AdminSite>) -> Self {
		Self { site }
	}
}

fn selected_ids(body: &Value) -> Result<Vec<i64>> {
	match body.get("ids") {
		None | Some(Value::Null) => Ok(Vec::new()),
		Some(Value::Array(values)) => values
			.iter()
			.map(|v| {
				v.as_i64().ok_or_else(|| {
					Error::Validation(ValidationErrors::single(
						"ids",
						"invalid_type",
						format!("\"{}\" is not a valid id.", v),
					))
				})
			})
			.collect(),
		Some(_) => Err(Error::Validation(ValidationErrors::single(
			"ids",
			"invalid_type",
			"Expected a list of ids.",
		))),
	}
}

#[async_trait]
impl Handler for ActionView {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.method != Method::POST {
			return Err(method_not_allowed(&request, &[Method::POST]));
		}
		let auth = IsAdminUser.check_request(&request)?;

		let body: Value = request.json()?;
		let action: AdminAction = match body.get("action") {
			Some(Value::String(name)) => name.parse()?,
			Some(other) => return Err(Error::InvalidAction(format!("Unknown action {}", other))),
			None => return Err(Error::InvalidAction("No action selected.".to_string())),
		};
		let ids = selected_ids(&body)?;

		let updated = action.run(&self.site.store, &ids).await?;
		tracing::info!(user = %auth.username, action = action.name(), updated, "Admin bulk action");

		Response::json(&json!({
			"action": action.name(),
			"updated": updated,
		}))
	}
}

/// Admin routes for todo items, relative to the admin mount point
pub fn routes(store: TodoStore, admin: TodoItemAdmin) -> Vec<Route> {
	let site = Arc::new(AdminSite::new(store, admin));
	let prefix = format!("/{}/{}", site.admin.app_label(), site.admin.model_name());
	vec![
		Route::from_handler(format!("{}/", prefix), ChangeListView::new(site.clone()))
			.with_name("admin:todoitem-changelist")
			.with_methods([Method::GET]),
		Route::from_handler(format!("{}/actions/", prefix), ActionView::new(site.clone()))
			.with_name("admin:todoitem-actions")
			.with_methods([Method::POST]),
		Route::from_handler(format!("{}/{{id:int}}/", prefix), ChangeView::new(site))
			.with_name("admin:todoitem-change")
			.with_methods([Method::GET]),
	]
}
