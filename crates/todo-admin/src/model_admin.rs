//! Model admin configuration

use crate::actions::AdminAction;
use crate::filters::{DateFieldListFilter, ListFilter, StatusFilter};
use chrono_tz::Tz;
use serde::Serialize;
use todo_conf::settings::MAX_ADMIN_PAGE_SIZE;
use todo_core::models::TODO_TABLE;

/// A titled group of fields on the detail page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Fieldset {
	pub name: &'static str,
	pub fields: Vec<&'static str>,
	/// Presentation hints such as `collapse`
	pub classes: Vec<&'static str>,
}

impl Fieldset {
	pub fn new(name: &'static str, fields: impl IntoIterator<Item = &'static str>) -> Self {
		Self {
			name,
			fields: fields.into_iter().collect(),
			classes: Vec::new(),
		}
	}

	pub fn collapsed(mut self) -> Self {
		self.classes.push("collapse");
		self
	}
}

/// Trait for configuring model administration
pub trait ModelAdmin: Send + Sync {
	fn model_name(&self) -> &str;

	fn app_label(&self) -> &str;

	fn table_name(&self) -> &str;

	/// Columns of the changelist
	fn list_display(&self) -> Vec<&'static str>;

	fn list_filter(&self) -> Vec<Box<dyn ListFilter>> {
		Vec::new()
	}

	/// Columns matched by the `q` search parameter
	fn search_fields(&self) -> Vec<&'static str> {
		Vec::new()
	}

	fn fieldsets(&self) -> Vec<Fieldset> {
		Vec::new()
	}

	fn readonly_fields(&self) -> Vec<&'static str> {
		Vec::new()
	}

	/// Ordering of the changelist, `-` prefix for descending
	fn ordering(&self) -> Vec<&'static str> {
		vec!["-id"]
	}

	fn list_per_page(&self) -> usize {
		100
	}

	fn actions(&self) -> Vec<AdminAction> {
		Vec::new()
	}
}

/// Admin configuration of todo items
#[derive(Debug, Clone)]
pub struct TodoItemAdmin {
	list_per_page: usize,
	time_zone: Tz,
}

impl TodoItemAdmin {
	pub fn new() -> Self {
		Self {
			list_per_page: 100,
			time_zone: Tz::UTC,
		}
	}

	/// Calendar used by the date presets of the changelist
	pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
		self.time_zone = time_zone;
		self
	}

	pub fn time_zone(&self) -> Tz {
		self.time_zone
	}

	/// Override the default page size, clamped to `1..=1000`
	pub fn with_list_per_page(mut self, size: usize) -> Self {
		self.list_per_page = size.clamp(1, MAX_ADMIN_PAGE_SIZE);
		self
	}
}

impl Default for TodoItemAdmin {
	fn default() -> Self {
		Self::new()
	}
}

impl ModelAdmin for TodoItemAdmin {
	fn model_name(&self) -> &str {
		"todoitem"
	}

	fn app_label(&self) -> &str {
		"todo_app"
	}

	fn table_name(&self) -> &str {
		TODO_TABLE
	}

	fn list_display(&self) -> Vec<&'static str> {
		vec!["title", "status", "due_date", "tag", "created_at", "is_overdue"]
	}

	fn list_filter(&self) -> Vec<Box<dyn ListFilter>> {
		vec![
			Box::new(StatusFilter),
			Box::new(DateFieldListFilter::new("due_date", "due date")),
			Box::new(DateFieldListFilter::new("created_at", "created at")),
		]
	}

	fn search_fields(&self) -> Vec<&'static str> {
		vec!["title", "description", "tag"]
	}

	fn fieldsets(&self) -> Vec<Fieldset> {
		vec![
			Fieldset::new("Basic Information", ["title", "description", "tag"]),
			Fieldset::new("Status and Timing", ["status", "due_date"]),
			Fieldset::new("Timestamps", ["created_at", "updated_at"]).collapsed(),
		]
	}

	fn readonly_fields(&self) -> Vec<&'static str> {
		vec!["created_at", "updated_at"]
	}

	fn ordering(&self) -> Vec<&'static str> {
		vec!["-created_at", "-id"]
	}

	fn list_per_page(&self) -> usize {
		self.list_per_page
	}

	fn actions(&self) -> Vec<AdminAction> {
		AdminAction::ALL.to_vec()
	}
}
