//! Todo item model
//!
//! [`TodoItem`] is the persisted record. Writes go through [`TodoFields`]
//! (the complete set of client-editable fields) or [`TodoPatch`] (a subset,
//! merged onto an existing record before it is validated and saved).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table name of the todo model
pub const TODO_TABLE: &str = "todo_app_todoitem";

/// Lifecycle status of a todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TodoStatus {
	#[default]
	Open,
	Working,
	PendingReview,
	Completed,
	Overdue,
	Cancelled,
}

impl TodoStatus {
	/// Every status, in declaration order
	pub const ALL: [TodoStatus; 6] = [
		TodoStatus::Open,
		TodoStatus::Working,
		TodoStatus::PendingReview,
		TodoStatus::Completed,
		TodoStatus::Overdue,
		TodoStatus::Cancelled,
	];

	/// Stored and wire value, e.g. `PENDING_REVIEW`
	pub fn as_str(&self) -> &'static str {
		match self {
			TodoStatus::Open => "OPEN",
			TodoStatus::Working => "WORKING",
			TodoStatus::PendingReview => "PENDING_REVIEW",
			TodoStatus::Completed => "COMPLETED",
			TodoStatus::Overdue => "OVERDUE",
			TodoStatus::Cancelled => "CANCELLED",
		}
	}

	/// Human-readable label, e.g. `Pending Review`
	pub fn label(&self) -> &'static str {
		match self {
			TodoStatus::Open => "Open",
			TodoStatus::Working => "Working",
			TodoStatus::PendingReview => "Pending Review",
			TodoStatus::Completed => "Completed",
			TodoStatus::Overdue => "Overdue",
			TodoStatus::Cancelled => "Cancelled",
		}
	}

	/// Completed and cancelled items never become overdue
	pub fn is_terminal(&self) -> bool {
		matches!(self, TodoStatus::Completed | TodoStatus::Cancelled)
	}

	/// `(value, label)` pairs, as used for choice lists
	pub fn choices() -> Vec<(&'static str, &'static str)> {
		Self::ALL.iter().map(|s| (s.as_str(), s.label())).collect()
	}
}

impl fmt::Display for TodoStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Returned when a string is not one of the six status values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice")]
pub struct ParseStatusError(pub String);

impl FromStr for TodoStatus {
	type Err = ParseStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|status| status.as_str() == s)
			.ok_or_else(|| ParseStatusError(s.to_string()))
	}
}

/// A persisted todo item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
	pub id: i64,
	pub title: String,
	pub description: String,
	pub due_date: Option<DateTime<Utc>>,
	pub tag: Option<String>,
	pub status: TodoStatus,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl TodoItem {
	/// The client-editable part of the record
	pub fn fields(&self) -> TodoFields {
		TodoFields {
			title: self.title.clone(),
			description: self.description.clone(),
			due_date: self.due_date,
			tag: self.tag.clone(),
			status: self.status,
		}
	}

	/// Read-time overdue flag, never persisted
	pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
		crate::lifecycle::is_overdue(self.status, self.due_date, now)
	}
}

impl fmt::Display for TodoItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} - {}", self.title, self.status)
	}
}

/// Complete set of writable fields for a create or full update
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoFields {
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub due_date: Option<DateTime<Utc>>,
	#[serde(default)]
	pub tag: Option<String>,
	#[serde(default)]
	pub status: TodoStatus,
}

impl TodoFields {
	/// Fields with the given title and description and every optional field unset
	pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: description.into(),
			..Default::default()
		}
	}

	pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
		self.due_date = Some(due_date);
		self
	}

	pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
		self.tag = Some(tag.into());
		self
	}

	pub fn with_status(mut self, status: TodoStatus) -> Self {
		self.status = status;
		self
	}
}

/// Partial update
///
/// `None` leaves a field untouched. For the nullable fields the inner
/// `Option` distinguishes "set to null" (`Some(None)`) from "not supplied".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoPatch {
	pub title: Option<String>,
	pub description: Option<String>,
	pub due_date: Option<Option<DateTime<Utc>>>,
	pub tag: Option<Option<String>>,
	pub status: Option<TodoStatus>,
}

impl TodoPatch {
	/// Patch that only changes the status
	pub fn status(status: TodoStatus) -> Self {
		Self {
			status: Some(status),
			..Default::default()
		}
	}

	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.description.is_none()
			&& self.due_date.is_none()
			&& self.tag.is_none()
			&& self.status.is_none()
	}

	/// Merge this patch onto an existing record
	pub fn apply_to(&self, item: &TodoItem) -> TodoFields {
		let mut fields = item.fields();
		if let Some(title) = &self.title {
			fields.title = title.clone();
		}
		if let Some(description) = &self.description {
			fields.description = description.clone();
		}
		if let Some(due_date) = self.due_date {
			fields.due_date = due_date;
		}
		if let Some(tag) = &self.tag {
			fields.tag = tag.clone();
		}
		if let Some(status) = self.status {
			fields.status = status;
		}
		fields
	}
}

impl From<TodoFields> for TodoPatch {
	fn from(fields: TodoFields) -> Self {
		Self {
			title: Some(fields.title),
			description: Some(fields.description),
			due_date: Some(fields.due_date),
			tag: Some(fields.tag),
			status: Some(fields.status),
		}
	}
}
