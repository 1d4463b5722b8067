//! Changelist bulk actions

use serde::Serialize;
use std::str::FromStr;
use todo_core::exception::{Error, Result};
use todo_core::models::TodoStatus;
use todo_db::TodoStore;

/// The bulk actions offered on the todo changelist
///
/// Both overwrite the status of the selected rows directly: the overdue rule
/// is not applied and the rows are not re-validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
	MarkCompleted,
	MarkCancelled,
}

/// Action metadata sent with the changelist
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionInfo {
	pub name: &'static str,
	pub description: &'static str,
}

impl AdminAction {
	pub const ALL: [AdminAction; 2] = [AdminAction::MarkCompleted, AdminAction::MarkCancelled];

	pub fn name(&self) -> &'static str {
		match self {
			AdminAction::MarkCompleted => "mark_completed",
			AdminAction::MarkCancelled => "mark_cancelled",
		}
	}

	pub fn description(&self) -> &'static str {
		match self {
			AdminAction::MarkCompleted => "Mark selected tasks as completed",
			AdminAction::MarkCancelled => "Cancel selected tasks",
		}
	}

	pub fn target_status(&self) -> TodoStatus {
		match self {
			AdminAction::MarkCompleted => TodoStatus::Completed,
			AdminAction::MarkCancelled => TodoStatus::Cancelled,
		}
	}

	pub fn info(&self) -> ActionInfo {
		ActionInfo {
			name: self.name(),
			description: self.description(),
		}
	}

	/// Apply to the selected ids, returning the number of rows changed
	pub async fn run(&self, store: &TodoStore, ids: &[i64]) -> Result<u64> {
		if ids.is_empty() {
			return Err(Error::Validation(
				todo_core::ValidationErrors::single(
					"ids",
					"no_selection",
					"Items must be selected in order to perform actions on them.",
				),
			));
		}
		let updated = store.bulk_update_status(ids, self.target_status()).await?;
		tracing::info!(action = self.name(), selected = ids.len(), updated, "Admin action applied");
		Ok(updated)
	}
}

impl FromStr for AdminAction {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		AdminAction::ALL
			.into_iter()
			.find(|a| a.name() == s)
			.ok_or_else(|| Error::InvalidAction(format!("Unknown action \"{}\"", s)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, Utc};
	use rstest::rstest;
	use todo_core::TodoFields;
	use todo_db::{DatabaseConnection, Migrator};

	async fn store() -> TodoStore {
		let conn = DatabaseConnection::memory().await.unwrap();
		Migrator::new()
			.with_migrations(todo_db::schema::migrations())
			.migrate(&conn)
			.await
			.unwrap();
		TodoStore::new(conn)
	}

	#[rstest]
	#[case("mark_completed", AdminAction::MarkCompleted)]
	#[case("mark_cancelled", AdminAction::MarkCancelled)]
	fn test_parse(#[case] name: &str, #[case] expected: AdminAction) {
		assert_eq!(name.parse::<AdminAction>().unwrap(), expected);
	}

	#[rstest]
	fn test_unknown_action() {
		let err = "delete_selected".parse::<AdminAction>().unwrap_err();
		assert_eq!(err.code(), "invalid_action");
	}

	#[rstest]
	#[tokio::test]
	async fn test_mark_completed_skips_overdue_rule() {
		let store = store().await;
		let late = store
			.create(TodoFields::new("late", "d").with_due_date(Utc::now() - Duration::days(3)))
			.await
			.unwrap();
		let other = store.create(TodoFields::new("other", "d")).await.unwrap();

		let updated = AdminAction::MarkCompleted
			.run(&store, &[late.id])
			.await
			.unwrap();

		assert_eq!(updated, 1);
		assert_eq!(store.get(late.id).await.unwrap().status, TodoStatus::Completed);
		assert_eq!(store.get(other.id).await.unwrap().status, TodoStatus::Open);
	}

	#[rstest]
	#[tokio::test]
	async fn test_mark_cancelled_keeps_past_due_date() {
		let store = store().await;
		let item = store
			.create(TodoFields::new("t", "d").with_due_date(Utc::now() - Duration::days(1)))
			.await
			.unwrap();

		AdminAction::MarkCancelled.run(&store, &[item.id]).await.unwrap();
		let reloaded = store.get(item.id).await.unwrap();

		assert_eq!(reloaded.status, TodoStatus::Cancelled);
		assert_eq!(reloaded.due_date, item.due_date);
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_selection() {
		let store = store().await;
		let err = AdminAction::MarkCompleted.run(&store, &[]).await.unwrap_err();
		assert_eq!(err.code(), "no_selection");
	}
}
