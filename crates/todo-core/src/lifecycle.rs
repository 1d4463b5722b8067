//! Status lifecycle
//!
//! A todo whose deadline has passed becomes `OVERDUE` unless it is already
//! completed or cancelled. The store applies [`effective_status`] on every
//! write; reads never recompute it, so a stored status can lag until the
//! next save. [`is_overdue`] is the same rule evaluated at read time for
//! display purposes.

use crate::models::TodoStatus;
use chrono::{DateTime, Utc};

/// Whether an item with this status and deadline counts as overdue at `now`
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use todo_core::lifecycle::is_overdue;
/// use todo_core::TodoStatus;
///
/// let now = Utc::now();
/// assert!(is_overdue(TodoStatus::Open, Some(now - Duration::days(1)), now));
/// assert!(!is_overdue(TodoStatus::Completed, Some(now - Duration::days(1)), now));
/// assert!(!is_overdue(TodoStatus::Open, None, now));
/// ```
pub fn is_overdue(status: TodoStatus, due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
	match due_date {
		Some(due) => due < now && !status.is_terminal(),
		None => false,
	}
}

/// Status to persist for a write happening at `now`
pub fn effective_status(
	status: TodoStatus,
	due_date: Option<DateTime<Utc>>,
	now: DateTime<Utc>,
) -> TodoStatus {
	if is_overdue(status, due_date, now) {
		TodoStatus::Overdue
	} else {
		status
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};
	use rstest::rstest;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
	}

	#[rstest]
	#[case(TodoStatus::Open, TodoStatus::Overdue)]
	#[case(TodoStatus::Working, TodoStatus::Overdue)]
	#[case(TodoStatus::PendingReview, TodoStatus::Overdue)]
	#[case(TodoStatus::Overdue, TodoStatus::Overdue)]
	#[case(TodoStatus::Completed, TodoStatus::Completed)]
	#[case(TodoStatus::Cancelled, TodoStatus::Cancelled)]
	fn test_past_due_date(#[case] status: TodoStatus, #[case] expected: TodoStatus) {
		let due = Some(now() - Duration::days(1));
		assert_eq!(effective_status(status, due, now()), expected);
	}

	#[rstest]
	#[case(TodoStatus::Open)]
	#[case(TodoStatus::Working)]
	#[case(TodoStatus::Overdue)]
	fn test_future_due_date_keeps_status(#[case] status: TodoStatus) {
		let due = Some(now() + Duration::days(1));
		assert_eq!(effective_status(status, due, now()), status);
		assert_eq!(effective_status(status, None, now()), status);
	}

	#[rstest]
	fn test_due_date_equal_to_now_is_not_overdue() {
		assert!(!is_overdue(TodoStatus::Open, Some(now()), now()));
		assert!(is_overdue(
			TodoStatus::Open,
			Some(now() - Duration::microseconds(1)),
			now()
		));
	}
}
