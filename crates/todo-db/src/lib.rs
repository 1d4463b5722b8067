//! Persistence for todo-web
//!
//! - [`connection`]: the SQLite connection pool
//! - [`migrations`]: named, ordered schema migrations and their recorder
//! - [`schema`]: the `todo_app_todoitem` table
//! - [`store`]: [`TodoStore`], the only code that reads or writes todo rows
//!
//! Statements are built with sea-query's `SqliteQueryBuilder` and executed
//! through sqlx.

pub mod connection;
pub mod migrations;
pub mod schema;
pub mod store;

pub use connection::DatabaseConnection;
pub use migrations::{Migration, Migrator};
pub use store::{TodoFilter, TodoStore};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use todo_core::exception::Error;

/// Map an sqlx error into the shared taxonomy
pub fn db_error(context: &str, err: sqlx::Error) -> Error {
	Error::Database(format!("{}: {}", context, err))
}

/// Whether an sqlx error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
	err.as_database_error()
		.map(|e| e.is_unique_violation())
		.unwrap_or(false)
}

/// Current time at the precision timestamps are stored with
pub fn now() -> DateTime<Utc> {
	Utc::now().trunc_subsecs(6)
}

/// Stored text form of a timestamp
///
/// Fixed-width UTC with microseconds, so text order equals time order.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
///
/// let dt = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
/// assert_eq!(todo_db::format_timestamp(&dt), "2024-06-01T08:00:00.000000Z");
/// ```
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
	dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, Error> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| Error::Database(format!("Invalid timestamp in {}: {}", column, e)))
}
