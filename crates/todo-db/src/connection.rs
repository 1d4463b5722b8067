//! SQLite connection pool

use crate::db_error;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use todo_core::exception::{Error, Result};

/// Shared handle to the database
///
/// Cloning is cheap; every clone uses the same pool.
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
	pool: SqlitePool,
	url: String,
}

impl DatabaseConnection {
	/// Connect to `url`, creating the database file if needed
	///
	/// An in-memory database lives only as long as its connection, so
	/// `sqlite::memory:` URLs get a pool of one connection that is never
	/// recycled.
	///
	/// # Examples
	///
	/// ```no_run
	/// use todo_db::DatabaseConnection;
	///
	/// # async fn example() -> todo_core::Result<()> {
	/// let conn = DatabaseConnection::connect("sqlite::memory:").await?;
	/// assert!(conn.is_memory());
	/// # Ok(())
	/// # }
	/// ```
	pub async fn connect(url: &str) -> Result<Self> {
		if !url.starts_with("sqlite:") {
			return Err(Error::ImproperlyConfigured(format!(
				"Unsupported database URL {}: only sqlite: URLs are supported",
				url
			)));
		}
		let options = SqliteConnectOptions::from_str(url)
			.map_err(|e| Error::ImproperlyConfigured(format!("Invalid database URL {}: {}", url, e)))?
			.create_if_missing(true)
			.foreign_keys(true);

		let pool_options = if Self::url_is_memory(url) {
			SqlitePoolOptions::new()
				.max_connections(1)
				.min_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
		} else {
			SqlitePoolOptions::new().max_connections(5)
		};

		let pool = pool_options
			.connect_with(options)
			.await
			.map_err(|e| db_error("Failed to connect", e))?;

		tracing::debug!(url = %url, "Database connection established");

		Ok(Self {
			pool,
			url: url.to_string(),
		})
	}

	/// Fresh private in-memory database
	pub async fn memory() -> Result<Self> {
		Self::connect("sqlite::memory:").await
	}

	fn url_is_memory(url: &str) -> bool {
		url.contains(":memory:") || url.contains("mode=memory")
	}

	pub fn is_memory(&self) -> bool {
		Self::url_is_memory(&self.url)
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// Run a raw statement, returning the number of affected rows
	pub async fn execute(&self, sql: &str) -> Result<u64> {
		tracing::debug!(sql = %sql, "execute");
		let result = sqlx::query(sql)
			.execute(&self.pool)
			.await
			.map_err(|e| db_error("Statement failed", e))?;
		Ok(result.rows_affected())
	}

	/// Round-trip check used by `manage check`
	pub async fn ping(&self) -> Result<()> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map_err(|e| db_error("Ping failed", e))?;
		Ok(())
	}

	pub async fn close(&self) {
		self.pool.close().await;
	}
}
