//! User accounts

use crate::hasher::{Argon2Hasher, PasswordHasher};
use crate::schema::{USER_TABLE, USERNAME_MAX_LENGTH};
use chrono::{DateTime, Utc};
use sea_query::{Alias, Expr, ExprTrait, Query, SelectStatement, SqliteQueryBuilder};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::sync::Arc;
use todo_core::exception::{Error, Result};
use todo_core::validators::{FieldError, ValidationErrors};
use todo_db::{DatabaseConnection, db_error, format_timestamp, is_unique_violation, now, parse_timestamp};
use todo_http::AuthState;

const COLUMNS: [&str; 7] = [
	"id",
	"username",
	"password",
	"is_staff",
	"is_superuser",
	"is_active",
	"date_joined",
];

/// A row of `auth_user`
#[derive(Debug, Clone, PartialEq)]
pub struct User {
	pub id: i64,
	pub username: String,
	/// PHC-format password hash
	pub password: String,
	pub is_staff: bool,
	pub is_superuser: bool,
	pub is_active: bool,
	pub date_joined: DateTime<Utc>,
}

impl User {
	/// Request identity for this user
	pub fn auth_state(&self) -> AuthState {
		let mut state =
			AuthState::authenticated(self.id, &self.username, self.is_staff, self.is_superuser);
		state.is_active = self.is_active;
		state
	}
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
	let date_joined: String = row
		.try_get("date_joined")
		.map_err(|e| db_error("date_joined", e))?;
	Ok(User {
		id: row.try_get("id").map_err(|e| db_error("id", e))?,
		username: row.try_get("username").map_err(|e| db_error("username", e))?,
		password: row.try_get("password").map_err(|e| db_error("password", e))?,
		is_staff: row.try_get("is_staff").map_err(|e| db_error("is_staff", e))?,
		is_superuser: row
			.try_get("is_superuser")
			.map_err(|e| db_error("is_superuser", e))?,
		is_active: row.try_get("is_active").map_err(|e| db_error("is_active", e))?,
		date_joined: parse_timestamp("date_joined", &date_joined)?,
	})
}

fn validate_credentials(username: &str, password: &str) -> Result<()> {
	let mut errors = ValidationErrors::new();
	let length = username.chars().count();
	if username.trim().is_empty() {
		errors.add(
			"username",
			FieldError::new("required", "This field may not be blank."),
		);
	} else if length > USERNAME_MAX_LENGTH {
		errors.add(
			"username",
			FieldError::new(
				"username_length",
				format!(
					"Ensure this field has no more than {} characters.",
					USERNAME_MAX_LENGTH
				),
			),
		);
	}
	if password.is_empty() {
		errors.add(
			"password",
			FieldError::new("required", "This field may not be blank."),
		);
	}
	errors.into_result().map_err(Error::from)
}

fn username_taken() -> Error {
	Error::Validation(ValidationErrors::single(
		"username",
		"unique",
		"A user with that username already exists.",
	))
}

/// Reads and writes `auth_user`
#[derive(Clone)]
pub struct UserStore {
	conn: DatabaseConnection,
	hasher: Arc<dyn PasswordHasher>,
}

impl UserStore {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self::with_hasher(conn, Arc::new(Argon2Hasher::new()))
	}

	pub fn with_hasher(conn: DatabaseConnection, hasher: Arc<dyn PasswordHasher>) -> Self {
		Self { conn, hasher }
	}

	fn select() -> SelectStatement {
		Query::select()
			.columns(COLUMNS.map(Alias::new))
			.from(Alias::new(USER_TABLE))
			.to_owned()
	}

	async fn fetch_one(&self, stmt: SelectStatement) -> Result<Option<User>> {
		let sql = stmt.to_string(SqliteQueryBuilder);
		let row = sqlx::query(&sql)
			.fetch_optional(self.conn.pool())
			.await
			.map_err(|e| db_error("Failed to load user", e))?;
		row.as_ref().map(row_to_user).transpose()
	}

	/// Create an ordinary, non-staff user
	pub async fn create_user(&self, username: &str, password: &str) -> Result<User> {
		self.insert(username, password, false, false).await
	}

	/// Create a user with staff and superuser rights
	pub async fn create_superuser(&self, username: &str, password: &str) -> Result<User> {
		self.insert(username, password, true, true).await
	}

	async fn insert(
		&self,
		username: &str,
		password: &str,
		is_staff: bool,
		is_superuser: bool,
	) -> Result<User> {
		validate_credentials(username, password)?;
		if self.get_by_username(username).await?.is_some() {
			return Err(username_taken());
		}

		let hash = self.hasher.hash(password)?;
		let date_joined = now();

		let stmt = Query::insert()
			.into_table(Alias::new(USER_TABLE))
			.columns(COLUMNS[1..].iter().copied().map(Alias::new))
			.values(vec![
				Expr::val(username),
				Expr::val(hash.clone()),
				Expr::val(is_staff),
				Expr::val(is_superuser),
				Expr::val(true),
				Expr::val(format_timestamp(&date_joined)),
			])
			.map_err(|e| Error::Database(e.to_string()))?
			.to_owned();

		let result = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.execute(self.conn.pool())
			.await
			.map_err(|e| {
				if is_unique_violation(&e) {
					username_taken()
				} else {
					db_error("Failed to create user", e)
				}
			})?;

		tracing::info!(username = %username, is_superuser, "Created user");

		Ok(User {
			id: result.last_insert_rowid(),
			username: username.to_string(),
			password: hash,
			is_staff,
			is_superuser,
			is_active: true,
			date_joined,
		})
	}

	pub async fn get(&self, id: i64) -> Result<Option<User>> {
		let stmt = Self::select()
			.and_where(Expr::col(Alias::new("id")).eq(id))
			.to_owned();
		self.fetch_one(stmt).await
	}

	pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
		let stmt = Self::select()
			.and_where(Expr::col(Alias::new("username")).eq(username))
			.to_owned();
		self.fetch_one(stmt).await
	}

	/// Check a username/password pair
	///
	/// Unknown users, wrong passwords and inactive accounts all yield `None`.
	pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
		let Some(user) = self.get_by_username(username).await? else {
			return Ok(None);
		};
		if !user.is_active || !self.hasher.verify(password, &user.password)? {
			return Ok(None);
		}
		Ok(Some(user))
	}

	/// Replace the stored password hash
	pub async fn set_password(&self, user_id: i64, password: &str) -> Result<()> {
		if password.is_empty() {
			return Err(ValidationErrors::single(
				"password",
				"required",
				"This field may not be blank.",
			)
			.into());
		}
		let hash = self.hasher.hash(password)?;
		let stmt = Query::update()
			.table(Alias::new(USER_TABLE))
			.value(Alias::new("password"), hash)
			.and_where(Expr::col(Alias::new("id")).eq(user_id))
			.to_owned();
		let result = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.execute(self.conn.pool())
			.await
			.map_err(|e| db_error("Failed to set password", e))?;
		if result.rows_affected() == 0 {
			return Err(Error::NotFound(format!("User {} does not exist", user_id)));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use todo_db::Migrator;

	#[fixture]
	async fn users() -> UserStore {
		let conn = DatabaseConnection::memory().await.unwrap();
		Migrator::new()
			.with_migrations(crate::schema::migrations())
			.migrate(&conn)
			.await
			.unwrap();
		UserStore::new(conn)
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_and_authenticate(#[future] users: UserStore) {
		let users = users.await;
		let created = users.create_user("alice", "wonderland").await.unwrap();

		let found = users.authenticate("alice", "wonderland").await.unwrap();

		assert_eq!(found.as_ref().map(|u| u.id), Some(created.id));
		assert!(!created.is_staff);
		assert_ne!(created.password, "wonderland");
	}

	#[rstest]
	#[case("alice", "wrong")]
	#[case("nobody", "wonderland")]
	#[tokio::test]
	async fn test_bad_credentials(
		#[future] users: UserStore,
		#[case] username: &str,
		#[case] password: &str,
	) {
		let users = users.await;
		users.create_user("alice", "wonderland").await.unwrap();

		assert!(users.authenticate(username, password).await.unwrap().is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_superuser_flags(#[future] users: UserStore) {
		let users = users.await;
		let admin = users.create_superuser("admin", "pw").await.unwrap();

		let state = admin.auth_state();

		assert!(state.is_authenticated);
		assert!(state.is_staff);
		assert!(state.is_superuser);
	}

	#[rstest]
	#[tokio::test]
	async fn test_duplicate_username(#[future] users: UserStore) {
		let users = users.await;
		users.create_user("alice", "a").await.unwrap();

		let err = users.create_user("alice", "b").await.unwrap_err();

		assert_eq!(err.code(), "unique");
	}

	#[rstest]
	#[tokio::test]
	async fn test_blank_username_rejected(#[future] users: UserStore) {
		let users = users.await;
		let err = users.create_user("  ", "pw").await.unwrap_err();
		assert_eq!(err.code(), "required");
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_password(#[future] users: UserStore) {
		let users = users.await;
		let user = users.create_user("alice", "old").await.unwrap();

		users.set_password(user.id, "new").await.unwrap();

		assert!(users.authenticate("alice", "old").await.unwrap().is_none());
		assert!(users.authenticate("alice", "new").await.unwrap().is_some());
	}
}
