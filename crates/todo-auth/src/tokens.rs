//! API tokens
//!
//! One token per user. The key is 20 random bytes rendered as 40 lowercase
//! hex characters and sent by clients as `Authorization: Token <key>`.

use crate::schema::{TOKEN_KEY_LENGTH, TOKEN_TABLE};
use crate::users::{User, UserStore};
use chrono::{DateTime, Utc};
use rand::RngCore;
use sea_query::{Alias, Expr, ExprTrait, Query, SqliteQueryBuilder};
use sqlx::Row;
use todo_core::exception::{Error, Result};
use todo_db::{DatabaseConnection, db_error, format_timestamp, now, parse_timestamp};

/// A row of `authtoken_token`
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub key: String,
	pub user_id: i64,
	pub created: DateTime<Utc>,
}

/// Fresh random token key
pub fn generate_key() -> String {
	let mut bytes = [0u8; TOKEN_KEY_LENGTH / 2];
	rand::rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}

/// Reads and writes `authtoken_token`
#[derive(Clone)]
pub struct TokenStore {
	conn: DatabaseConnection,
	users: UserStore,
}

impl TokenStore {
	pub fn new(conn: DatabaseConnection) -> Self {
		let users = UserStore::new(conn.clone());
		Self { conn, users }
	}

	pub fn users(&self) -> &UserStore {
		&self.users
	}

	async fn for_user(&self, user_id: i64) -> Result<Option<Token>> {
		let stmt = Query::select()
			.columns([Alias::new("key"), Alias::new("user_id"), Alias::new("created")])
			.from(Alias::new(TOKEN_TABLE))
			.and_where(Expr::col(Alias::new("user_id")).eq(user_id))
			.to_owned();
		let row = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.fetch_optional(self.conn.pool())
			.await
			.map_err(|e| db_error("Failed to load token", e))?;

		row.map(|row| {
			let created: String = row.try_get("created").map_err(|e| db_error("created", e))?;
			Ok(Token {
				key: row.try_get("key").map_err(|e| db_error("key", e))?,
				user_id: row.try_get("user_id").map_err(|e| db_error("user_id", e))?,
				created: parse_timestamp("created", &created)?,
			})
		})
		.transpose()
	}

	/// The user's token, created on first request
	pub async fn get_or_create(&self, user: &User) -> Result<Token> {
		if let Some(token) = self.for_user(user.id).await? {
			return Ok(token);
		}

		let token = Token {
			key: generate_key(),
			user_id: user.id,
			created: now(),
		};
		let stmt = Query::insert()
			.into_table(Alias::new(TOKEN_TABLE))
			.columns([Alias::new("key"), Alias::new("user_id"), Alias::new("created")])
			.values(vec![
				Expr::val(token.key.clone()),
				Expr::val(token.user_id),
				Expr::val(format_timestamp(&token.created)),
			])
			.map_err(|e| Error::Database(e.to_string()))?
			.to_owned();
		self.conn.execute(&stmt.to_string(SqliteQueryBuilder)).await?;

		tracing::info!(username = %user.username, "Issued API token");
		Ok(token)
	}

	/// Drop the user's token and issue a new one
	pub async fn regenerate(&self, user: &User) -> Result<Token> {
		let stmt = Query::delete()
			.from_table(Alias::new(TOKEN_TABLE))
			.and_where(Expr::col(Alias::new("user_id")).eq(user.id))
			.to_owned();
		self.conn.execute(&stmt.to_string(SqliteQueryBuilder)).await?;
		self.get_or_create(user).await
	}

	/// Resolve a token key to its user
	///
	/// Returns `None` for unknown keys.
	pub async fn lookup(&self, key: &str) -> Result<Option<User>> {
		if key.len() != TOKEN_KEY_LENGTH {
			return Ok(None);
		}
		let stmt = Query::select()
			.column(Alias::new("user_id"))
			.from(Alias::new(TOKEN_TABLE))
			.and_where(Expr::col(Alias::new("key")).eq(key))
			.to_owned();
		let row = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.fetch_optional(self.conn.pool())
			.await
			.map_err(|e| db_error("Failed to look up token", e))?;

		match row {
			Some(row) => {
				let user_id: i64 = row.try_get("user_id").map_err(|e| db_error("user_id", e))?;
				self.users.get(user_id).await
			}
			None => Ok(None),
		}
	}
}
