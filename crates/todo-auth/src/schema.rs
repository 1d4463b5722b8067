//! `auth_user` and `authtoken_token` tables

use sea_query::{Alias, ColumnDef, SqliteQueryBuilder, Table};
use todo_db::Migration;

pub const USER_TABLE: &str = "auth_user";
pub const TOKEN_TABLE: &str = "authtoken_token";

pub const USERNAME_MAX_LENGTH: usize = 150;

/// Length of a token key in hex characters
pub const TOKEN_KEY_LENGTH: usize = 40;

fn create_user_table() -> String {
	Table::create()
		.table(Alias::new(USER_TABLE))
		.if_not_exists()
		.col(
			ColumnDef::new(Alias::new("id"))
				.integer()
				.not_null()
				.auto_increment()
				.primary_key(),
		)
		.col(
			ColumnDef::new(Alias::new("username"))
				.string_len(USERNAME_MAX_LENGTH as u32)
				.not_null()
				.unique_key(),
		)
		.col(ColumnDef::new(Alias::new("password")).string_len(128).not_null())
		.col(
			ColumnDef::new(Alias::new("is_staff"))
				.boolean()
				.not_null()
				.default(false),
		)
		.col(
			ColumnDef::new(Alias::new("is_superuser"))
				.boolean()
				.not_null()
				.default(false),
		)
		.col(
			ColumnDef::new(Alias::new("is_active"))
				.boolean()
				.not_null()
				.default(true),
		)
		.col(ColumnDef::new(Alias::new("date_joined")).text().not_null())
		.to_owned()
		.to_string(SqliteQueryBuilder)
}

fn create_token_table() -> String {
	Table::create()
		.table(Alias::new(TOKEN_TABLE))
		.if_not_exists()
		.col(
			ColumnDef::new(Alias::new("key"))
				.string_len(TOKEN_KEY_LENGTH as u32)
				.not_null()
				.primary_key(),
		)
		.col(
			ColumnDef::new(Alias::new("user_id"))
				.integer()
				.not_null()
				.unique_key()
				.extra(format!("REFERENCES \"{}\" (\"id\") ON DELETE CASCADE", USER_TABLE)),
		)
		.col(ColumnDef::new(Alias::new("created")).text().not_null())
		.to_owned()
		.to_string(SqliteQueryBuilder)
}

/// Migrations of the `auth` and `authtoken` apps
pub fn migrations() -> Vec<Migration> {
	vec![
		Migration::new("auth", "0001_initial", vec![create_user_table()]),
		Migration::new("authtoken", "0001_initial", vec![create_token_table()]),
	]
}
