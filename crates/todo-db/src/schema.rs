//! `todo_app_todoitem` table definition

use crate::migrations::Migration;
use sea_query::{Alias, ColumnDef, Index, SqliteQueryBuilder, Table};
use todo_core::models::TODO_TABLE;
use todo_core::validation::{TAG_MAX_LENGTH, TITLE_MAX_LENGTH};

pub const APP_LABEL: &str = "todo_app";

/// Column names of the todo table
pub mod columns {
	pub const ID: &str = "id";
	pub const TITLE: &str = "title";
	pub const DESCRIPTION: &str = "description";
	pub const DUE_DATE: &str = "due_date";
	pub const TAG: &str = "tag";
	pub const STATUS: &str = "status";
	pub const CREATED_AT: &str = "created_at";
	pub const UPDATED_AT: &str = "updated_at";

	pub const ALL: [&str; 8] = [
		ID,
		TITLE,
		DESCRIPTION,
		DUE_DATE,
		TAG,
		STATUS,
		CREATED_AT,
		UPDATED_AT,
	];
}

fn create_todo_table() -> String {
	Table::create()
		.table(Alias::new(TODO_TABLE))
		.if_not_exists()
		.col(
			ColumnDef::new(Alias::new(columns::ID))
				.integer()
				.not_null()
				.auto_increment()
				.primary_key(),
		)
		.col(
			ColumnDef::new(Alias::new(columns::TITLE))
				.string_len(TITLE_MAX_LENGTH as u32)
				.not_null(),
		)
		.col(ColumnDef::new(Alias::new(columns::DESCRIPTION)).text().not_null())
		.col(ColumnDef::new(Alias::new(columns::DUE_DATE)).text().null())
		.col(
			ColumnDef::new(Alias::new(columns::TAG))
				.string_len(TAG_MAX_LENGTH as u32)
				.null()
				.unique_key(),
		)
		.col(
			ColumnDef::new(Alias::new(columns::STATUS))
				.string_len(20)
				.not_null()
				.default("OPEN"),
		)
		.col(ColumnDef::new(Alias::new(columns::CREATED_AT)).text().not_null())
		.col(ColumnDef::new(Alias::new(columns::UPDATED_AT)).text().not_null())
		.to_owned()
		.to_string(SqliteQueryBuilder)
}

fn create_index(name: &str, column: &str) -> String {
	Index::create()
		.if_not_exists()
		.name(name)
		.table(Alias::new(TODO_TABLE))
		.col(Alias::new(column))
		.to_owned()
		.to_string(SqliteQueryBuilder)
}

/// Migrations of the todo app
pub fn migrations() -> Vec<Migration> {
	vec![Migration::new(
		APP_LABEL,
		"0001_initial",
		vec![
			create_todo_table(),
			create_index("idx_todoitem_created_at", columns::CREATED_AT),
			create_index("idx_todoitem_status", columns::STATUS),
		],
	)]
}
