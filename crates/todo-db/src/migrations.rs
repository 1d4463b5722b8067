//! Schema migrations
//!
//! A [`Migration`] is a named list of DDL statements belonging to an app.
//! The [`Migrator`] applies pending migrations in registration order, each in
//! its own transaction, and records them in the `todo_migrations` table so
//! they run only once.

use crate::{DatabaseConnection, db_error, format_timestamp, now};
use sea_query::{Alias, ColumnDef, Expr, Index, Query, SqliteQueryBuilder, Table};
use sqlx::Row;
use std::collections::HashSet;
use todo_core::exception::{Error, Result};

pub const MIGRATIONS_TABLE: &str = "todo_migrations";

/// One schema change
#[derive(Debug, Clone)]
pub struct Migration {
	pub app: &'static str,
	pub name: &'static str,
	pub statements: Vec<String>,
}

impl Migration {
	pub fn new(app: &'static str, name: &'static str, statements: Vec<String>) -> Self {
		Self {
			app,
			name,
			statements,
		}
	}

	/// `app.name`, as printed by `manage migrate`
	pub fn label(&self) -> String {
		format!("{}.{}", self.app, self.name)
	}
}

/// Applies migrations in order
#[derive(Debug, Default, Clone)]
pub struct Migrator {
	migrations: Vec<Migration>,
}

impl Migrator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
		self.migrations.extend(migrations);
		self
	}

	pub fn migrations(&self) -> &[Migration] {
		&self.migrations
	}

	async fn ensure_recorder(&self, conn: &DatabaseConnection) -> Result<()> {
		let stmt = Table::create()
			.table(Alias::new(MIGRATIONS_TABLE))
			.if_not_exists()
			.col(
				ColumnDef::new(Alias::new("id"))
					.integer()
					.not_null()
					.auto_increment()
					.primary_key(),
			)
			.col(ColumnDef::new(Alias::new("app")).string_len(255).not_null())
			.col(ColumnDef::new(Alias::new("name")).string_len(255).not_null())
			.col(ColumnDef::new(Alias::new("applied")).text().not_null())
			.to_owned();
		conn.execute(&stmt.to_string(SqliteQueryBuilder)).await?;

		let idx = Index::create()
			.if_not_exists()
			.name("idx_todo_migrations_app_name")
			.table(Alias::new(MIGRATIONS_TABLE))
			.col(Alias::new("app"))
			.col(Alias::new("name"))
			.unique()
			.to_owned();
		conn.execute(&idx.to_string(SqliteQueryBuilder)).await?;
		Ok(())
	}

	/// Labels of the migrations already recorded
	pub async fn applied(&self, conn: &DatabaseConnection) -> Result<HashSet<String>> {
		self.ensure_recorder(conn).await?;

		let stmt = Query::select()
			.columns([Alias::new("app"), Alias::new("name")])
			.from(Alias::new(MIGRATIONS_TABLE))
			.to_owned();
		let sql = stmt.to_string(SqliteQueryBuilder);

		let rows = sqlx::query(&sql)
			.fetch_all(conn.pool())
			.await
			.map_err(|e| db_error("Failed to read applied migrations", e))?;

		rows.iter()
			.map(|row| {
				let app: String = row.try_get("app").map_err(|e| db_error("app", e))?;
				let name: String = row.try_get("name").map_err(|e| db_error("name", e))?;
				Ok(format!("{}.{}", app, name))
			})
			.collect()
	}

	/// Migrations not yet applied, in order
	pub async fn plan(&self, conn: &DatabaseConnection) -> Result<Vec<&Migration>> {
		let applied = self.applied(conn).await?;
		Ok(self
			.migrations
			.iter()
			.filter(|m| !applied.contains(&m.label()))
			.collect())
	}

	/// Apply every pending migration, returning the labels applied
	pub async fn migrate(&self, conn: &DatabaseConnection) -> Result<Vec<String>> {
		let pending = self.plan(conn).await?;
		let mut applied = Vec::with_capacity(pending.len());

		for migration in pending {
			let mut tx = conn
				.pool()
				.begin()
				.await
				.map_err(|e| db_error("Failed to begin migration", e))?;

			for sql in &migration.statements {
				tracing::debug!(migration = %migration.label(), sql = %sql, "Applying statement");
				sqlx::query(sql).execute(&mut *tx).await.map_err(|e| {
					Error::Database(format!("Migration {} failed: {}", migration.label(), e))
				})?;
			}

			let record = Query::insert()
				.into_table(Alias::new(MIGRATIONS_TABLE))
				.columns([Alias::new("app"), Alias::new("name"), Alias::new("applied")])
				.values(vec![
					Expr::val(migration.app),
					Expr::val(migration.name),
					Expr::val(format_timestamp(&now())),
				])
				.map_err(|e| Error::Database(e.to_string()))?
				.to_owned();
			sqlx::query(&record.to_string(SqliteQueryBuilder))
				.execute(&mut *tx)
				.await
				.map_err(|e| db_error("Failed to record migration", e))?;

			tx.commit()
				.await
				.map_err(|e| db_error("Failed to commit migration", e))?;

			tracing::info!(migration = %migration.label(), "Applied migration");
			applied.push(migration.label());
		}

		Ok(applied)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn sample() -> Migrator {
		Migrator::new().with_migrations([
			Migration::new(
				"demo",
				"0001_initial",
				vec!["CREATE TABLE demo (id integer PRIMARY KEY)".to_string()],
			),
			Migration::new(
				"demo",
				"0002_add_name",
				vec!["ALTER TABLE demo ADD COLUMN name text".to_string()],
			),
		])
	}

	#[rstest]
	#[tokio::test]
	async fn test_migrate_applies_once() {
		let conn = DatabaseConnection::memory().await.unwrap();
		let migrator = sample();

		let first = migrator.migrate(&conn).await.unwrap();
		let second = migrator.migrate(&conn).await.unwrap();

		assert_eq!(first, vec!["demo.0001_initial", "demo.0002_add_name"]);
		assert!(second.is_empty());
		assert!(migrator.plan(&conn).await.unwrap().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_migration_is_not_recorded() {
		let conn = DatabaseConnection::memory().await.unwrap();
		let migrator = Migrator::new().with_migrations([Migration::new(
			"demo",
			"0001_broken",
			vec!["CREATE TABLE (".to_string()],
		)]);

		assert!(migrator.migrate(&conn).await.is_err());
		assert_eq!(migrator.plan(&conn).await.unwrap().len(), 1);
	}
}
