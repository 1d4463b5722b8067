//! Todo item store
//!
//! Every write goes through the same pipeline: field validation, tag
//! uniqueness check, the overdue lifecycle rule, timestamps, commit. Reads
//! return rows exactly as stored.

use crate::schema::columns;
use crate::{DatabaseConnection, db_error, format_timestamp, is_unique_violation, now, parse_timestamp};
use chrono::{DateTime, SubsecRound, Utc};
use sea_query::{
	Alias, Asterisk, Cond, Expr, ExprTrait, Func, LikeExpr, Order, Query, SelectStatement,
	SqliteQueryBuilder,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use todo_core::exception::{Error, Result};
use todo_core::lifecycle::effective_status;
use todo_core::models::{TODO_TABLE, TodoFields, TodoItem, TodoPatch, TodoStatus};
use todo_core::validation::{normalize_tag, validate_fields};

/// Row selection for [`TodoStore::list`] and [`TodoStore::count`]
///
/// Date bounds are half-open: `>= gte` and `< lt`.
///
/// # Examples
///
/// ```
/// use todo_core::TodoStatus;
/// use todo_db::TodoFilter;
///
/// let filter = TodoFilter::new()
///     .status(TodoStatus::Open)
///     .search("milk")
///     .limit(20);
/// assert_eq!(filter.status, Some(TodoStatus::Open));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFilter {
	pub status: Option<TodoStatus>,
	pub ids: Option<Vec<i64>>,
	pub due_date_gte: Option<DateTime<Utc>>,
	pub due_date_lt: Option<DateTime<Utc>>,
	pub created_at_gte: Option<DateTime<Utc>>,
	pub created_at_lt: Option<DateTime<Utc>>,
	/// Case-insensitive substring over title, description and tag
	pub search: Option<String>,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
}

impl TodoFilter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn status(mut self, status: TodoStatus) -> Self {
		self.status = Some(status);
		self
	}

	pub fn ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
		self.ids = Some(ids.into_iter().collect());
		self
	}

	pub fn due_between(
		mut self,
		gte: Option<DateTime<Utc>>,
		lt: Option<DateTime<Utc>>,
	) -> Self {
		self.due_date_gte = gte;
		self.due_date_lt = lt;
		self
	}

	pub fn created_between(
		mut self,
		gte: Option<DateTime<Utc>>,
		lt: Option<DateTime<Utc>>,
	) -> Self {
		self.created_at_gte = gte;
		self.created_at_lt = lt;
		self
	}

	pub fn search(mut self, term: impl Into<String>) -> Self {
		self.search = Some(term.into());
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	fn apply(&self, select: &mut SelectStatement) {
		let mut conditions: Vec<Expr> = Vec::new();

		if let Some(status) = self.status {
			conditions.push(Expr::col(Alias::new(columns::STATUS)).eq(status.as_str()));
		}
		if let Some(ids) = &self.ids {
			if ids.is_empty() {
				conditions.push(Expr::cust("1 = 0"));
			} else {
				conditions.push(Expr::col(Alias::new(columns::ID)).is_in(ids.iter().copied()));
			}
		}
		let bounds = [
			(columns::DUE_DATE, self.due_date_gte, self.due_date_lt),
			(columns::CREATED_AT, self.created_at_gte, self.created_at_lt),
		];
		for (column, gte, lt) in bounds {
			if let Some(gte) = gte {
				conditions.push(Expr::col(Alias::new(column)).gte(format_timestamp(&gte)));
			}
			if let Some(lt) = lt {
				conditions.push(Expr::col(Alias::new(column)).lt(format_timestamp(&lt)));
			}
		}

		let search = self
			.search
			.as_deref()
			.map(str::trim)
			.filter(|term| !term.is_empty());
		if conditions.is_empty() && search.is_none() {
			return;
		}

		let mut all = Cond::all();
		for condition in conditions {
			all = all.add(condition);
		}
		if let Some(term) = search {
			let pattern = format!("%{}%", escape_like(term));
			let mut any = Cond::any();
			for column in [columns::TITLE, columns::DESCRIPTION, columns::TAG] {
				any = any.add(
					Expr::col(Alias::new(column)).like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
				);
			}
			all = all.add(any);
		}
		select.cond_where(all);
	}
}

const LIKE_ESCAPE: char = '!';

fn escape_like(term: &str) -> String {
	let mut escaped = String::with_capacity(term.len());
	for c in term.chars() {
		if matches!(c, '%' | '_' | LIKE_ESCAPE) {
			escaped.push(LIKE_ESCAPE);
		}
		escaped.push(c);
	}
	escaped
}

fn row_to_item(row: &SqliteRow) -> Result<TodoItem> {
	let get_str = |column: &str| -> Result<String> {
		row.try_get::<String, _>(column)
			.map_err(|e| db_error(column, e))
	};
	let get_opt = |column: &str| -> Result<Option<String>> {
		row.try_get::<Option<String>, _>(column)
			.map_err(|e| db_error(column, e))
	};

	let status_text = get_str(columns::STATUS)?;
	let status = status_text
		.parse::<TodoStatus>()
		.map_err(|e| Error::Database(format!("Invalid status in row: {}", e)))?;
	let due_date = get_opt(columns::DUE_DATE)?
		.map(|value| parse_timestamp(columns::DUE_DATE, &value))
		.transpose()?;

	Ok(TodoItem {
		id: row
			.try_get::<i64, _>(columns::ID)
			.map_err(|e| db_error(columns::ID, e))?,
		title: get_str(columns::TITLE)?,
		description: get_str(columns::DESCRIPTION)?,
		due_date,
		tag: get_opt(columns::TAG)?,
		status,
		created_at: parse_timestamp(columns::CREATED_AT, &get_str(columns::CREATED_AT)?)?,
		updated_at: parse_timestamp(columns::UPDATED_AT, &get_str(columns::UPDATED_AT)?)?,
	})
}

fn map_write_error(context: &str, tag: Option<&str>, err: sqlx::Error) -> Error {
	if is_unique_violation(&err) {
		Error::tag_conflict(tag.unwrap_or_default())
	} else {
		db_error(context, err)
	}
}

/// Reads and writes todo items
#[derive(Debug, Clone)]
pub struct TodoStore {
	conn: DatabaseConnection,
}

impl TodoStore {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self { conn }
	}

	pub fn connection(&self) -> &DatabaseConnection {
		&self.conn
	}

	fn select() -> SelectStatement {
		Query::select()
			.columns(columns::ALL.map(Alias::new))
			.from(Alias::new(TODO_TABLE))
			.to_owned()
	}

	async fn fetch_all(&self, stmt: &SelectStatement) -> Result<Vec<TodoItem>> {
		let sql = stmt.to_string(SqliteQueryBuilder);
		tracing::debug!(sql = %sql, "select");
		let rows = sqlx::query(&sql)
			.fetch_all(self.conn.pool())
			.await
			.map_err(|e| db_error("Failed to load todo items", e))?;
		rows.iter().map(row_to_item).collect()
	}

	/// Validate, normalise and check tag uniqueness for a candidate record
	async fn clean(&self, mut fields: TodoFields, exclude_id: Option<i64>) -> Result<TodoFields> {
		fields.tag = normalize_tag(fields.tag);
		fields.due_date = fields.due_date.map(|d| d.trunc_subsecs(6));
		validate_fields(&fields)?;

		if let Some(tag) = fields.tag.as_deref()
			&& self.tag_taken(tag, exclude_id).await?
		{
			return Err(Error::tag_conflict(tag));
		}
		Ok(fields)
	}

	/// Whether another record already uses `tag`
	pub async fn tag_taken(&self, tag: &str, exclude_id: Option<i64>) -> Result<bool> {
		let mut stmt = Query::select()
			.column(Alias::new(columns::ID))
			.from(Alias::new(TODO_TABLE))
			.and_where(Expr::col(Alias::new(columns::TAG)).eq(tag))
			.limit(1)
			.to_owned();
		if let Some(id) = exclude_id {
			stmt.and_where(Expr::col(Alias::new(columns::ID)).ne(id));
		}
		let sql = stmt.to_string(SqliteQueryBuilder);

		let row = sqlx::query(&sql)
			.fetch_optional(self.conn.pool())
			.await
			.map_err(|e| db_error("Failed to check tag", e))?;
		Ok(row.is_some())
	}

	/// Insert a new record
	///
	/// The lifecycle rule runs before the insert, so a past deadline stores
	/// `OVERDUE` straight away.
	pub async fn create(&self, fields: TodoFields) -> Result<TodoItem> {
		let fields = self.clean(fields, None).await?;
		let now = now();
		let status = effective_status(fields.status, fields.due_date, now);
		let timestamp = format_timestamp(&now);

		let stmt = Query::insert()
			.into_table(Alias::new(TODO_TABLE))
			.columns([
				Alias::new(columns::TITLE),
				Alias::new(columns::DESCRIPTION),
				Alias::new(columns::DUE_DATE),
				Alias::new(columns::TAG),
				Alias::new(columns::STATUS),
				Alias::new(columns::CREATED_AT),
				Alias::new(columns::UPDATED_AT),
			])
			.values(vec![
				Expr::val(fields.title.clone()),
				Expr::val(fields.description.clone()),
				Expr::val(fields.due_date.as_ref().map(format_timestamp)),
				Expr::val(fields.tag.clone()),
				Expr::val(status.as_str()),
				Expr::val(timestamp.clone()),
				Expr::val(timestamp),
			])
			.map_err(|e| Error::Database(e.to_string()))?
			.to_owned();
		let sql = stmt.to_string(SqliteQueryBuilder);

		let result = sqlx::query(&sql)
			.execute(self.conn.pool())
			.await
			.map_err(|e| map_write_error("Failed to create todo item", fields.tag.as_deref(), e))?;
		let id = result.last_insert_rowid();

		tracing::info!(id, status = %status, "Created todo item");

		Ok(TodoItem {
			id,
			title: fields.title,
			description: fields.description,
			due_date: fields.due_date,
			tag: fields.tag,
			status,
			created_at: now,
			updated_at: now,
		})
	}

	pub async fn get(&self, id: i64) -> Result<TodoItem> {
		let stmt = Self::select()
			.and_where(Expr::col(Alias::new(columns::ID)).eq(id))
			.to_owned();
		self.fetch_all(&stmt)
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| Error::todo_not_found(id))
	}

	/// Records matching `filter`, newest first
	pub async fn list(&self, filter: &TodoFilter) -> Result<Vec<TodoItem>> {
		let mut stmt = Self::select();
		filter.apply(&mut stmt);
		stmt.order_by(Alias::new(columns::CREATED_AT), Order::Desc)
			.order_by(Alias::new(columns::ID), Order::Desc);
		if let Some(limit) = filter.limit {
			stmt.limit(limit);
		}
		if let Some(offset) = filter.offset {
			if filter.limit.is_none() {
				// SQLite needs a LIMIT before OFFSET
				stmt.limit(i64::MAX as u64);
			}
			stmt.offset(offset);
		}
		self.fetch_all(&stmt).await
	}

	/// Number of records matching `filter`, ignoring limit and offset
	pub async fn count(&self, filter: &TodoFilter) -> Result<u64> {
		let mut stmt = Query::select()
			.expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
			.from(Alias::new(TODO_TABLE))
			.to_owned();
		filter.apply(&mut stmt);
		let sql = stmt.to_string(SqliteQueryBuilder);

		let row = sqlx::query(&sql)
			.fetch_one(self.conn.pool())
			.await
			.map_err(|e| db_error("Failed to count todo items", e))?;
		let count: i64 = row.try_get("count").map_err(|e| db_error("count", e))?;
		Ok(Ord::max(count, 0) as u64)
	}

	/// Records whose stored status is `OVERDUE`
	///
	/// No read-time recomputation: an item past its deadline that has not
	/// been saved since is not included.
	pub async fn overdue(&self) -> Result<Vec<TodoItem>> {
		self.list(&TodoFilter::new().status(TodoStatus::Overdue)).await
	}

	/// Apply a full or partial update
	///
	/// The patch is merged onto the stored record and the merged record goes
	/// through the same validation and lifecycle rule as a create.
	pub async fn update(&self, id: i64, patch: TodoPatch) -> Result<TodoItem> {
		let existing = self.get(id).await?;
		let fields = self.clean(patch.apply_to(&existing), Some(id)).await?;
		let now = now();
		let status = effective_status(fields.status, fields.due_date, now);

		let stmt = Query::update()
			.table(Alias::new(TODO_TABLE))
			.value(Alias::new(columns::TITLE), fields.title.clone())
			.value(Alias::new(columns::DESCRIPTION), fields.description.clone())
			.value(
				Alias::new(columns::DUE_DATE),
				fields.due_date.as_ref().map(format_timestamp),
			)
			.value(Alias::new(columns::TAG), fields.tag.clone())
			.value(Alias::new(columns::STATUS), status.as_str())
			.value(Alias::new(columns::UPDATED_AT), format_timestamp(&now))
			.and_where(Expr::col(Alias::new(columns::ID)).eq(id))
			.to_owned();
		let sql = stmt.to_string(SqliteQueryBuilder);

		let result = sqlx::query(&sql)
			.execute(self.conn.pool())
			.await
			.map_err(|e| map_write_error("Failed to update todo item", fields.tag.as_deref(), e))?;
		if result.rows_affected() == 0 {
			return Err(Error::todo_not_found(id));
		}

		if existing.status != status {
			tracing::info!(id, from = %existing.status, to = %status, "Todo status changed");
		}

		Ok(TodoItem {
			id,
			title: fields.title,
			description: fields.description,
			due_date: fields.due_date,
			tag: fields.tag,
			status,
			created_at: existing.created_at,
			updated_at: now,
		})
	}

	/// Hard delete
	pub async fn delete(&self, id: i64) -> Result<()> {
		let stmt = Query::delete()
			.from_table(Alias::new(TODO_TABLE))
			.and_where(Expr::col(Alias::new(columns::ID)).eq(id))
			.to_owned();
		let affected = self.conn.execute(&stmt.to_string(SqliteQueryBuilder)).await?;
		if affected == 0 {
			return Err(Error::todo_not_found(id));
		}
		tracing::info!(id, "Deleted todo item");
		Ok(())
	}

	/// Overwrite the status of every listed record
	///
	/// A direct bulk write: validation and the lifecycle rule are skipped,
	/// only `updated_at` is refreshed. Unknown ids are ignored.
	pub async fn bulk_update_status(&self, ids: &[i64], status: TodoStatus) -> Result<u64> {
		if ids.is_empty() {
			return Ok(0);
		}
		let stmt = Query::update()
			.table(Alias::new(TODO_TABLE))
			.value(Alias::new(columns::STATUS), status.as_str())
			.value(Alias::new(columns::UPDATED_AT), format_timestamp(&now()))
			.and_where(Expr::col(Alias::new(columns::ID)).is_in(ids.iter().copied()))
			.to_owned();
		let affected = self.conn.execute(&stmt.to_string(SqliteQueryBuilder)).await?;
		tracing::info!(affected, status = %status, "Bulk status update");
		Ok(affected)
	}
}
