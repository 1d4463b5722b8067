//! Changelist filters
//!
//! The sidebar filters of the todo changelist: exact status, and preset
//! ranges over `due_date` and `created_at` in the style of Django's
//! `DateFieldListFilter`. Presets follow the calendar of the configured time
//! zone and resolve to half-open `[gte, lt)` UTC ranges relative to the
//! request time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use todo_core::models::TodoStatus;

/// A single filter option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterSpec {
	/// Query parameter that selects this option
	pub param: String,
	pub value: String,
	/// Display text for the filter option
	pub display: String,
}

impl FilterSpec {
	pub fn new(
		param: impl Into<String>,
		value: impl Into<String>,
		display: impl Into<String>,
	) -> Self {
		Self {
			param: param.into(),
			value: value.into(),
			display: display.into(),
		}
	}

	pub fn to_query_param(&self) -> String {
		format!("{}={}", self.param, self.value)
	}
}

/// Filter metadata sent with every changelist response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterInfo {
	pub field: String,
	pub title: String,
	pub choices: Vec<FilterSpec>,
}

/// Trait for list filters
pub trait ListFilter: Send + Sync {
	fn field_name(&self) -> &str;

	fn title(&self) -> &str;

	fn choices(&self) -> Vec<FilterSpec>;

	fn info(&self) -> FilterInfo {
		FilterInfo {
			field: self.field_name().to_string(),
			title: self.title().to_string(),
			choices: self.choices(),
		}
	}
}

/// Exact match on `status`
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusFilter;

impl ListFilter for StatusFilter {
	fn field_name(&self) -> &str {
		"status"
	}

	fn title(&self) -> &str {
		"status"
	}

	fn choices(&self) -> Vec<FilterSpec> {
		TodoStatus::ALL
			.iter()
			.map(|s| FilterSpec::new("status", s.as_str(), s.label()))
			.collect()
	}
}

/// Preset ranges over a date column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangePreset {
	Today,
	Past7Days,
	ThisMonth,
	ThisYear,
}

impl DateRangePreset {
	pub const ALL: [DateRangePreset; 4] = [
		DateRangePreset::Today,
		DateRangePreset::Past7Days,
		DateRangePreset::ThisMonth,
		DateRangePreset::ThisYear,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			DateRangePreset::Today => "today",
			DateRangePreset::Past7Days => "past_7_days",
			DateRangePreset::ThisMonth => "this_month",
			DateRangePreset::ThisYear => "this_year",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			DateRangePreset::Today => "Today",
			DateRangePreset::Past7Days => "Past 7 days",
			DateRangePreset::ThisMonth => "This month",
			DateRangePreset::ThisYear => "This year",
		}
	}

	/// `[gte, lt)` bounds of the range containing `now`, with days starting
	/// at local midnight in `tz`
	///
	/// # Examples
	///
	/// ```
	/// use chrono::{TimeZone, Utc};
	/// use chrono_tz::Tz;
	/// use todo_admin::filters::DateRangePreset;
	///
	/// let now = Utc.with_ymd_and_hms(2024, 6, 15, 13, 30, 0).unwrap();
	/// let (gte, lt) = DateRangePreset::ThisMonth.bounds(now, Tz::UTC);
	///
	/// assert_eq!(gte, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
	/// assert_eq!(lt, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
	/// ```
	pub fn bounds(&self, now: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
		let today = now.with_timezone(&tz).date_naive();
		let tomorrow = today + Duration::days(1);
		let (gte, lt) = match self {
			DateRangePreset::Today => (today, tomorrow),
			DateRangePreset::Past7Days => (today - Duration::days(7), tomorrow),
			DateRangePreset::ThisMonth => {
				let first = today.with_day(1).unwrap_or(today);
				let next = if first.month() == 12 {
					NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
				} else {
					NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
				};
				(first, next.unwrap_or(tomorrow))
			}
			DateRangePreset::ThisYear => {
				let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
				let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(tomorrow);
				(first, next)
			}
		};
		(midnight(gte, tz), midnight(lt, tz))
	}
}

// A DST gap can skip local midnight; the day then starts at the first
// instant after the gap.
fn midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
	let naive = date.and_time(NaiveTime::MIN);
	tz.from_local_datetime(&naive)
		.earliest()
		.or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
		.map(|local| local.with_timezone(&Utc))
		.unwrap_or_else(|| naive.and_utc())
}

impl FromStr for DateRangePreset {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		DateRangePreset::ALL
			.into_iter()
			.find(|p| p.as_str() == s)
			.ok_or_else(|| format!("\"{}\" is not a valid date range", s))
	}
}

/// Preset filter over a date column
#[derive(Debug, Clone)]
pub struct DateFieldListFilter {
	field: String,
	title: String,
}

impl DateFieldListFilter {
	pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			title: title.into(),
		}
	}
}

impl ListFilter for DateFieldListFilter {
	fn field_name(&self) -> &str {
		&self.field
	}

	fn title(&self) -> &str {
		&self.title
	}

	fn choices(&self) -> Vec<FilterSpec> {
		DateRangePreset::ALL
			.iter()
			.map(|p| FilterSpec::new(&self.field, p.as_str(), p.label()))
			.collect()
	}
}
