//! Configuration sources for the layered settings system
//!
//! Sources are merged in priority order, higher priorities overriding lower
//! ones key by key: environment variables > TOML files > defaults.

use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid source: {0}")]
	InvalidSource(String),
}

impl From<SourceError> for todo_core::Error {
	fn from(error: SourceError) -> Self {
		todo_core::Error::ImproperlyConfigured(error.to_string())
	}
}

/// Environment variable configuration source
pub struct EnvSource {
	prefix: Option<String>,
}

impl EnvSource {
	/// Create a new environment variable configuration source
	pub fn new() -> Self {
		Self { prefix: None }
	}

	/// Set a prefix filter for environment variables
	///
	/// The prefix is stripped and the rest lowercased, so `TODO_LOG_LEVEL`
	/// becomes the `log_level` key.
	///
	/// # Examples
	///
	/// ```
	/// use todo_conf::EnvSource;
	///
	/// let source = EnvSource::new().with_prefix("TODO_");
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Load from an explicit list of variables instead of the process environment
	pub fn load_from<I>(&self, vars: I) -> IndexMap<String, Value>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut config = IndexMap::new();

		for (key, value) in vars {
			let clean_key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(rest) => rest,
					None => continue,
				},
				None => key.as_str(),
			};
			let lower_key = clean_key.to_lowercase();
			let parsed = parse_env_value(&lower_key, value);
			config.insert(lower_key, parsed);
		}

		config
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

fn parse_env_value(key: &str, value: String) -> Value {
	if key == "debug" {
		return match value.trim().to_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Value::Bool(true),
			"false" | "0" | "no" | "off" => Value::Bool(false),
			_ => Value::String(value),
		};
	}
	if key == "allowed_hosts" {
		let list = value
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(|s| Value::String(s.to_string()))
			.collect();
		return Value::Array(list);
	}
	if let Ok(num) = value.parse::<i64>() {
		Value::Number(num.into())
	} else if let Ok(b) = value.parse::<bool>() {
		Value::Bool(b)
	} else {
		Value::String(value)
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.load_from(std::env::vars()))
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

/// TOML file configuration source
///
/// A missing file is not an error; it simply contributes nothing.
pub struct TomlFileSource {
	path: PathBuf,
	priority: u8,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			priority: 50,
		}
	}

	/// Override the priority, e.g. to rank a profile overlay above the base file
	pub fn with_priority(mut self, priority: u8) -> Self {
		self.priority = priority;
		self
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Table = toml::from_str(&content)?;

		let json_value = serde_json::to_value(toml_value)?;
		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		self.priority
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values configuration source
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	/// Create a new default values configuration source
	///
	/// # Examples
	///
	/// ```
	/// use todo_conf::DefaultSource;
	/// use serde_json::Value;
	///
	/// let source = DefaultSource::new()
	///     .with_value("debug", Value::Bool(false))
	///     .with_value("admin_page_size", Value::Number(50.into()));
	/// ```
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_env_source_strips_prefix_and_parses_types() {
		let source = EnvSource::new().with_prefix("TODO_");
		let config = source.load_from(vars(&[
			("TODO_DEBUG", "off"),
			("TODO_ADMIN_PAGE_SIZE", "25"),
			("TODO_ALLOWED_HOSTS", "a.example, b.example"),
			("TODO_DATABASE_URL", "sqlite::memory:"),
			("HOME", "/root"),
		]));

		assert_eq!(config.get("debug"), Some(&Value::Bool(false)));
		assert_eq!(config.get("admin_page_size"), Some(&Value::Number(25.into())));
		assert_eq!(
			config.get("allowed_hosts"),
			Some(&serde_json::json!(["a.example", "b.example"]))
		);
		assert_eq!(
			config.get("database_url"),
			Some(&Value::String("sqlite::memory:".into()))
		);
		assert!(!config.contains_key("home"));
	}

	#[rstest]
	fn test_toml_source_reads_file() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(file, "debug = false\nlog_level = \"warn\"").unwrap();

		let config = TomlFileSource::new(file.path()).load().unwrap();

		assert_eq!(config.get("debug"), Some(&Value::Bool(false)));
		assert_eq!(config.get("log_level"), Some(&Value::String("warn".into())));
	}

	#[rstest]
	fn test_toml_source_missing_file_is_empty() {
		let config = TomlFileSource::new("/nonexistent/settings.toml").load().unwrap();
		assert!(config.is_empty());
	}

	#[rstest]
	fn test_toml_source_reports_syntax_error() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(file, "debug = ").unwrap();

		let result = TomlFileSource::new(file.path()).load();

		assert!(matches!(result, Err(SourceError::Toml(_))));
	}
}
