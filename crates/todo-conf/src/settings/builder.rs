//! Settings builder
//!
//! Collects [`ConfigSource`]s, loads them lowest priority first and merges
//! the results key by key.

use super::profile::Profile;
use super::sources::{ConfigSource, SourceError};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Builder merging configuration sources
///
/// # Examples
///
/// ```
/// use todo_conf::{DefaultSource, SettingsBuilder};
/// use serde_json::Value;
///
/// let merged = SettingsBuilder::new()
///     .add_source(DefaultSource::new().with_value("debug", Value::Bool(true)))
///     .build()
///     .unwrap();
///
/// assert_eq!(merged.get("debug"), Some(&Value::Bool(true)));
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	profile: Profile,
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn profile(mut self, profile: Profile) -> Self {
		self.profile = profile;
		self
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Load every source and merge them
	///
	/// Sources of equal priority are applied in the order they were added.
	pub fn build(mut self) -> Result<MergedSettings, SourceError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut values = IndexMap::new();
		for source in &self.sources {
			let loaded = source.load()?;
			tracing::debug!(
				source = %source.description(),
				keys = loaded.len(),
				"Loaded configuration source"
			);
			values.extend(loaded);
		}

		Ok(MergedSettings {
			profile: self.profile,
			values,
		})
	}
}

/// Result of merging every source
#[derive(Debug, Clone)]
pub struct MergedSettings {
	profile: Profile,
	values: IndexMap<String, Value>,
}

impl MergedSettings {
	pub fn profile(&self) -> Profile {
		self.profile
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &String> {
		self.values.keys()
	}

	/// Deserialize the merged map into a typed settings struct
	pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, SourceError> {
		let object: serde_json::Map<String, Value> = self.values.into_iter().collect();
		Ok(serde_json::from_value(Value::Object(object))?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::sources::{DefaultSource, EnvSource, TomlFileSource};
	use rstest::rstest;
	use std::io::Write;

	struct FixedEnv(Vec<(String, String)>);

	impl ConfigSource for FixedEnv {
		fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
			Ok(EnvSource::new()
				.with_prefix("TODO_")
				.load_from(self.0.clone()))
		}

		fn priority(&self) -> u8 {
			100
		}

		fn description(&self) -> String {
			"fixed env".to_string()
		}
	}

	#[rstest]
	fn test_later_sources_override_earlier() {
		let mut base = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(base, "log_level = \"warn\"\nadmin_page_size = 10").unwrap();

		let merged = SettingsBuilder::new()
			.add_source(FixedEnv(vec![(
				"TODO_LOG_LEVEL".to_string(),
				"debug".to_string(),
			)]))
			.add_source(TomlFileSource::new(base.path()))
			.add_source(
				DefaultSource::new()
					.with_value("log_level", Value::String("info".into()))
					.with_value("debug", Value::Bool(true)),
			)
			.build()
			.unwrap();

		assert_eq!(merged.get("log_level"), Some(&Value::String("debug".into())));
		assert_eq!(merged.get("admin_page_size"), Some(&Value::Number(10.into())));
		assert_eq!(merged.get("debug"), Some(&Value::Bool(true)));
	}

	#[rstest]
	fn test_profile_overlay_beats_base_file() {
		let mut base = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(base, "debug = true").unwrap();
		let mut overlay = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(overlay, "debug = false").unwrap();

		let merged = SettingsBuilder::new()
			.profile(Profile::Production)
			.add_source(TomlFileSource::new(overlay.path()).with_priority(60))
			.add_source(TomlFileSource::new(base.path()))
			.build()
			.unwrap();

		assert_eq!(merged.profile(), Profile::Production);
		assert_eq!(merged.get("debug"), Some(&Value::Bool(false)));
	}
}
