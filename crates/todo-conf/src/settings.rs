//! Typed application settings

pub mod builder;
pub mod profile;
pub mod sources;

use builder::SettingsBuilder;
use chrono_tz::Tz;
use profile::Profile;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sources::{DefaultSource, EnvSource, SourceError, TomlFileSource};
use std::path::Path;
use std::time::Duration;

/// Secret key shipped for local development; rejected in production
pub const DEFAULT_SECRET_KEY: &str = "todo-web-insecure-development-key";

/// Largest page an admin changelist may request
pub const MAX_ADMIN_PAGE_SIZE: usize = 1000;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

/// Application settings
///
/// Built once at startup by [`Settings::load`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	#[serde(skip)]
	pub profile: Profile,
	pub debug: bool,
	#[serde(deserialize_with = "scalar_string")]
	pub secret_key: String,
	pub allowed_hosts: Vec<String>,
	pub bind_address: String,
	pub database_url: String,
	pub log_level: String,
	pub log_format: LogFormat,
	/// IANA zone name used for calendar-based admin filters
	pub time_zone: String,
	pub admin_page_size: usize,
	pub shutdown_timeout_secs: u64,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			profile: Profile::Local,
			debug: true,
			secret_key: DEFAULT_SECRET_KEY.to_string(),
			allowed_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
			bind_address: "127.0.0.1:8000".to_string(),
			database_url: "sqlite://db.sqlite3?mode=rwc".to_string(),
			log_level: "info".to_string(),
			log_format: LogFormat::Pretty,
			time_zone: "UTC".to_string(),
			admin_page_size: 100,
			shutdown_timeout_secs: 30,
		}
	}
}

// Env values like `TODO_SECRET_KEY=12345` arrive as numbers.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	match Value::deserialize(deserializer)? {
		Value::String(s) => Ok(s),
		Value::Number(n) => Ok(n.to_string()),
		Value::Bool(b) => Ok(b.to_string()),
		other => Err(serde::de::Error::custom(format!(
			"expected a string, got {}",
			other
		))),
	}
}

// `example.com:8000` -> `example.com`, `[::1]:8000` -> `[::1]`
fn host_domain(host: &str) -> Option<String> {
	let host = host.trim().to_lowercase();
	let domain = if host.starts_with('[') {
		let end = host.find(']')?;
		let (domain, rest) = host.split_at(end + 1);
		if !(rest.is_empty() || rest.starts_with(':')) {
			return None;
		}
		domain.to_string()
	} else {
		match host.rsplit_once(':') {
			Some((domain, _port)) => domain.to_string(),
			None => host,
		}
	};
	let domain = domain.strip_suffix('.').map(str::to_string).unwrap_or(domain);
	(!domain.is_empty()).then_some(domain)
}

impl Settings {
	/// Settings for tests: in-memory database, quiet logging
	pub fn for_testing() -> Self {
		Self {
			profile: Profile::Ci,
			database_url: "sqlite::memory:".to_string(),
			log_level: "warn".to_string(),
			bind_address: "127.0.0.1:0".to_string(),
			..Default::default()
		}
	}

	/// Load settings from `settings_dir` for the profile named by `TODO_ENV`
	///
	/// Priority order (highest to lowest):
	/// 1. Environment variables with the `TODO_` prefix
	/// 2. Profile TOML file (e.g. `settings/production.toml`)
	/// 3. Base TOML file (`settings/base.toml`)
	/// 4. Default values
	pub fn load(settings_dir: impl AsRef<Path>) -> Result<Self, SourceError> {
		let profile = std::env::var("TODO_ENV")
			.map(|value| Profile::parse(&value))
			.unwrap_or_default();
		Self::load_for_profile(profile, settings_dir)
	}

	pub fn load_for_profile(
		profile: Profile,
		settings_dir: impl AsRef<Path>,
	) -> Result<Self, SourceError> {
		let settings_dir = settings_dir.as_ref();

		let merged = SettingsBuilder::new()
			.profile(profile)
			.add_source(
				DefaultSource::new().with_value("debug", Value::Bool(profile.default_debug())),
			)
			.add_source(TomlFileSource::new(settings_dir.join("base.toml")))
			.add_source(
				TomlFileSource::new(settings_dir.join(format!("{}.toml", profile))).with_priority(60),
			)
			.add_source(EnvSource::new().with_prefix("TODO_"))
			.build()?;

		let mut settings: Settings = merged.into_typed()?;
		settings.profile = profile;
		tracing::debug!(profile = %profile, "Settings loaded");
		Ok(settings)
	}

	/// Reject configurations that must never be served
	pub fn validate(&self) -> todo_core::Result<()> {
		let mut problems = Vec::new();

		if self.database_url.trim().is_empty() {
			problems.push("database_url must not be empty".to_string());
		}
		if self.admin_page_size == 0 || self.admin_page_size > MAX_ADMIN_PAGE_SIZE {
			problems.push(format!(
				"admin_page_size must be between 1 and {}",
				MAX_ADMIN_PAGE_SIZE
			));
		}
		if let Err(err) = self.timezone() {
			problems.push(err.to_string());
		}
		if self.profile.is_production() {
			if self.debug {
				problems.push("debug must be disabled in production".to_string());
			}
			if self.secret_key == DEFAULT_SECRET_KEY || self.secret_key.is_empty() {
				problems.push("secret_key must be set in production".to_string());
			}
			if self.allowed_hosts.is_empty() {
				problems.push("allowed_hosts must not be empty in production".to_string());
			}
		}

		if problems.is_empty() {
			Ok(())
		} else {
			Err(todo_core::Error::ImproperlyConfigured(problems.join("; ")))
		}
	}

	/// The parsed `time_zone`
	pub fn timezone(&self) -> todo_core::Result<Tz> {
		self.time_zone.parse::<Tz>().map_err(|_| {
			todo_core::Error::ImproperlyConfigured(format!(
				"time_zone \"{}\" is not a known time zone",
				self.time_zone
			))
		})
	}

	pub fn shutdown_timeout(&self) -> Duration {
		Duration::from_secs(self.shutdown_timeout_secs)
	}

	/// Whether the domain of `host` is listed in `allowed_hosts`
	///
	/// The port is ignored and bracketed IPv6 literals such as `[::1]:8000`
	/// compare as `[::1]`. `*` allows every host; a leading dot matches the
	/// domain and its subdomains, as in Django.
	pub fn is_host_allowed(&self, host: &str) -> bool {
		let Some(host) = host_domain(host) else {
			return false;
		};
		self.allowed_hosts.iter().any(|pattern| {
			let pattern = pattern.to_lowercase();
			if pattern == "*" {
				true
			} else if let Some(domain) = pattern.strip_prefix('.') {
				host == domain || host.ends_with(&pattern)
			} else {
				host == pattern
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::fs;

	#[rstest]
	fn test_defaults_validate() {
		assert!(Settings::default().validate().is_ok());
		assert!(Settings::for_testing().validate().is_ok());
	}

	#[rstest]
	fn test_empty_database_url_is_rejected() {
		let settings = Settings {
			database_url: "  ".to_string(),
			..Default::default()
		};
		let err = settings.validate().unwrap_err();
		assert!(err.to_string().contains("database_url"));
	}

	#[rstest]
	#[case("UTC", Ok(Tz::UTC))]
	#[case("Asia/Tokyo", Ok(Tz::Asia__Tokyo))]
	#[case("Mars/Olympus_Mons", Err(()))]
	fn test_timezone(#[case] name: &str, #[case] expected: std::result::Result<Tz, ()>) {
		let settings = Settings {
			time_zone: name.to_string(),
			..Default::default()
		};

		assert_eq!(settings.timezone().map_err(|_| ()), expected);
		assert_eq!(settings.validate().is_ok(), expected.is_ok());
	}

	#[rstest]
	#[case(true, "s3cr3t-value", false)]
	#[case(false, DEFAULT_SECRET_KEY, false)]
	#[case(false, "s3cr3t-value", true)]
	fn test_production_checks(#[case] debug: bool, #[case] secret: &str, #[case] ok: bool) {
		let settings = Settings {
			profile: Profile::Production,
			debug,
			secret_key: secret.to_string(),
			..Default::default()
		};
		assert_eq!(settings.validate().is_ok(), ok);
	}

	#[rstest]
	#[case("localhost:8000", true)]
	#[case("api.example.com", true)]
	#[case("example.com", true)]
	#[case("evil.com", false)]
	#[case("[::1]:8000", true)]
	#[case("[::1]", true)]
	#[case("[::2]:8000", false)]
	#[case("[::1", false)]
	#[case("localhost.", true)]
	#[case(":8000", false)]
	fn test_allowed_hosts(#[case] host: &str, #[case] allowed: bool) {
		let settings = Settings {
			allowed_hosts: vec!["localhost".into(), ".example.com".into(), "[::1]".into()],
			..Default::default()
		};
		assert_eq!(settings.is_host_allowed(host), allowed);
	}

	#[rstest]
	#[serial]
	fn test_load_merges_files_and_env() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(
			dir.path().join("base.toml"),
			"log_level = \"warn\"\nadmin_page_size = 20\nsecret_key = \"from-base\"\n",
		)
		.unwrap();
		fs::write(dir.path().join("ci.toml"), "admin_page_size = 30\n").unwrap();

		// SAFETY: serialized with other env-mutating tests
		unsafe {
			std::env::set_var("TODO_LOG_FORMAT", "json");
			std::env::set_var("TODO_SECRET_KEY", "12345");
		}
		let settings = Settings::load_for_profile(Profile::Ci, dir.path());
		unsafe {
			std::env::remove_var("TODO_LOG_FORMAT");
			std::env::remove_var("TODO_SECRET_KEY");
		}
		let settings = settings.unwrap();

		assert_eq!(settings.profile, Profile::Ci);
		assert_eq!(settings.log_level, "warn");
		assert_eq!(settings.admin_page_size, 30);
		assert_eq!(settings.log_format, LogFormat::Json);
		assert_eq!(settings.secret_key, "12345");
		assert!(settings.debug);
	}

	#[rstest]
	#[serial]
	fn test_production_profile_defaults_debug_off() {
		let dir = tempfile::tempdir().unwrap();

		let settings = Settings::load_for_profile(Profile::Production, dir.path()).unwrap();

		assert!(!settings.debug);
		assert!(settings.validate().is_err());
	}
}
