//! Tracing subscriber setup

use todo_conf::{LogFormat, Settings};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Filter from `RUST_LOG`, falling back to `default_level`
///
/// sqlx statement logging is capped at `warn` unless `RUST_LOG` says otherwise.
pub fn env_filter(default_level: &str) -> EnvFilter {
	EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", default_level)))
}

/// Install the global subscriber described by `settings`
///
/// Fails if a subscriber is already installed.
pub fn init(settings: &Settings) -> Result<(), TryInitError> {
	init_with_level(settings, &settings.log_level)
}

/// Like [`init`] with an explicit default level, e.g. from `-v` flags
pub fn init_with_level(settings: &Settings, level: &str) -> Result<(), TryInitError> {
	let (pretty, json) = match settings.log_format {
		LogFormat::Pretty => (Some(fmt::layer().with_target(true)), None),
		LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(false))),
	};

	tracing_subscriber::registry()
		.with(env_filter(level))
		.with(pretty)
		.with(json)
		.try_init()
}
