//! # todo-web configuration
//!
//! Django-inspired settings management. A [`Settings`] value is built once at
//! startup by merging configuration sources in priority order and is then
//! passed around explicitly (usually inside an `Arc`).
//!
//! ```text
//! defaults  <  settings/base.toml  <  settings/{profile}.toml  <  TODO_* env vars
//! ```
//!
//! ## Module Organization
//!
//! - [`settings`]: the typed settings struct, profiles, sources and builder

pub mod settings;

pub use settings::builder::{MergedSettings, SettingsBuilder};
pub use settings::profile::Profile;
pub use settings::sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};
pub use settings::{DEFAULT_SECRET_KEY, LogFormat, Settings};
