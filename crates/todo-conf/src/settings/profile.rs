//! Deployment profiles

use std::fmt;

/// Which environment the process runs in
///
/// Selected with the `TODO_ENV` variable; it also picks the
/// `settings/{profile}.toml` overlay file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
	#[default]
	Local,
	Ci,
	Production,
}

impl Profile {
	/// Parse a profile name, falling back to [`Profile::Local`]
	///
	/// # Examples
	///
	/// ```
	/// use todo_conf::Profile;
	///
	/// assert_eq!(Profile::parse("production"), Profile::Production);
	/// assert_eq!(Profile::parse("PROD"), Profile::Production);
	/// assert_eq!(Profile::parse("ci"), Profile::Ci);
	/// assert_eq!(Profile::parse("whatever"), Profile::Local);
	/// ```
	pub fn parse(s: &str) -> Self {
		match s.trim().to_lowercase().as_str() {
			"production" | "prod" => Profile::Production,
			"ci" | "test" | "testing" => Profile::Ci,
			_ => Profile::Local,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Profile::Local => "local",
			Profile::Ci => "ci",
			Profile::Production => "production",
		}
	}

	pub fn is_production(&self) -> bool {
		matches!(self, Profile::Production)
	}

	/// Value of `debug` when no source sets it
	pub fn default_debug(&self) -> bool {
		!self.is_production()
	}
}

impl fmt::Display for Profile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
