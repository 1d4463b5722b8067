//! Path pattern matching
//!
//! Patterns use Django-style placeholders:
//!
//! - `/api/todos/` - exact match
//! - `/api/todos/{id}/` - one segment, any characters except `/`
//! - `/api/todos/{id:int}/` - one segment of ASCII digits
//!
//! The trailing slash is optional on both sides: `/api/todos` and
//! `/api/todos/` match the same pattern.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	regex: regex::Regex,
	param_names: Vec<String>,
}

impl PathPattern {
	/// Compile a pattern
	///
	/// # Errors
	///
	/// Returns a message when a placeholder is unterminated or uses an
	/// unknown converter.
	///
	/// # Examples
	///
	/// ```
	/// use todo_rest::routers::PathPattern;
	///
	/// let pattern = PathPattern::new("/api/todos/{id:int}/").unwrap();
	///
	/// let params = pattern.matches("/api/todos/42").unwrap();
	/// assert_eq!(params["id"], "42");
	/// assert!(pattern.matches("/api/todos/abc/").is_none());
	/// ```
	pub fn new(pattern: &str) -> Result<Self, String> {
		let (regex_str, param_names) = Self::compile_pattern(pattern)?;
		let regex = regex::Regex::new(&regex_str)
			.map_err(|e| format!("Failed to compile pattern {}: {}", pattern, e))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			param_names,
		})
	}

	fn compile_pattern(pattern: &str) -> Result<(String, Vec<String>), String> {
		let trimmed = pattern.trim_end_matches('/');
		let mut regex_str = String::from("^");
		let mut param_names = Vec::new();
		let mut chars = trimmed.chars();

		while let Some(c) = chars.next() {
			if c != '{' {
				regex_str.push_str(&regex::escape(&c.to_string()));
				continue;
			}

			let mut placeholder = String::new();
			loop {
				match chars.next() {
					Some('}') => break,
					Some(next) => placeholder.push(next),
					None => return Err(format!("Unterminated placeholder in {}", pattern)),
				}
			}

			let (name, converter) = match placeholder.split_once(':') {
				Some((name, converter)) => (name, converter),
				None => (placeholder.as_str(), "str"),
			};
			let class = match converter {
				"str" => "[^/]+",
				"int" => "[0-9]+",
				other => return Err(format!("Unknown converter {} in {}", other, pattern)),
			};
			regex_str.push_str(&format!("(?P<{}>{})", name, class));
			param_names.push(name.to_string());
		}

		regex_str.push_str("/?$");
		Ok((regex_str, param_names))
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Match `path`, returning the captured parameters
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		self.regex.captures(path).map(|caps| {
			self.param_names
				.iter()
				.filter_map(|name| caps.name(name).map(|m| (name.clone(), m.as_str().to_string())))
				.collect()
		})
	}

	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}
}

impl std::fmt::Display for PathPattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.pattern)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/api/todos/", "/api/todos/", true)]
	#[case("/api/todos/", "/api/todos", true)]
	#[case("/health", "/health/", true)]
	#[case("/api/todos/", "/api/todos/1/", false)]
	#[case("/api/todos/overdue/", "/api/todos/overdue", true)]
	#[case("/", "/", true)]
	fn test_exact_pattern(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
		assert_eq!(PathPattern::new(pattern).unwrap().is_match(path), expected);
	}

	#[rstest]
	fn test_single_param() {
		let pattern = PathPattern::new("/api/todos/{id}/change-status/").unwrap();

		let params = pattern.matches("/api/todos/abc/change-status/").unwrap();

		assert_eq!(params.get("id"), Some(&"abc".to_string()));
		assert_eq!(pattern.param_names(), ["id"]);
	}

	#[rstest]
	#[case("/api/todos/7/", true)]
	#[case("/api/todos/-7/", false)]
	#[case("/api/todos/seven/", false)]
	#[case("/api/todos/overdue/", false)]
	fn test_int_converter(#[case] path: &str, #[case] expected: bool) {
		let pattern = PathPattern::new("/api/todos/{id:int}/").unwrap();
		assert_eq!(pattern.is_match(path), expected);
	}

	#[rstest]
	fn test_special_chars_escaped() {
		let pattern = PathPattern::new("/files/a.b/").unwrap();

		assert!(pattern.is_match("/files/a.b/"));
		assert!(!pattern.is_match("/files/axb/"));
	}

	#[rstest]
	#[case("/api/{id")]
	#[case("/api/{id:uuid}/")]
	fn test_invalid_patterns(#[case] pattern: &str) {
		assert!(PathPattern::new(pattern).is_err());
	}
}
