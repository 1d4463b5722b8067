use super::Request;
use hyper::Uri;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

fn decode_component(raw: &str) -> String {
	let spaced = raw.replace('+', " ");
	percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

impl Request {
	/// Parse query parameters from URI
	pub(super) fn parse_query_params(uri: &Uri) -> HashMap<String, String> {
		uri.query()
			.map(|q| {
				q.split('&')
					.filter(|pair| !pair.is_empty())
					.filter_map(|pair| {
						// Split on first '=' only to preserve '=' in values
						let mut parts = pair.splitn(2, '=');
						Some((
							parts.next()?.to_string(),
							parts.next().unwrap_or("").to_string(),
						))
					})
					.collect()
			})
			.unwrap_or_default()
	}

	/// Get the request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// URL-decoded value of a query parameter
	///
	/// `+` is read as a space, as in form encoding.
	///
	/// # Examples
	///
	/// ```
	/// use todo_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/admin/todo_app/todoitem/?q=buy+milk%21")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.query("q").as_deref(), Some("buy milk!"));
	/// assert_eq!(request.query("page"), None);
	/// ```
	pub fn query(&self, key: &str) -> Option<String> {
		self.query_params
			.iter()
			.find(|(k, _)| decode_component(k) == key)
			.map(|(_, v)| decode_component(v))
	}

	/// All query parameters, URL-decoded
	pub fn decoded_query_params(&self) -> HashMap<String, String> {
		self.query_params
			.iter()
			.map(|(k, v)| (decode_component(k), decode_component(v)))
			.collect()
	}

	/// Set a path parameter (used by routers for path variable extraction)
	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/x?status=OPEN", "status", Some("OPEN"))]
	#[case("/x?status=", "status", Some(""))]
	#[case("/x?status", "status", Some(""))]
	#[case("/x?a=1&&b=2", "b", Some("2"))]
	#[case("/x?token=abc==", "token", Some("abc=="))]
	#[case("/x?q=%E6%97%A5%E6%9C%AC", "q", Some("日本"))]
	#[case("/x", "status", None)]
	fn test_query(#[case] uri: &str, #[case] key: &str, #[case] expected: Option<&str>) {
		let request = Request::builder().uri(uri).build().unwrap();
		assert_eq!(request.query(key).as_deref(), expected);
	}

	#[rstest]
	fn test_decoded_query_params() {
		let request = Request::builder()
			.uri("/x?due_date__gte=2024-01-01T00%3A00%3A00Z")
			.build()
			.unwrap();

		let params = request.decoded_query_params();
		assert_eq!(
			params.get("due_date__gte").map(String::as_str),
			Some("2024-01-01T00:00:00Z")
		);
	}

	#[rstest]
	fn test_set_path_param() {
		let mut request = Request::builder().uri("/api/todos/5/").build().unwrap();
		request.set_path_param("id", "5");

		assert_eq!(request.path_param("id"), Some("5"));
	}
}
