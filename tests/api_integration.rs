//! REST API integration tests
//!
//! Every request runs through the same middleware chain and router as the
//! server: request logging, allowed hosts, token authentication.

mod common;

use common::{TestApp, USER_PASSWORD};
use hyper::{Method, StatusCode};
use rstest::*;
use serde_json::{Value, json};

#[fixture]
async fn app() -> TestApp {
	TestApp::new().await
}

async fn create(app: &TestApp, body: Value) -> Value {
	let (status, body) = app.call(Method::POST, "/api/todos/", Some(body)).await;
	assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
	body
}

// ========================================================================
// Authentication
// ========================================================================

#[rstest]
#[case(Method::GET, "/api/todos/")]
#[case(Method::POST, "/api/todos/")]
#[case(Method::GET, "/api/todos/1/")]
#[case(Method::DELETE, "/api/todos/1/")]
#[case(Method::PATCH, "/api/todos/1/change-status/")]
#[case(Method::GET, "/api/todos/overdue/")]
#[tokio::test]
async fn test_anonymous_requests_are_rejected(
	#[future] app: TestApp,
	#[case] method: Method,
	#[case] path: &str,
) {
	let app = app.await;

	let response = app.send(method, path, None, Some(json!({}))).await;

	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
	assert_eq!(response.headers["www-authenticate"], "Token");
	let (_, body) = common::decode(response);
	assert_eq!(body["code"], "not_authenticated");
}

#[rstest]
#[tokio::test]
async fn test_unknown_token_is_rejected(#[future] app: TestApp) {
	let app = app.await;
	let bogus = "0".repeat(40);

	let (status, body) = common::decode(
		app.send(Method::GET, "/api/todos/", Some(&bogus), None)
			.await,
	);

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["code"], "authentication_failed");
}

#[rstest]
#[tokio::test]
async fn test_obtain_token_round_trip(#[future] app: TestApp) {
	let app = app.await;

	let response = app
		.send(
			Method::POST,
			"/api/auth/token/",
			None,
			Some(json!({"username": "alice", "password": USER_PASSWORD})),
		)
		.await;
	let (status, body) = common::decode(response);
	let token = body["token"].as_str().unwrap().to_string();
	let listed = app.send(Method::GET, "/api/todos/", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(token, app.user_token);
	assert_eq!(listed.status, StatusCode::OK);
}

#[rstest]
#[tokio::test]
async fn test_obtain_token_with_wrong_password(#[future] app: TestApp) {
	let app = app.await;

	let (status, body) = common::decode(
		app.send(
			Method::POST,
			"/api/auth/token/",
			None,
			Some(json!({"username": "alice", "password": "nope"})),
		)
		.await,
	);

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["errors"]["non_field_errors"][0]["code"], "invalid_credentials");
}

// ========================================================================
// CRUD
// ========================================================================

#[rstest]
#[tokio::test]
async fn test_create_returns_full_record(#[future] app: TestApp) {
	let app = app.await;

	let body = create(
		&app,
		json!({"title": "Test Todo", "description": "Test Description", "tag": "work-1"}),
	)
	.await;

	assert!(body["id"].as_i64().unwrap() > 0);
	assert_eq!(body["title"], "Test Todo");
	assert_eq!(body["status"], "OPEN");
	assert_eq!(body["tag"], "work-1");
	assert_eq!(body["due_date"], Value::Null);
	assert!(body["created_at"].is_string());
	assert!(body["updated_at"].is_string());
}

#[rstest]
#[tokio::test]
async fn test_read_only_fields_are_ignored(#[future] app: TestApp) {
	let app = app.await;

	let body = create(
		&app,
		json!({
			"id": 999,
			"title": "t",
			"description": "d",
			"created_at": "2000-01-01T00:00:00Z"
		}),
	)
	.await;

	assert_ne!(body["id"], 999);
	assert_ne!(body["created_at"], "2000-01-01T00:00:00Z");
}

#[rstest]
#[case(0, false)]
#[case(1, true)]
#[case(100, true)]
#[case(101, false)]
#[tokio::test]
async fn test_title_length_bounds(
	#[future] app: TestApp,
	#[case] length: usize,
	#[case] accepted: bool,
) {
	let app = app.await;

	let (status, body) = app
		.call(
			Method::POST,
			"/api/todos/",
			Some(json!({"title": "x".repeat(length), "description": "d"})),
		)
		.await;

	if accepted {
		assert_eq!(status, StatusCode::CREATED);
	} else {
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["errors"]["title"][0]["code"], "title_length");
	}
}

#[rstest]
#[tokio::test]
async fn test_missing_fields_are_reported_together(#[future] app: TestApp) {
	let app = app.await;

	let (status, body) = app.call(Method::POST, "/api/todos/", Some(json!({}))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], "required");
	assert_eq!(body["errors"]["title"][0]["code"], "required");
	assert_eq!(body["errors"]["description"][0]["code"], "required");
}

#[rstest]
#[tokio::test]
async fn test_duplicate_tag_is_a_conflict(#[future] app: TestApp) {
	let app = app.await;
	create(&app, json!({"title": "a", "description": "d", "tag": "unique"})).await;

	let (status, body) = app
		.call(
			Method::POST,
			"/api/todos/",
			Some(json!({"title": "b", "description": "d", "tag": "unique"})),
		)
		.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["code"], "tag_conflict");
}

#[rstest]
#[tokio::test]
async fn test_untagged_records_do_not_conflict(#[future] app: TestApp) {
	let app = app.await;

	create(&app, json!({"title": "a", "description": "d"})).await;
	create(&app, json!({"title": "b", "description": "d", "tag": ""})).await;
	let (_, listed) = app.call(Method::GET, "/api/todos/", None).await;

	assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[rstest]
#[tokio::test]
async fn test_put_replaces_and_patch_merges(#[future] app: TestApp) {
	let app = app.await;
	let created = create(&app, json!({"title": "a", "description": "d", "tag": "t1"})).await;
	let path = format!("/api/todos/{}/", created["id"]);

	let (patched_status, patched) = app
		.call(Method::PATCH, &path, Some(json!({"title": "renamed"})))
		.await;
	let (put_status, put) = app
		.call(Method::PUT, &path, Some(json!({"title": "full", "description": "new"})))
		.await;
	let (incomplete_status, incomplete) = app
		.call(Method::PUT, &path, Some(json!({"title": "only"})))
		.await;

	assert_eq!(patched_status, StatusCode::OK);
	assert_eq!(patched["title"], "renamed");
	assert_eq!(patched["tag"], "t1");
	assert_eq!(put_status, StatusCode::OK);
	assert_eq!(put["description"], "new");
	assert_eq!(incomplete_status, StatusCode::BAD_REQUEST);
	assert_eq!(incomplete["errors"]["description"][0]["code"], "required");
}

#[rstest]
#[tokio::test]
async fn test_delete_then_get_is_not_found(#[future] app: TestApp) {
	let app = app.await;
	let created = create(&app, json!({"title": "a", "description": "d"})).await;
	let path = format!("/api/todos/{}/", created["id"]);

	let (deleted, body) = app.call(Method::DELETE, &path, None).await;
	let (fetched, _) = app.call(Method::GET, &path, None).await;
	let (again, _) = app.call(Method::DELETE, &path, None).await;

	assert_eq!(deleted, StatusCode::NO_CONTENT);
	assert_eq!(body, Value::Null);
	assert_eq!(fetched, StatusCode::NOT_FOUND);
	assert_eq!(again, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn test_status_filter_matches_stored_status_exactly(#[future] app: TestApp) {
	let app = app.await;
	create(&app, json!({"title": "open", "description": "d"})).await;
	create(&app, json!({"title": "busy", "description": "d", "status": "WORKING"})).await;
	create(&app, json!({"title": "done", "description": "d", "status": "COMPLETED"})).await;

	let (_, open) = app.call(Method::GET, "/api/todos/?status=OPEN", None).await;
	let (_, unknown) = app.call(Method::GET, "/api/todos/?status=open", None).await;

	let titles: Vec<_> = open.as_array().unwrap().iter().map(|t| t["title"].clone()).collect();
	assert_eq!(titles, vec![json!("open")]);
	assert_eq!(unknown, json!([]));
}

#[rstest]
#[tokio::test]
async fn test_list_is_newest_first(#[future] app: TestApp) {
	let app = app.await;
	for title in ["first", "second", "third"] {
		create(&app, json!({"title": title, "description": "d"})).await;
	}

	let (_, listed) = app.call(Method::GET, "/api/todos", None).await;
	let titles: Vec<_> = listed
		.as_array()
		.unwrap()
		.iter()
		.map(|t| t["title"].as_str().unwrap().to_string())
		.collect();

	assert_eq!(titles, vec!["third", "second", "first"]);
}

// ========================================================================
// Routing
// ========================================================================

#[rstest]
#[tokio::test]
async fn test_unsupported_method_lists_allowed(#[future] app: TestApp) {
	let app = app.await;

	let response = app
		.send(Method::DELETE, "/api/todos/", Some(&app.user_token), None)
		.await;

	assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
	assert_eq!(response.headers["allow"], "GET, POST");
}

#[rstest]
#[case("/api/todos/abc/")]
#[case("/api/nothing/")]
#[tokio::test]
async fn test_unknown_paths_are_not_found(#[future] app: TestApp, #[case] path: &str) {
	let app = app.await;

	let (status, body) = app.call(Method::GET, path, None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["code"], "not_found");
}

#[rstest]
#[tokio::test]
async fn test_health_needs_no_credentials(#[future] app: TestApp) {
	let app = app.await;

	let (status, body) = common::decode(app.send(Method::GET, "/health", None, None).await);

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ok");
}

#[rstest]
#[tokio::test]
async fn test_disallowed_host_is_rejected(#[future] app: TestApp) {
	let app = app.await;
	let request = todo_http::Request::builder()
		.uri("/health")
		.header("host", "attacker.invalid")
		.build()
		.unwrap();

	let result = app.app.handler().handle(request).await;

	assert_eq!(result.unwrap_err().status_code(), 400);
}

// ========================================================================
// Admin
// ========================================================================

#[rstest]
#[tokio::test]
async fn test_admin_requires_staff(#[future] app: TestApp) {
	let app = app.await;

	let (regular, _) = app
		.call(Method::GET, "/admin/todo_app/todoitem/", None)
		.await;
	let (staff, body) = app
		.call_as_staff(Method::GET, "/admin/todo_app/todoitem/", None)
		.await;

	assert_eq!(regular, StatusCode::FORBIDDEN);
	assert_eq!(staff, StatusCode::OK);
	assert_eq!(body["count"], 0);
}

#[rstest]
#[tokio::test]
async fn test_admin_action_then_api_read(#[future] app: TestApp) {
	let app = app.await;
	let created = create(&app, json!({"title": "a", "description": "d"})).await;

	let (status, body) = app
		.call_as_staff(
			Method::POST,
			"/admin/todo_app/todoitem/actions/",
			Some(json!({"action": "mark_completed", "ids": [created["id"]]})),
		)
		.await;
	let (_, fetched) = app
		.call(Method::GET, &format!("/api/todos/{}/", created["id"]), None)
		.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["updated"], 1);
	assert_eq!(fetched["status"], "COMPLETED");
}
