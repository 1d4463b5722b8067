//! Live server smoke test over real HTTP

mod common;

use common::{TestApp, USER_PASSWORD};
use rstest::*;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use todo_server::ShutdownCoordinator;
use tokio::net::TcpListener;

#[derive(Debug, Deserialize)]
struct TokenResponse {
	token: String,
}

#[rstest]
#[tokio::test]
async fn test_token_and_crud_over_http() {
	let app = std::sync::Arc::new(TestApp::new().await);
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let base = format!("http://{}", listener.local_addr().unwrap());
	let coordinator = ShutdownCoordinator::new(Duration::from_secs(2));

	let server = {
		let app = app.clone();
		let coordinator = coordinator.clone();
		tokio::spawn(async move { app.app.serve_listener(listener, coordinator).await })
	};
	let client = reqwest::Client::new();

	let health = client.get(format!("{}/health", base)).send().await.unwrap();
	assert_eq!(health.status().as_u16(), 200);

	let token: TokenResponse = client
		.post(format!("{}/api/auth/token/", base))
		.json(&json!({"username": "alice", "password": USER_PASSWORD}))
		.send()
		.await
		.unwrap()
		.json()
		.await
		.unwrap();
	let auth = format!("Token {}", token.token);

	let created = client
		.post(format!("{}/api/todos/", base))
		.header("Authorization", &auth)
		.json(&json!({"title": "Over the wire", "description": "d"}))
		.send()
		.await
		.unwrap();
	assert_eq!(created.status().as_u16(), 201);
	let created: Value = created.json().await.unwrap();

	let listed: Value = client
		.get(format!("{}/api/todos/?status=OPEN", base))
		.header("Authorization", &auth)
		.send()
		.await
		.unwrap()
		.json()
		.await
		.unwrap();
	assert_eq!(listed[0]["id"], created["id"]);

	let anonymous = client
		.get(format!("{}/api/todos/", base))
		.send()
		.await
		.unwrap();
	assert_eq!(anonymous.status().as_u16(), 401);
	assert_eq!(anonymous.headers()["www-authenticate"], "Token");

	let malformed = client
		.post(format!("{}/api/todos/", base))
		.header("Authorization", &auth)
		.header("Content-Type", "application/json")
		.body("{not json")
		.send()
		.await
		.unwrap();
	assert_eq!(malformed.status().as_u16(), 400);
	let malformed: Value = malformed.json().await.unwrap();
	assert_eq!(malformed["code"], "parse_error");

	coordinator.shutdown();
	tokio::time::timeout(Duration::from_secs(5), server)
		.await
		.unwrap()
		.unwrap()
		.unwrap();
}
