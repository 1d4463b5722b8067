//! Shared fixtures for the end-to-end tests

#![allow(dead_code)]

use hyper::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use todo_auth::TokenStore;
use todo_conf::Settings;
use todo_http::{Handler, Request, Response};
use todo_web::Application;

pub const USER_PASSWORD: &str = "correct-horse-battery";
pub const STAFF_PASSWORD: &str = "staple-admin-42";

/// An application on a private in-memory database with one regular and one
/// staff account
pub struct TestApp {
	pub app: Application,
	handler: Arc<dyn Handler>,
	pub user_token: String,
	pub staff_token: String,
}

impl TestApp {
	pub async fn new() -> Self {
		let app = Application::build(Settings::for_testing()).await.unwrap();
		let tokens = TokenStore::new(app.connection().clone());
		let user = tokens
			.users()
			.create_user("alice", USER_PASSWORD)
			.await
			.unwrap();
		let staff = tokens
			.users()
			.create_superuser("admin", STAFF_PASSWORD)
			.await
			.unwrap();
		let user_token = tokens.get_or_create(&user).await.unwrap().key;
		let staff_token = tokens.get_or_create(&staff).await.unwrap().key;
		let handler = app.handler();

		Self {
			app,
			handler,
			user_token,
			staff_token,
		}
	}

	/// Send a request through the full middleware chain
	pub async fn send(
		&self,
		method: Method,
		path: &str,
		token: Option<&str>,
		body: Option<Value>,
	) -> Response {
		let mut builder = Request::builder().method(method).uri(path);
		if let Some(token) = token {
			builder = builder.header("authorization", &format!("Token {}", token));
		}
		if let Some(body) = body {
			builder = builder.json(&body);
		}
		match self.handler.handle(builder.build().unwrap()).await {
			Ok(response) => response,
			Err(err) => Response::from(err),
		}
	}

	/// Like [`TestApp::send`] as the regular user, decoding the body
	pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
		let response = self.send(method, path, Some(&self.user_token), body).await;
		decode(response)
	}

	pub async fn call_as_staff(
		&self,
		method: Method,
		path: &str,
		body: Option<Value>,
	) -> (StatusCode, Value) {
		let response = self.send(method, path, Some(&self.staff_token), body).await;
		decode(response)
	}
}

pub fn decode(response: Response) -> (StatusCode, Value) {
	let body = if response.body.is_empty() {
		Value::Null
	} else {
		response.body_json().unwrap()
	};
	(response.status, body)
}
