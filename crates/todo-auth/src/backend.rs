//! Token authentication
//!
//! [`TokenAuthentication`] is both an [`AuthenticationBackend`] and the
//! middleware that runs it for every request. A request without an
//! `Authorization: Token ...` header continues as anonymous; a header naming
//! an unknown key or an inactive user is rejected with 401.

use crate::tokens::TokenStore;
use async_trait::async_trait;
use std::sync::Arc;
use todo_core::exception::{Error, Result};
use todo_db::DatabaseConnection;
use todo_http::{AuthState, Handler, Middleware, Request, Response};

const KEYWORD: &str = "Token";

/// Resolves request credentials into an identity
#[async_trait]
pub trait AuthenticationBackend: Send + Sync {
	/// Authenticate a request
	///
	/// - `Ok(Some(state))` if credentials were supplied and are valid
	/// - `Ok(None)` if the request carries no credentials for this backend
	/// - `Err(_)` if credentials were supplied but are invalid
	async fn authenticate(&self, request: &Request) -> Result<Option<AuthState>>;
}

/// `Authorization: Token <key>` authentication
#[derive(Clone)]
pub struct TokenAuthentication {
	tokens: TokenStore,
}

impl TokenAuthentication {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self {
			tokens: TokenStore::new(conn),
		}
	}

	pub fn with_store(tokens: TokenStore) -> Self {
		Self { tokens }
	}
}

/// Split an `Authorization` header into the token key
///
/// Headers using another scheme are not ours and yield `Ok(None)`.
fn token_key(header: &str) -> Result<Option<&str>> {
	let mut parts = header.split_whitespace();
	match parts.next() {
		Some(scheme) if scheme.eq_ignore_ascii_case(KEYWORD) => {}
		_ => return Ok(None),
	}
	match (parts.next(), parts.next()) {
		(Some(key), None) => Ok(Some(key)),
		(None, _) => Err(Error::AuthenticationFailed(
			"Invalid token header. No credentials provided.".to_string(),
		)),
		(Some(_), Some(_)) => Err(Error::AuthenticationFailed(
			"Invalid token header. Token string should not contain spaces.".to_string(),
		)),
	}
}

#[async_trait]
impl AuthenticationBackend for TokenAuthentication {
	async fn authenticate(&self, request: &Request) -> Result<Option<AuthState>> {
		let Some(header) = request.header("authorization") else {
			return Ok(None);
		};
		let Some(key) = token_key(header)? else {
			return Ok(None);
		};

		match self.tokens.lookup(key).await? {
			Some(user) if user.is_active => Ok(Some(user.auth_state())),
			Some(user) => {
				tracing::warn!(username = %user.username, "Token of inactive user rejected");
				Err(Error::AuthenticationFailed(
					"User inactive or deleted.".to_string(),
				))
			}
			None => {
				tracing::warn!(path = %request.path(), "Invalid API token");
				Err(Error::AuthenticationFailed("Invalid token.".to_string()))
			}
		}
	}
}

#[async_trait]
impl Middleware for TokenAuthentication {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let state = self
			.authenticate(&request)
			.await?
			.unwrap_or_else(AuthState::anonymous);
		request.extensions.insert(state);
		next.handle(request).await
	}
}
