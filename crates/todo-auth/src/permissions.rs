//! Permission checks
//!
//! Views call [`Permission::check`] with the identity attached by
//! [`TokenAuthentication`](crate::TokenAuthentication). Anonymous callers get
//! `401 not_authenticated`; authenticated callers lacking the permission get
//! `403 permission_denied`.

use todo_core::exception::{Error, Result};
use todo_http::{AuthState, Request};

pub trait Permission: Send + Sync {
	fn has_permission(&self, auth: &AuthState) -> bool;

	/// Message of the 403 raised when an authenticated caller is refused
	fn message(&self) -> &'static str {
		"You do not have permission to perform this action."
	}

	fn check(&self, auth: &AuthState) -> Result<()> {
		if self.has_permission(auth) {
			Ok(())
		} else if auth.is_anonymous() {
			Err(Error::NotAuthenticated)
		} else {
			Err(Error::PermissionDenied(self.message().to_string()))
		}
	}

	/// Check against the identity stored on `request`
	fn check_request(&self, request: &Request) -> Result<AuthState> {
		let auth = AuthState::from_extensions(&request.extensions);
		self.check(&auth)?;
		Ok(auth)
	}
}

/// Any active, authenticated user
#[derive(Debug, Clone, Copy, Default)]
pub struct IsAuthenticated;

impl Permission for IsAuthenticated {
	fn has_permission(&self, auth: &AuthState) -> bool {
		auth.is_authenticated && auth.is_active
	}
}

/// Staff users only
#[derive(Debug, Clone, Copy, Default)]
pub struct IsAdminUser;

impl Permission for IsAdminUser {
	fn has_permission(&self, auth: &AuthState) -> bool {
		auth.is_authenticated && auth.is_active && auth.is_staff
	}

	fn message(&self) -> &'static str {
		"Staff access required."
	}
}
