//! Authentication state stored in request extensions.
//!
//! The token authentication middleware inserts an [`AuthState`] for every
//! request it lets through; views read it back to enforce permissions.

use crate::Extensions;

/// Who is making the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
	/// Primary key of the authenticated user, `0` when anonymous
	pub user_id: i64,

	pub username: String,

	pub is_authenticated: bool,

	/// May use the admin surface
	pub is_staff: bool,

	pub is_superuser: bool,

	pub is_active: bool,
}

impl AuthState {
	/// Creates a new authenticated state.
	pub fn authenticated(
		user_id: i64,
		username: impl Into<String>,
		is_staff: bool,
		is_superuser: bool,
	) -> Self {
		Self {
			user_id,
			username: username.into(),
			is_authenticated: true,
			is_staff,
			is_superuser,
			is_active: true,
		}
	}

	/// Creates an anonymous (unauthenticated) state.
	pub fn anonymous() -> Self {
		Self {
			user_id: 0,
			username: String::new(),
			is_authenticated: false,
			is_staff: false,
			is_superuser: false,
			is_active: false,
		}
	}

	/// Read the state attached by the authentication middleware
	///
	/// Requests that never passed through it count as anonymous.
	pub fn from_extensions(extensions: &Extensions) -> Self {
		extensions.get::<AuthState>().unwrap_or_else(Self::anonymous)
	}

	pub fn is_anonymous(&self) -> bool {
		!self.is_authenticated
	}
}
