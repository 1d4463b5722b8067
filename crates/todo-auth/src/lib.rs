//! Authentication for todo-web
//!
//! Users are stored in `auth_user` with Argon2 password hashes; API clients
//! exchange credentials for a token at `POST /api/auth/token/` and send it as
//! `Authorization: Token <key>`. [`TokenAuthentication`] resolves the header
//! into an [`AuthState`](todo_http::AuthState) stored in the request
//! extensions, and the [`permissions`] checks read it back.

pub mod backend;
pub mod hasher;
pub mod permissions;
pub mod schema;
pub mod tokens;
pub mod users;
pub mod views;

pub use backend::{AuthenticationBackend, TokenAuthentication};
pub use hasher::{Argon2Hasher, PasswordHasher};
pub use permissions::{IsAdminUser, IsAuthenticated, Permission};
pub use tokens::{Token, TokenStore};
pub use users::{User, UserStore};
pub use views::ObtainAuthToken;
