//! HTTP primitives for todo-web
//!
//! Framework-level request and response types decoupled from hyper's
//! streaming bodies, plus the [`Handler`] / [`Middleware`] traits every view
//! and cross-cutting concern is written against.

pub mod auth_state;
pub mod extensions;
pub mod middleware;
pub mod request;
pub mod response;

pub use auth_state::AuthState;
pub use extensions::Extensions;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;

pub use todo_core::exception::{Error, Result};
