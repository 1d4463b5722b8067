//! Core building blocks for todo-web
//!
//! This crate holds everything that does not touch I/O:
//!
//! - [`exception`]: the error taxonomy shared by every layer
//! - [`models`]: the `TodoItem` entity and its status enumeration
//! - [`lifecycle`]: the overdue transition rule
//! - [`validators`]: reusable field validators
//! - [`validation`]: the field rules applied to every todo write

pub mod exception;
pub mod lifecycle;
pub mod models;
pub mod validation;
pub mod validators;

pub use exception::{Error, Result};
pub use models::{TodoFields, TodoItem, TodoPatch, TodoStatus};
pub use validators::{FieldError, ValidationErrors};

/// Re-export commonly used types
pub mod prelude {
	pub use crate::exception::{Error, Result};
	pub use crate::lifecycle::{effective_status, is_overdue};
	pub use crate::models::*;
	pub use crate::validators::{FieldError, ValidationErrors, Validator};
}
