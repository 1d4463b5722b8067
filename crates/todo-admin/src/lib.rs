//! Staff-only JSON admin for todo items
//!
//! Mirrors a classic model admin: a filterable, searchable, paginated
//! changelist, a grouped detail view and bulk status actions. Mount the
//! output of [`routes`] on a router, usually under `/admin`.

pub mod actions;
pub mod filters;
pub mod model_admin;
pub mod views;

pub use actions::{ActionInfo, AdminAction};
pub use filters::{DateFieldListFilter, DateRangePreset, FilterInfo, FilterSpec, ListFilter, StatusFilter};
pub use model_admin::{Fieldset, ModelAdmin, TodoItemAdmin};
pub use views::{ActionView, AdminSite, ChangeListQuery, ChangeListView, ChangeView, routes};

/// Path under which [`routes`] are mounted by default
pub const ADMIN_PREFIX: &str = "/admin";
