//! # todo-web
//!
//! A todo management service: a token-authenticated REST API over a single
//! `TodoItem` entity, a staff-only JSON admin and a `manage` CLI.
//!
//! ## Crates
//!
//! - [`todo_core`]: the model, status lifecycle, validators and error type
//! - [`todo_conf`]: layered settings
//! - [`todo_http`]: request, response, handler and middleware types
//! - [`todo_db`]: SQLite connection, migrations and the todo store
//! - [`todo_auth`]: users, tokens, token authentication and permissions
//! - [`todo_rest`]: serializers, the todos viewset and the router
//! - [`todo_admin`]: changelist, detail and bulk actions
//! - [`todo_server`]: the hyper server and graceful shutdown
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use todo_web::Application;
//! use todo_conf::Settings;
//! use todo_server::ShutdownCoordinator;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load("settings")?;
//! let coordinator = ShutdownCoordinator::new(settings.shutdown_timeout());
//! let address = settings.bind_address.clone();
//! let app = Application::build(settings).await?;
//! app.serve(&address, coordinator).await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod commands;
pub mod logging;

pub use application::{Application, build_router, migrator};
pub use commands::{Cli, CommandError, CommandResult, Commands};

pub use todo_admin as admin;
pub use todo_auth as auth;
pub use todo_conf as conf;
pub use todo_core as core;
pub use todo_db as db;
pub use todo_http as http;
pub use todo_rest as rest;
pub use todo_server as server;
