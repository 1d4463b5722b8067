//! Management commands behind the `manage` binary

use crate::application::{Application, build_router, migrator};
use crate::logging;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Input, Password};
use std::path::PathBuf;
use todo_auth::{TokenStore, User};
use todo_conf::{Profile, Settings, SourceError};
use todo_db::DatabaseConnection;
use todo_server::{ServerError, ShutdownCoordinator, shutdown_signal};

/// Environment variable read by `createsuperuser --noinput`
pub const SUPERUSER_PASSWORD_ENV: &str = "TODO_SUPERUSER_PASSWORD";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	#[error("Failed to load settings: {0}")]
	Settings(#[from] SourceError),

	#[error(transparent)]
	App(#[from] todo_core::Error),

	#[error(transparent)]
	Server(#[from] ServerError),

	#[error("Prompt failed: {0}")]
	Prompt(#[from] dialoguer::Error),

	#[error("{0}")]
	ExecutionError(String),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// todo-web management interface
#[derive(Debug, Parser)]
#[command(name = "manage")]
#[command(about = "todo-web management interface", long_about = None)]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,

	/// Directory holding base.toml and the profile files
	#[arg(long, global = true, default_value = "settings", value_name = "DIR")]
	pub settings_dir: PathBuf,

	/// Verbosity level (can be repeated for more output)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbosity: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
	/// Start the server
	Runserver {
		/// Address to bind, overriding `bind_address`
		#[arg(value_name = "ADDRESS")]
		address: Option<String>,
	},

	/// Apply database migrations
	Migrate {
		/// Show the migration plan without applying
		#[arg(long)]
		plan: bool,
	},

	/// Create an administrator account
	Createsuperuser {
		#[arg(long, value_name = "USERNAME")]
		username: Option<String>,

		/// Non-interactive mode; the password comes from TODO_SUPERUSER_PASSWORD
		#[arg(long)]
		noinput: bool,
	},

	/// Print the API token of a user, creating it if needed
	#[command(name = "drf_create_token")]
	DrfCreateToken {
		#[arg(value_name = "USERNAME")]
		username: String,

		/// Replace an existing token
		#[arg(short, long)]
		reset: bool,
	},

	/// Check settings for problems
	Check {
		/// Apply the production rules regardless of profile
		#[arg(long)]
		deploy: bool,
	},

	/// Display all registered URL patterns
	Showurls {
		/// Show only named URLs
		#[arg(long)]
		names: bool,
	},
}

fn log_level(settings: &Settings, verbosity: u8) -> String {
	match verbosity {
		0 => settings.log_level.clone(),
		1 => "debug".to_string(),
		_ => "trace".to_string(),
	}
}

/// Load settings, install logging and run the selected command
pub async fn execute(cli: Cli) -> CommandResult<()> {
	let settings = Settings::load(&cli.settings_dir)?;
	if let Err(err) = logging::init_with_level(&settings, &log_level(&settings, cli.verbosity)) {
		eprintln!("{}", style(format!("Logging disabled: {}", err)).yellow());
	}
	run(cli.command, settings).await
}

/// Run `command` against already loaded settings
pub async fn run(command: Commands, settings: Settings) -> CommandResult<()> {
	match command {
		Commands::Runserver { address } => runserver(settings, address).await,
		Commands::Migrate { plan } => migrate(&settings, plan).await,
		Commands::Createsuperuser { username, noinput } => {
			createsuperuser(&settings, username, noinput).await
		}
		Commands::DrfCreateToken { username, reset } => {
			let key = create_token(&settings, &username, reset).await?;
			println!("Generated token {} for user {}", style(&key).yellow(), username);
			Ok(())
		}
		Commands::Check { deploy } => check(&settings, deploy),
		Commands::Showurls { names } => showurls(&settings, names).await,
	}
}

async fn runserver(settings: Settings, address: Option<String>) -> CommandResult<()> {
	let address = address.unwrap_or_else(|| settings.bind_address.clone());
	let coordinator = ShutdownCoordinator::new(settings.shutdown_timeout());
	let app = Application::build(settings).await?;

	let signal = coordinator.clone();
	tokio::spawn(async move {
		shutdown_signal().await;
		signal.shutdown();
	});

	println!(
		"{} http://{}/",
		style("Starting server at").green().bold(),
		address
	);
	println!("Quit the server with CONTROL-C.");
	app.serve(&address, coordinator).await?;
	app.close().await;
	Ok(())
}

async fn connect(settings: &Settings) -> CommandResult<DatabaseConnection> {
	Ok(DatabaseConnection::connect(&settings.database_url).await?)
}

/// Apply pending migrations, or list them with `plan`
pub async fn migrate(settings: &Settings, plan: bool) -> CommandResult<()> {
	let conn = connect(settings).await?;
	let migrator = migrator();

	if plan {
		let pending = migrator.plan(&conn).await?;
		println!("{}", style("Planned operations:").cyan().bold());
		if pending.is_empty() {
			println!("  No planned migration operations.");
		}
		for migration in pending {
			println!("  {}", migration.label());
		}
		return Ok(());
	}

	println!("{}", style("Running migrations:").cyan().bold());
	let applied = migrator.migrate(&conn).await?;
	if applied.is_empty() {
		println!("  No migrations to apply.");
	}
	for label in applied {
		println!("  Applying {}... {}", label, style("OK").green());
	}
	conn.close().await;
	Ok(())
}

async fn createsuperuser(
	settings: &Settings,
	username: Option<String>,
	noinput: bool,
) -> CommandResult<()> {
	let username = match username {
		Some(username) => username,
		None if noinput => {
			return Err(CommandError::ExecutionError(
				"--username is required in non-interactive mode".to_string(),
			));
		}
		None => Input::<String>::new()
			.with_prompt("Username")
			.interact_text()?,
	};

	let password = if noinput {
		std::env::var(SUPERUSER_PASSWORD_ENV).map_err(|_| {
			CommandError::ExecutionError(format!(
				"{} must be set in non-interactive mode",
				SUPERUSER_PASSWORD_ENV
			))
		})?
	} else {
		Password::new()
			.with_prompt("Password")
			.with_confirmation("Password (again)", "Error: Your passwords didn't match.")
			.interact()?
	};

	let user = create_superuser(settings, &username, &password).await?;
	println!(
		"{} {}",
		style("Superuser created successfully:").green().bold(),
		style(&user.username).yellow()
	);
	Ok(())
}

/// Migrate and create a staff superuser
pub async fn create_superuser(settings: &Settings, username: &str, password: &str) -> CommandResult<User> {
	let conn = connect(settings).await?;
	migrator().migrate(&conn).await?;
	let user = TokenStore::new(conn)
		.users()
		.create_superuser(username, password)
		.await?;
	Ok(user)
}

/// The token key of `username`, replaced first when `reset` is set
pub async fn create_token(settings: &Settings, username: &str, reset: bool) -> CommandResult<String> {
	let conn = connect(settings).await?;
	migrator().migrate(&conn).await?;
	let tokens = TokenStore::new(conn);

	let user = tokens
		.users()
		.get_by_username(username)
		.await?
		.ok_or_else(|| {
			CommandError::ExecutionError(format!(
				"Cannot create the Token: user {} does not exist",
				username
			))
		})?;
	let token = if reset {
		tokens.regenerate(&user).await?
	} else {
		tokens.get_or_create(&user).await?
	};
	Ok(token.key)
}

/// Validate settings, applying the production rules when `deploy` is set
pub fn check(settings: &Settings, deploy: bool) -> CommandResult<()> {
	let mut checked = settings.clone();
	if deploy {
		checked.profile = Profile::Production;
	}
	checked.validate()?;
	println!(
		"{}",
		style("System check identified no issues (0 silenced).").green()
	);
	Ok(())
}

async fn showurls(settings: &Settings, names_only: bool) -> CommandResult<()> {
	let conn = DatabaseConnection::memory().await?;
	let router = build_router(&conn, settings)?;

	println!("{:<45} {:<30} {}", "URL Pattern", "Name", "Methods");
	println!("{}", "=".repeat(90));
	for route in router.get_routes() {
		if names_only && route.name.is_none() {
			continue;
		}
		let methods: Vec<_> = route.methods.iter().map(|m| m.as_str()).collect();
		println!(
			"{:<45} {:<30} {}",
			route.path,
			route.name.as_deref().unwrap_or("-"),
			methods.join(", ")
		);
	}
	Ok(())
}
