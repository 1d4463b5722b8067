//! `manage`: runserver, migrate, createsuperuser, drf_create_token, check,
//! showurls

use clap::Parser;
use console::style;
use std::process::ExitCode;
use todo_web::commands::{Cli, execute};

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	match execute(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			let err = anyhow::Error::from(err);
			eprintln!("{}", style(format!("Error: {:#}", err)).red().bold());
			ExitCode::FAILURE
		}
	}
}
