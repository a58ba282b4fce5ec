// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deployer account service broker binary.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use deployer_server::{build_broker, create_router, AppState, BrokerCredentials};
use deployer_server_config::{LogFormat, ServerConfig};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service broker that provisions deployer accounts.
#[derive(Parser, Debug)]
#[command(
	name = "deployer-account-broker",
	about = "Service broker that provisions deployer accounts",
	version
)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/deployer-broker/config.toml)
	#[arg(long, env = "DEPLOYER_BROKER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

/// Load `env_file` (or `.env` from the working directory) into the process
/// environment, then parse `argv`. Loading first lets `env = ...` arguments
/// see values from the file.
fn load_env_and_parse<I, T>(env_file: Option<&Path>, argv: I) -> Args
where
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
{
	if let Some(path) = env_file {
		let _ = dotenvy::from_path(path);
	} else {
		let _ = dotenvy::dotenv();
	}
	Args::parse_from(argv)
}

fn init_tracing(config: &ServerConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = load_env_and_parse(None, std::env::args_os());

	if let Some(Command::Version) = args.command {
		println!("deployer-account-broker {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	let config = match args.config {
		Some(path) => deployer_server_config::load_config_with_file(path)?,
		None => deployer_server_config::load_config()?,
	};

	init_tracing(&config);

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		"starting deployer-account-broker"
	);

	let broker = build_broker(&config)?;
	let app = create_router(AppState::new(broker), BrokerCredentials::from(&config))
		.layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	tracing::info!("server shutdown complete");
	Ok(())
}
