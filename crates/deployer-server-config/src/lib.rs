// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the deployer account broker.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Validation of required settings at startup
//! - Consistent environment variable naming (`DEPLOYER_BROKER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use deployer_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, DEFAULT_CONFIG_PATH,
};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved broker configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub broker: BrokerAuthConfig,
	pub uaa: UaaConfig,
	pub cf: CfConfig,
	pub fugacious: FugaciousConfig,
	pub provisioning: ProvisioningConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`DEPLOYER_BROKER_*`)
/// 2. Config file ([`DEFAULT_CONFIG_PATH`])
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ServerConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	];
	load_from_sources(sources)
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let broker = layer.broker.unwrap_or_default().finalize()?;
	let uaa = layer.uaa.unwrap_or_default().finalize()?;
	let cf = layer.cf.unwrap_or_default().finalize()?;
	let fugacious = layer.fugacious.unwrap_or_default().finalize()?;
	let provisioning = layer.provisioning.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&broker)?;

	info!(
		host = %http.host,
		port = http.port,
		uaa_url = %uaa.url,
		uaa_client_id = %uaa.client_id,
		cf_url = %cf.url,
		fugacious_url = %fugacious.url,
		fugacious_hours = fugacious.hours,
		fugacious_max_views = fugacious.max_views,
		password_length = provisioning.password_length,
		log_format = ?logging.format,
		"broker configuration loaded"
	);

	Ok(ServerConfig {
		http,
		broker,
		uaa,
		cf,
		fugacious,
		provisioning,
		logging,
	})
}

/// Cross-field rules that no single section can check.
fn validate_config(broker: &BrokerAuthConfig) -> Result<(), ConfigError> {
	if broker.username.contains(':') {
		return Err(ConfigError::Validation(
			"DEPLOYER_BROKER_USERNAME must not contain ':', it cannot be sent with HTTP basic auth"
				.to_string(),
		));
	}
	if broker.password.expose().is_empty() {
		return Err(ConfigError::Validation(
			"DEPLOYER_BROKER_PASSWORD must not be empty".to_string(),
		));
	}
	Ok(())
}
