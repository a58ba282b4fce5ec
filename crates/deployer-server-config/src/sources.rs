// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and the environment.

use std::path::PathBuf;

use deployer_common_secret::{load_secret_env, SecretString};
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	BrokerAuthConfigLayer, CfConfigLayer, FugaciousConfigLayer, HttpConfigLayer, LogFormat,
	LoggingConfigLayer, ProvisioningConfigLayer, UaaConfigLayer,
};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/deployer-broker/config.toml";

/// Source precedence levels (higher overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(DEFAULT_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `DEPLOYER_BROKER_<FIELD>`. Secrets may instead be read from
/// the file named by `<NAME>_FILE`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			broker: Some(load_broker_from_env()?),
			uaa: Some(load_uaa_from_env()?),
			cf: Some(load_cf_from_env()),
			fugacious: Some(load_fugacious_from_env()?),
			provisioning: Some(load_provisioning_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	env_parse(name, "u16")
}

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	env_parse(name, "u32")
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	env_parse(name, "usize")
}

fn env_secret(name: &str) -> Result<Option<SecretString>, ConfigError> {
	load_secret_env(name).map_err(|e| ConfigError::Secret(e.to_string()))
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	let port = match env_u16("DEPLOYER_BROKER_PORT")? {
		Some(port) => Some(port),
		None => env_u16("PORT")?,
	};

	Ok(HttpConfigLayer {
		host: env_var("DEPLOYER_BROKER_HOST"),
		port,
	})
}

fn load_broker_from_env() -> Result<BrokerAuthConfigLayer, ConfigError> {
	Ok(BrokerAuthConfigLayer {
		username: env_var("DEPLOYER_BROKER_USERNAME"),
		password: env_secret("DEPLOYER_BROKER_PASSWORD")?,
	})
}

fn load_uaa_from_env() -> Result<UaaConfigLayer, ConfigError> {
	Ok(UaaConfigLayer {
		url: env_var("DEPLOYER_BROKER_UAA_URL"),
		client_id: env_var("DEPLOYER_BROKER_UAA_CLIENT_ID"),
		client_secret: env_secret("DEPLOYER_BROKER_UAA_CLIENT_SECRET")?,
	})
}

fn load_cf_from_env() -> CfConfigLayer {
	CfConfigLayer {
		url: env_var("DEPLOYER_BROKER_CF_URL"),
	}
}

fn load_fugacious_from_env() -> Result<FugaciousConfigLayer, ConfigError> {
	Ok(FugaciousConfigLayer {
		url: env_var("DEPLOYER_BROKER_FUGACIOUS_URL"),
		hours: env_u32("DEPLOYER_BROKER_FUGACIOUS_HOURS")?,
		max_views: env_u32("DEPLOYER_BROKER_FUGACIOUS_MAX_VIEWS")?,
	})
}

fn load_provisioning_from_env() -> Result<ProvisioningConfigLayer, ConfigError> {
	Ok(ProvisioningConfigLayer {
		email_address: env_var("DEPLOYER_BROKER_EMAIL_ADDRESS"),
		password_length: env_usize("DEPLOYER_BROKER_PASSWORD_LENGTH")?,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("DEPLOYER_BROKER_LOG_FORMAT") {
		Some(v) => Some(
			v.parse::<LogFormat>()
				.map_err(|message| ConfigError::InvalidValue {
					key: "DEPLOYER_BROKER_LOG_FORMAT".to_string(),
					message,
				})?,
		),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("DEPLOYER_BROKER_LOG_LEVEL"),
		format,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.uaa.is_none());
	}

	#[test]
	fn missing_toml_file_returns_empty_layer() {
		let layer = TomlSource::new("/nonexistent/config.toml").load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn toml_file_is_parsed_by_section() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[http]
port = 9090

[uaa]
url = "https://uaa.example.com"
client_id = "deployer-broker"

[fugacious]
hours = 4

[logging]
format = "json"
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();

		assert_eq!(layer.http.unwrap().port, Some(9090));
		let uaa = layer.uaa.unwrap();
		assert_eq!(uaa.url.as_deref(), Some("https://uaa.example.com"));
		assert!(uaa.client_secret.is_none());
		assert_eq!(layer.fugacious.unwrap().hours, Some(4));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
	}

	#[test]
	fn malformed_toml_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[http\nport = ").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();

		assert!(matches!(err, ConfigError::TomlParse { .. }));
		assert!(err.to_string().contains(&file.path().display().to_string()));
	}

	#[test]
	fn invalid_numeric_env_is_rejected() {
		std::env::set_var("DEPLOYER_BROKER_TEST_SOURCES_U16", "not-a-port");
		let err = env_u16("DEPLOYER_BROKER_TEST_SOURCES_U16").unwrap_err();
		std::env::remove_var("DEPLOYER_BROKER_TEST_SOURCES_U16");

		assert!(err.to_string().contains("invalid u16 value 'not-a-port'"));
	}

	#[test]
	fn empty_env_is_unset() {
		std::env::set_var("DEPLOYER_BROKER_TEST_SOURCES_EMPTY", "");
		assert_eq!(env_var("DEPLOYER_BROKER_TEST_SOURCES_EMPTY"), None);
		std::env::remove_var("DEPLOYER_BROKER_TEST_SOURCES_EMPTY");
	}
}
