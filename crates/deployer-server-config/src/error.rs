// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("missing required setting {key} (set {env})")]
	Missing { key: &'static str, env: &'static str },

	#[error("invalid configuration: {0}")]
	Validation(String),

	#[error("failed to load secret: {0}")]
	Secret(String),
}

impl ConfigError {
	pub(crate) fn missing(key: &'static str, env: &'static str) -> Self {
		ConfigError::Missing { key, env }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_names_key_and_variable() {
		let err = ConfigError::missing("uaa.url", "DEPLOYER_BROKER_UAA_URL");
		assert_eq!(
			err.to_string(),
			"missing required setting uaa.url (set DEPLOYER_BROKER_UAA_URL)"
		);
	}
}
