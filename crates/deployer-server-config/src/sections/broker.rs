// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credentials the platform uses to call the broker.

use deployer_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct BrokerAuthConfig {
	pub username: String,
	pub password: SecretString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerAuthConfigLayer {
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<SecretString>,
}

impl BrokerAuthConfigLayer {
	pub fn merge(&mut self, other: BrokerAuthConfigLayer) {
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
	}

	pub fn finalize(self) -> Result<BrokerAuthConfig, ConfigError> {
		Ok(BrokerAuthConfig {
			username: self
				.username
				.ok_or_else(|| ConfigError::missing("broker.username", "DEPLOYER_BROKER_USERNAME"))?,
			password: self
				.password
				.ok_or_else(|| ConfigError::missing("broker.password", "DEPLOYER_BROKER_PASSWORD"))?,
		})
	}
}
