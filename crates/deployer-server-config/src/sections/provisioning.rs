// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Settings applied to every provisioned account.

use serde::Deserialize;

use crate::error::ConfigError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const DEFAULT_PASSWORD_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
	/// Primary email of every directory user created.
	pub email_address: String,
	pub password_length: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisioningConfigLayer {
	#[serde(default)]
	pub email_address: Option<String>,
	#[serde(default)]
	pub password_length: Option<usize>,
}

impl ProvisioningConfigLayer {
	pub fn merge(&mut self, other: ProvisioningConfigLayer) {
		if other.email_address.is_some() {
			self.email_address = other.email_address;
		}
		if other.password_length.is_some() {
			self.password_length = other.password_length;
		}
	}

	pub fn finalize(self) -> Result<ProvisioningConfig, ConfigError> {
		let email_address = self
			.email_address
			.map(|e| e.trim().to_string())
			.filter(|e| !e.is_empty())
			.ok_or_else(|| {
				ConfigError::missing("provisioning.email_address", "DEPLOYER_BROKER_EMAIL_ADDRESS")
			})?;

		let password_length = self.password_length.unwrap_or(DEFAULT_PASSWORD_LENGTH);
		if password_length < MIN_PASSWORD_LENGTH {
			return Err(ConfigError::InvalidValue {
				key: "provisioning.password_length".to_string(),
				message: format!("{password_length} is shorter than {MIN_PASSWORD_LENGTH}"),
			});
		}

		Ok(ProvisioningConfig {
			email_address,
			password_length,
		})
	}
}
