// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! UAA endpoint and the broker's own OAuth client.

use deployer_common_secret::SecretString;
use serde::Deserialize;

use super::parse_http_url;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct UaaConfig {
	pub url: String,
	pub client_id: String,
	pub client_secret: SecretString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UaaConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub client_secret: Option<SecretString>,
}

impl UaaConfigLayer {
	pub fn merge(&mut self, other: UaaConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
	}

	pub fn finalize(self) -> Result<UaaConfig, ConfigError> {
		let url = self
			.url
			.ok_or_else(|| ConfigError::missing("uaa.url", "DEPLOYER_BROKER_UAA_URL"))?;

		Ok(UaaConfig {
			url: parse_http_url("uaa.url", &url)?,
			client_id: self
				.client_id
				.ok_or_else(|| ConfigError::missing("uaa.client_id", "DEPLOYER_BROKER_UAA_CLIENT_ID"))?,
			client_secret: self.client_secret.ok_or_else(|| {
				ConfigError::missing("uaa.client_secret", "DEPLOYER_BROKER_UAA_CLIENT_SECRET")
			})?,
		})
	}
}
