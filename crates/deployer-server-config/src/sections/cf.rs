// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cloud Controller endpoint.

use serde::Deserialize;

use super::parse_http_url;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfConfig {
	pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CfConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl CfConfigLayer {
	pub fn merge(&mut self, other: CfConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> Result<CfConfig, ConfigError> {
		let url = self
			.url
			.ok_or_else(|| ConfigError::missing("cf.url", "DEPLOYER_BROKER_CF_URL"))?;
		Ok(CfConfig {
			url: parse_http_url("cf.url", &url)?,
		})
	}
}
