// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential channel settings.

use serde::Deserialize;

use super::parse_http_url;
use crate::error::ConfigError;

const DEFAULT_URL: &str = "https://fugacio.us";
const DEFAULT_HOURS: u32 = 24;
const DEFAULT_MAX_VIEWS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FugaciousConfig {
	pub url: String,
	/// Hours the message stays retrievable.
	pub hours: u32,
	/// Views before the message is destroyed.
	pub max_views: u32,
}

impl Default for FugaciousConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
			hours: DEFAULT_HOURS,
			max_views: DEFAULT_MAX_VIEWS,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FugaciousConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub hours: Option<u32>,
	#[serde(default)]
	pub max_views: Option<u32>,
}

impl FugaciousConfigLayer {
	pub fn merge(&mut self, other: FugaciousConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.hours.is_some() {
			self.hours = other.hours;
		}
		if other.max_views.is_some() {
			self.max_views = other.max_views;
		}
	}

	pub fn finalize(self) -> Result<FugaciousConfig, ConfigError> {
		let url = match self.url {
			Some(url) => parse_http_url("fugacious.url", &url)?,
			None => DEFAULT_URL.to_string(),
		};
		let hours = self.hours.unwrap_or(DEFAULT_HOURS);
		let max_views = self.max_views.unwrap_or(DEFAULT_MAX_VIEWS);

		if hours == 0 {
			return Err(ConfigError::InvalidValue {
				key: "fugacious.hours".to_string(),
				message: "must be at least 1".to_string(),
			});
		}
		if max_views == 0 {
			return Err(ConfigError::InvalidValue {
				key: "fugacious.max_views".to_string(),
				message: "must be at least 1".to_string(),
			});
		}

		Ok(FugaciousConfig {
			url,
			hours,
			max_views,
		})
	}
}
