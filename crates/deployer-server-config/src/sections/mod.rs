// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a partial `*ConfigLayer` that sources
//! produce and merge, and a resolved `*Config`.

mod broker;
mod cf;
mod fugacious;
mod http;
mod logging;
mod provisioning;
mod uaa;

pub use broker::{BrokerAuthConfig, BrokerAuthConfigLayer};
pub use cf::{CfConfig, CfConfigLayer};
pub use fugacious::{FugaciousConfig, FugaciousConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use provisioning::{ProvisioningConfig, ProvisioningConfigLayer, MIN_PASSWORD_LENGTH};
pub use uaa::{UaaConfig, UaaConfigLayer};

use crate::error::ConfigError;

/// Require `value` to be an absolute http(s) URL.
pub(crate) fn parse_http_url(key: &str, value: &str) -> Result<String, ConfigError> {
	let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
		key: key.to_string(),
		message: format!("'{value}' is not a URL: {e}"),
	})?;
	if !matches!(parsed.scheme(), "http" | "https") {
		return Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: format!("'{value}' must use http or https"),
		});
	}
	Ok(value.trim_end_matches('/').to_string())
}
