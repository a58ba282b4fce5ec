// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fugacious client.
//!
//! Fugacious stores a message that can be viewed a limited number of times
//! within a limited number of hours. Creating a message answers with a
//! redirect to the message page; that URL is the retrieval link.

use std::time::Duration;

use async_trait::async_trait;
use deployer_broker_core::{BrokerError, CredentialSender};
use deployer_common_secret::SecretString;
use reqwest::{redirect, Client};
use thiserror::Error;
use tracing::{debug, error, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://fugacio.us";
pub const DEFAULT_HOURS: u32 = 24;
pub const DEFAULT_MAX_VIEWS: u32 = 1;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FugaciousError {
	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(#[from] url::ParseError),

	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("fugacious returned {status}")]
	Status { status: u16 },

	#[error("fugacious response had no usable Location header")]
	MissingLocation,
}

/// Message lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOptions {
	pub hours: u32,
	pub max_views: u32,
}

impl Default for MessageOptions {
	fn default() -> Self {
		Self {
			hours: DEFAULT_HOURS,
			max_views: DEFAULT_MAX_VIEWS,
		}
	}
}

#[derive(Debug, Clone)]
pub struct FugaciousClient {
	http_client: Client,
	base_url: Url,
	options: MessageOptions,
}

impl FugaciousClient {
	/// Create a client for the service at `base_url`.
	///
	/// Builds its own HTTP client because redirects must not be followed.
	pub fn new(base_url: &str, options: MessageOptions) -> Result<Self, FugaciousError> {
		let http_client = deployer_common_http::builder()
			.redirect(redirect::Policy::none())
			.timeout(REQUEST_TIMEOUT)
			.build()?;
		let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;

		Ok(Self {
			http_client,
			base_url,
			options,
		})
	}

	pub fn options(&self) -> MessageOptions {
		self.options
	}

	/// Store `body` and return its retrieval link.
	///
	/// Sent once; a retry could store the message twice.
	#[instrument(skip(self, body), fields(hours = self.options.hours, max_views = self.options.max_views))]
	pub async fn create_message(&self, body: &SecretString) -> Result<String, FugaciousError> {
		let endpoint = self.base_url.join("m")?;
		let hours = self.options.hours.to_string();
		let max_views = self.options.max_views.to_string();

		let response = self
			.http_client
			.post(endpoint)
			.form(&[
				("m[body]", body.expose().as_str()),
				("m[hours]", hours.as_str()),
				("m[max_views]", max_views.as_str()),
			])
			.send()
			.await?;

		let status = response.status();
		if !(status.is_redirection() || status.is_success()) {
			error!(status = status.as_u16(), "fugacious rejected message");
			return Err(FugaciousError::Status {
				status: status.as_u16(),
			});
		}

		let location = response
			.headers()
			.get(reqwest::header::LOCATION)
			.and_then(|value| value.to_str().ok())
			.filter(|value| !value.is_empty())
			.ok_or(FugaciousError::MissingLocation)?;
		let link = self.base_url.join(location)?;

		debug!("stored credential message");
		Ok(link.to_string())
	}
}

#[async_trait]
impl CredentialSender for FugaciousClient {
	async fn send(&self, message: &SecretString) -> Result<String, BrokerError> {
		self
			.create_message(message)
			.await
			.map_err(|e| BrokerError::delivery_failed(e.to_string()))
	}
}
