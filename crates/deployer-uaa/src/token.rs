// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OAuth2 client-credentials tokens for the broker's UAA client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use deployer_common_http::{retry, RetryConfig};
use deployer_common_secret::SecretString;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::TokenError;
use crate::types::{TokenResponse, UaaErrorBody};

/// Tokens are refreshed this long before UAA says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Lifetime assumed when UAA omits `expires_in`.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(300);

/// Source of bearer tokens for UAA and Cloud Controller requests.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
	async fn access_token(&self) -> Result<SecretString, TokenError>;

	/// Forget a token the server rejected so the next call obtains a new one.
	async fn invalidate(&self) {}
}

/// A fixed token. Used where the token is issued out of band.
pub struct StaticTokenProvider {
	token: SecretString,
}

impl StaticTokenProvider {
	pub fn new(token: impl Into<SecretString>) -> Self {
		Self {
			token: token.into(),
		}
	}
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
	async fn access_token(&self) -> Result<SecretString, TokenError> {
		Ok(self.token.clone())
	}
}

struct CachedToken {
	token: SecretString,
	refresh_at: Instant,
}

/// Fetches tokens with the `client_credentials` grant and caches them.
///
/// Concurrent callers share one refresh; the cache lock is held across the
/// token request.
pub struct ClientCredentialsTokenProvider {
	http_client: Client,
	token_url: String,
	client_id: String,
	client_secret: SecretString,
	retry_config: RetryConfig,
	cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsTokenProvider {
	pub fn new(
		http_client: Client,
		uaa_url: &str,
		client_id: impl Into<String>,
		client_secret: SecretString,
	) -> Self {
		Self {
			http_client,
			token_url: format!("{}/oauth/token", uaa_url.trim_end_matches('/')),
			client_id: client_id.into(),
			client_secret,
			retry_config: RetryConfig::default(),
			cached: Mutex::new(None),
		}
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	#[instrument(skip(self), fields(client_id = %self.client_id))]
	async fn fetch(&self) -> Result<CachedToken, TokenError> {
		let requested_at = Instant::now();
		let response = retry(&self.retry_config, || self.fetch_inner()).await?;

		let lifetime = response
			.expires_in
			.map(Duration::from_secs)
			.unwrap_or(DEFAULT_LIFETIME);
		debug!(expires_in_secs = lifetime.as_secs(), "obtained access token");

		Ok(CachedToken {
			token: SecretString::new(response.access_token),
			refresh_at: requested_at + lifetime.saturating_sub(EXPIRY_MARGIN),
		})
	}

	async fn fetch_inner(&self) -> Result<TokenResponse, TokenError> {
		let response = self
			.http_client
			.post(&self.token_url)
			.basic_auth(&self.client_id, Some(self.client_secret.expose()))
			.header(reqwest::header::ACCEPT, "application/json")
			.form(&[("grant_type", "client_credentials")])
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;

		if !status.is_success() {
			return Err(TokenError::Rejected {
				status: status.as_u16(),
				message: UaaErrorBody::describe(&body),
			});
		}

		serde_json::from_str(&body).map_err(|e| TokenError::InvalidResponse(e.to_string()))
	}
}

#[async_trait]
impl AccessTokenProvider for ClientCredentialsTokenProvider {
	async fn access_token(&self) -> Result<SecretString, TokenError> {
		let mut cached = self.cached.lock().await;

		if let Some(token) = cached.as_ref() {
			if Instant::now() < token.refresh_at {
				return Ok(token.token.clone());
			}
		}

		let fresh = self.fetch().await?;
		let token = fresh.token.clone();
		*cached = Some(fresh);
		Ok(token)
	}

	async fn invalidate(&self) {
		debug!("dropping cached access token");
		*self.cached.lock().await = None;
	}
}
