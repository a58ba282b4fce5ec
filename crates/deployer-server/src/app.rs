// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wiring configuration into the broker and its collaborators.

use std::sync::Arc;
use std::time::Duration;

use deployer_broker_core::{BrokerConfig, DeployerAccountBroker};
use deployer_cf::{CfClient, CfError};
use deployer_fugacious::{FugaciousClient, FugaciousError, MessageOptions};
use deployer_server_config::ServerConfig;
use deployer_uaa::{AccessTokenProvider, ClientCredentialsTokenProvider, UaaClient};
use thiserror::Error;
use tracing::info;

use crate::auth::BrokerCredentials;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StartupError {
	#[error("failed to build HTTP client: {0}")]
	HttpClient(#[from] reqwest::Error),

	#[error("failed to configure platform client: {0}")]
	PlatformApi(#[from] CfError),

	#[error("failed to configure credential channel: {0}")]
	CredentialChannel(#[from] FugaciousError),
}

/// Build the broker with UAA, Cloud Controller and Fugacious clients.
///
/// The UAA and Cloud Controller clients share one token provider.
pub fn build_broker(config: &ServerConfig) -> Result<DeployerAccountBroker, StartupError> {
	let http_client = deployer_common_http::new_client_with_timeout(REQUEST_TIMEOUT)?;

	let tokens: Arc<dyn AccessTokenProvider> = Arc::new(ClientCredentialsTokenProvider::new(
		http_client.clone(),
		&config.uaa.url,
		config.uaa.client_id.clone(),
		config.uaa.client_secret.clone(),
	));

	let identity = UaaClient::new(http_client.clone(), &config.uaa.url, tokens.clone());
	let platform = CfClient::new(http_client, &config.cf.url, tokens)?;
	let credentials = FugaciousClient::new(
		&config.fugacious.url,
		MessageOptions {
			hours: config.fugacious.hours,
			max_views: config.fugacious.max_views,
		},
	)?;

	info!(
		uaa_url = %config.uaa.url,
		cf_url = %config.cf.url,
		fugacious_url = %config.fugacious.url,
		"collaborators configured"
	);

	Ok(DeployerAccountBroker::new(
		Arc::new(identity),
		Arc::new(platform),
		Arc::new(credentials),
		BrokerConfig {
			email_address: config.provisioning.email_address.clone(),
			password_length: config.provisioning.password_length,
		},
	))
}

impl From<&ServerConfig> for BrokerCredentials {
	fn from(config: &ServerConfig) -> Self {
		BrokerCredentials::new(config.broker.username.clone(), config.broker.password.clone())
	}
}
