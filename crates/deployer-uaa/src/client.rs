// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! UAA SCIM `/Users` client.

use std::sync::Arc;

use async_trait::async_trait;
use deployer_broker_core::{
	BrokerError, DirectoryUser, IdentityClient, NewDirectoryUser, System, UserId,
};
use deployer_common_http::{retry, RetryConfig};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use crate::error::UaaError;
use crate::token::AccessTokenProvider;
use crate::types::{ScimCreateUser, ScimEmail, ScimListResponse, ScimUser, UaaErrorBody};

/// Build a SCIM filter matching `userName` exactly.
///
/// Double quotes and backslashes in `user_name` are escaped so the value
/// cannot terminate the string literal.
pub fn scim_filter(user_name: &str) -> String {
	let mut escaped = String::with_capacity(user_name.len());
	for c in user_name.chars() {
		if c == '"' || c == '\\' {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	format!("userName eq \"{escaped}\"")
}

/// Client for the UAA directory.
///
/// Lookups and deletes are retried on transient failures. `POST /Users` is
/// sent once: a retried create could observe its own earlier success as a
/// conflict.
#[derive(Clone)]
pub struct UaaClient {
	http_client: Client,
	base_url: String,
	tokens: Arc<dyn AccessTokenProvider>,
	retry_config: RetryConfig,
}

impl UaaClient {
	pub fn new(http_client: Client, base_url: &str, tokens: Arc<dyn AccessTokenProvider>) -> Self {
		Self {
			http_client,
			base_url: base_url.trim_end_matches('/').to_string(),
			tokens,
			retry_config: RetryConfig::default(),
		}
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Find users whose `userName` equals `user_name`.
	#[instrument(skip(self))]
	pub async fn find_users(&self, user_name: &str) -> Result<Vec<DirectoryUser>, UaaError> {
		let filter = scim_filter(user_name);
		let filter = filter.as_str();
		let list: ScimListResponse = retry(&self.retry_config, || async move {
			let request = self
				.http_client
				.get(format!("{}/Users", self.base_url))
				.query(&[("filter", filter)]);
			let response = self.send(request).await?;
			parse_json(response).await
		})
		.await?;

		debug!(count = list.resources.len(), "user lookup completed");
		Ok(list.resources.into_iter().map(DirectoryUser::from).collect())
	}

	#[instrument(skip(self, user), fields(user_name = %user.user_name))]
	pub async fn create(&self, user: &NewDirectoryUser) -> Result<DirectoryUser, UaaError> {
		let body = ScimCreateUser {
			user_name: &user.user_name,
			password: user.password.expose(),
			emails: user.emails.iter().map(ScimEmail::from).collect(),
		};
		let request = self
			.http_client
			.post(format!("{}/Users", self.base_url))
			.json(&body);
		let response = self.send(request).await?;
		let created: ScimUser = parse_json(response).await?;

		debug!(user_id = %created.id, "created directory user");
		Ok(created.into())
	}

	#[instrument(skip(self), fields(user_id = %id))]
	pub async fn delete(&self, id: &UserId) -> Result<(), UaaError> {
		retry(&self.retry_config, || async move {
			let request = self
				.http_client
				.delete(format!("{}/Users/{}", self.base_url, id))
				.header("If-Match", "*");
			self.send(request).await.map(drop)
		})
		.await?;

		debug!("deleted directory user");
		Ok(())
	}

	/// Send with the bearer token and turn non-2xx responses into
	/// [`UaaError::Api`].
	///
	/// A 401 drops the cached token and replays the request once with a new
	/// one.
	async fn send(&self, request: RequestBuilder) -> Result<Response, UaaError> {
		let replay = request.try_clone();
		let mut response = self.send_authorized(request).await?;

		if response.status() == StatusCode::UNAUTHORIZED {
			if let Some(replay) = replay {
				warn!("UAA rejected access token, retrying with a new one");
				self.tokens.invalidate().await;
				response = self.send_authorized(replay).await?;
			}
		}

		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}

		let body = response.text().await.unwrap_or_default();
		let message = UaaErrorBody::describe(&body);
		error!(status = status.as_u16(), message = %message, "UAA request failed");
		Err(UaaError::Api {
			status: status.as_u16(),
			message,
		})
	}

	async fn send_authorized(&self, request: RequestBuilder) -> Result<Response, UaaError> {
		let token = self.tokens.access_token().await?;
		let response = request
			.bearer_auth(token.expose())
			.header(reqwest::header::ACCEPT, "application/json")
			.send()
			.await?;
		Ok(response)
	}
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, UaaError> {
	let body = response.text().await?;
	serde_json::from_str(&body).map_err(|e| UaaError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl IdentityClient for UaaClient {
	async fn get_user(&self, user_name: &str) -> Result<DirectoryUser, BrokerError> {
		let users = self
			.find_users(user_name)
			.await
			.map_err(|e| BrokerError::lookup_failed(System::Identity, e.to_string()))?;

		users
			.into_iter()
			.next()
			.ok_or_else(|| BrokerError::not_found(System::Identity, user_name))
	}

	async fn create_user(&self, user: NewDirectoryUser) -> Result<DirectoryUser, BrokerError> {
		self.create(&user).await.map_err(|e| match e.status() {
			Some(409) => BrokerError::already_exists(System::Identity, e.to_string()),
			_ => BrokerError::create_failed(System::Identity, e.to_string()),
		})
	}

	async fn delete_user(&self, id: &UserId) -> Result<(), BrokerError> {
		self
			.delete(id)
			.await
			.map_err(|e| BrokerError::delete_failed(System::Identity, e.to_string()))
	}
}
