// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use deployer_broker_core::{AttachTarget, BrokerError, PlatformClient, System, UserId};
use deployer_common_http::{retry, RetryConfig};
use deployer_uaa::AccessTokenProvider;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::error::CfError;

#[derive(Debug, Serialize)]
struct CreateUserRequest<'a> {
	guid: &'a str,
}

/// Cloud Controller v2 client.
///
/// The PUT and DELETE calls are idempotent and retried on transient
/// failures; `POST /v2/users` is sent once.
///
/// Identifiers are appended to the base URL as single percent-encoded path
/// segments, so a GUID can never address a different resource.
#[derive(Clone)]
pub struct CfClient {
	http_client: Client,
	base_url: Url,
	tokens: Arc<dyn AccessTokenProvider>,
	retry_config: RetryConfig,
}

impl CfClient {
	pub fn new(
		http_client: Client,
		base_url: &str,
		tokens: Arc<dyn AccessTokenProvider>,
	) -> Result<Self, CfError> {
		let base_url =
			Url::parse(base_url).map_err(|e| CfError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
		if base_url.cannot_be_a_base() {
			return Err(CfError::InvalidBaseUrl(base_url.to_string()));
		}

		Ok(Self {
			http_client,
			base_url,
			tokens,
			retry_config: RetryConfig::default(),
		})
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	#[instrument(skip(self), fields(user_id = %id))]
	pub async fn create(&self, id: &UserId) -> Result<(), CfError> {
		let request = self
			.http_client
			.post(self.endpoint(&["v2", "users"])?)
			.json(&CreateUserRequest { guid: id.as_str() });
		self.send(request).await?;
		debug!("created platform user");
		Ok(())
	}

	#[instrument(skip(self), fields(user_id = %id))]
	pub async fn delete(&self, id: &UserId) -> Result<(), CfError> {
		let url = self.endpoint(&["v2", "users", id.as_str()])?;
		retry(&self.retry_config, || {
			let request = self
				.http_client
				.delete(url.clone())
				.query(&[("async", "false")]);
			self.send(request)
		})
		.await?;
		debug!("deleted platform user");
		Ok(())
	}

	/// `PUT /v2/organizations/{org}/users/{id}`
	#[instrument(skip(self), fields(user_id = %id))]
	pub async fn associate_org_user(&self, id: &UserId, org_guid: &str) -> Result<(), CfError> {
		let url = self.endpoint(&["v2", "organizations", org_guid, "users", id.as_str()])?;
		self.put(&url).await?;
		debug!("added user to organization");
		Ok(())
	}

	/// `PUT /v2/spaces/{space}/developers/{id}`
	#[instrument(skip(self), fields(user_id = %id))]
	pub async fn associate_space_developer(
		&self,
		id: &UserId,
		space_guid: &str,
	) -> Result<(), CfError> {
		let url = self.endpoint(&["v2", "spaces", space_guid, "developers", id.as_str()])?;
		self.put(&url).await?;
		debug!("added user to space as developer");
		Ok(())
	}

	/// The base URL with `segments` appended.
	///
	/// Empty, `.` and `..` segments are rejected: the URL parser would drop
	/// or resolve them instead of encoding them.
	fn endpoint(&self, segments: &[&str]) -> Result<Url, CfError> {
		if let Some(bad) = segments
			.iter()
			.find(|segment| matches!(**segment, "" | "." | ".."))
		{
			return Err(CfError::InvalidId((*bad).to_string()));
		}

		let mut url = self.base_url.clone();
		url
			.path_segments_mut()
			.map_err(|()| CfError::InvalidBaseUrl(self.base_url.to_string()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	async fn put(&self, url: &Url) -> Result<(), CfError> {
		retry(&self.retry_config, || {
			self.send(self.http_client.put(url.clone()))
		})
		.await
	}

	/// Send with the bearer token. A 401 drops the cached token and replays
	/// the request once with a new one.
	async fn send(&self, request: RequestBuilder) -> Result<(), CfError> {
		let replay = request.try_clone();
		let mut response = self.send_authorized(request).await?;

		if response.status() == StatusCode::UNAUTHORIZED {
			if let Some(replay) = replay {
				warn!("Cloud Controller rejected access token, retrying with a new one");
				self.tokens.invalidate().await;
				response = self.send_authorized(replay).await?;
			}
		}

		let status = response.status();
		if status.is_success() {
			return Ok(());
		}

		let body = response.text().await.unwrap_or_default();
		let err = CfError::from_response(status.as_u16(), &body);
		error!(error = %err, "Cloud Controller request failed");
		Err(err)
	}

	async fn send_authorized(&self, request: RequestBuilder) -> Result<Response, CfError> {
		let token = self.tokens.access_token().await?;
		let response = request
			.bearer_auth(token.expose())
			.header(reqwest::header::ACCEPT, "application/json")
			.send()
			.await?;
		Ok(response)
	}
}

#[async_trait]
impl PlatformClient for CfClient {
	async fn create_user(&self, id: &UserId) -> Result<(), BrokerError> {
		self.create(id).await.map_err(|e| {
			if e.is_user_taken() {
				BrokerError::already_exists(System::Platform, e.to_string())
			} else {
				BrokerError::create_failed(System::Platform, e.to_string())
			}
		})
	}

	async fn delete_user(&self, id: &UserId) -> Result<(), BrokerError> {
		self
			.delete(id)
			.await
			.map_err(|e| BrokerError::delete_failed(System::Platform, e.to_string()))
	}

	async fn add_user_to_org(&self, id: &UserId, org_guid: &str) -> Result<(), BrokerError> {
		self.associate_org_user(id, org_guid).await.map_err(|e| {
			BrokerError::attach_failed(
				System::Platform,
				AttachTarget::Organization(org_guid.to_string()),
				e.to_string(),
			)
		})
	}

	async fn add_user_to_space(&self, id: &UserId, space_guid: &str) -> Result<(), BrokerError> {
		self
			.associate_space_developer(id, space_guid)
			.await
			.map_err(|e| {
				BrokerError::attach_failed(
					System::Platform,
					AttachTarget::Space(space_guid.to_string()),
					e.to_string(),
				)
			})
	}
}
