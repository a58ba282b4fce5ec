// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request guards for the `/v2` routes: HTTP basic auth and the broker API
//! version header.

use axum::{
	extract::{Request, State},
	http::header,
	middleware::Next,
	response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use deployer_common_secret::SecretString;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ApiError;

pub const API_VERSION_HEADER: &str = "X-Broker-API-Version";
pub const SUPPORTED_MAJOR_VERSION: u32 = 2;

/// The username and password the platform presents.
#[derive(Debug, Clone)]
pub struct BrokerCredentials {
	pub username: String,
	pub password: SecretString,
}

impl BrokerCredentials {
	pub fn new(username: impl Into<String>, password: SecretString) -> Self {
		Self {
			username: username.into(),
			password,
		}
	}

	/// Compare both fields in constant time for equal-length inputs.
	fn matches(&self, username: &str, password: &str) -> bool {
		let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
		let pass_ok = self.password.expose().as_bytes().ct_eq(password.as_bytes());
		(user_ok & pass_ok).into()
	}
}

fn decode_basic(value: &str) -> Option<(String, String)> {
	let encoded = value.strip_prefix("Basic ")?.trim();
	let decoded = STANDARD.decode(encoded).ok()?;
	let decoded = String::from_utf8(decoded).ok()?;
	let (username, password) = decoded.split_once(':')?;
	Some((username.to_string(), password.to_string()))
}

pub async fn basic_auth_middleware(
	State(credentials): State<BrokerCredentials>,
	request: Request,
	next: Next,
) -> Result<Response, ApiError> {
	let auth_header = request
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|h| h.to_str().ok());

	let Some(auth_value) = auth_header else {
		warn!("broker auth failed: missing Authorization header");
		return Err(ApiError::Unauthorized);
	};

	let Some((username, password)) = decode_basic(auth_value) else {
		warn!("broker auth failed: malformed basic credentials");
		return Err(ApiError::Unauthorized);
	};

	if credentials.matches(&username, &password) {
		Ok(next.run(request).await)
	} else {
		warn!("broker auth failed: invalid credentials");
		Err(ApiError::Unauthorized)
	}
}

/// Reject requests whose `X-Broker-API-Version` is missing or not 2.x.
pub async fn api_version_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
	let version = request
		.headers()
		.get(API_VERSION_HEADER)
		.and_then(|h| h.to_str().ok())
		.map(str::to_string);

	let Some(version) = version else {
		warn!("request without broker API version header");
		return Err(ApiError::PreconditionFailed(format!(
			"{API_VERSION_HEADER} header is required"
		)));
	};

	let major = version
		.split('.')
		.next()
		.and_then(|m| m.trim().parse::<u32>().ok());
	if major != Some(SUPPORTED_MAJOR_VERSION) {
		warn!(version = %version, "unsupported broker API version");
		return Err(ApiError::PreconditionFailed(format!(
			"{version}, expected {SUPPORTED_MAJOR_VERSION}.x"
		)));
	}

	Ok(next.run(request).await)
}
