// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use deployer_common_http::RetryableError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors obtaining an access token.
#[derive(Debug, Error)]
pub enum TokenError {
	#[error("network error requesting token: {0}")]
	Network(#[from] reqwest::Error),

	#[error("token request rejected with status {status}: {message}")]
	Rejected { status: u16, message: String },

	#[error("invalid token response: {0}")]
	InvalidResponse(String),
}

impl RetryableError for TokenError {
	fn is_retryable(&self) -> bool {
		match self {
			TokenError::Network(e) => e.is_retryable(),
			TokenError::Rejected { .. } | TokenError::InvalidResponse(_) => false,
		}
	}

	fn response_status(&self) -> Option<StatusCode> {
		match self {
			TokenError::Network(e) => e.response_status(),
			TokenError::Rejected { status, .. } => StatusCode::from_u16(*status).ok(),
			TokenError::InvalidResponse(_) => None,
		}
	}
}

/// Errors talking to the UAA SCIM API.
#[derive(Debug, Error)]
pub enum UaaError {
	#[error(transparent)]
	Token(#[from] TokenError),

	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("UAA returned {status}: {message}")]
	Api { status: u16, message: String },

	#[error("invalid response from UAA: {0}")]
	InvalidResponse(String),
}

impl UaaError {
	pub fn status(&self) -> Option<u16> {
		match self {
			UaaError::Api { status, .. } => Some(*status),
			_ => None,
		}
	}
}

impl RetryableError for UaaError {
	fn is_retryable(&self) -> bool {
		match self {
			UaaError::Token(e) => e.is_retryable(),
			UaaError::Network(e) => e.is_retryable(),
			UaaError::Api { .. } | UaaError::InvalidResponse(_) => false,
		}
	}

	fn response_status(&self) -> Option<StatusCode> {
		match self {
			UaaError::Token(e) => e.response_status(),
			UaaError::Network(e) => e.response_status(),
			UaaError::Api { status, .. } => StatusCode::from_u16(*status).ok(),
			UaaError::InvalidResponse(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use deployer_common_http::RetryConfig;

	#[test]
	fn server_errors_are_retryable() {
		let config = RetryConfig::default();
		for status in [429, 500, 502, 503, 504] {
			let err = UaaError::Api {
				status,
				message: String::new(),
			};
			assert!(config.should_retry(&err), "{status} should be retryable");
		}
	}

	#[test]
	fn client_errors_are_not_retryable() {
		let config = RetryConfig::default();
		for status in [400, 401, 403, 404, 409] {
			let err = UaaError::Api {
				status,
				message: String::new(),
			};
			assert!(!config.should_retry(&err), "{status} should not be retryable");
		}
		assert!(!config.should_retry(&UaaError::InvalidResponse("bad json".to_string())));
	}

	#[test]
	fn token_errors_pass_through() {
		let err = UaaError::from(TokenError::Rejected {
			status: 401,
			message: "Bad credentials".to_string(),
		});
		assert!(!RetryConfig::default().should_retry(&err));
		assert_eq!(
			err.to_string(),
			"token request rejected with status 401: Bad credentials"
		);
	}
}
