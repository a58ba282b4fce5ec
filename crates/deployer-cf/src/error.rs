// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use deployer_common_http::RetryableError;
use deployer_uaa::TokenError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Cloud Controller error code for `CF-UaaIdTaken`.
pub const USER_TAKEN_CODE: i64 = 20002;

/// Error payload returned by the v2 API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CfErrorBody {
	#[serde(default)]
	pub code: Option<i64>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub error_code: Option<String>,
}

impl CfErrorBody {
	pub fn parse(body: &str) -> Option<Self> {
		serde_json::from_str(body).ok()
	}
}

impl fmt::Display for CfErrorBody {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (&self.error_code, &self.description) {
			(Some(code), Some(description)) => write!(f, "{code}: {description}"),
			(Some(code), None) => f.write_str(code),
			(None, Some(description)) => f.write_str(description),
			(None, None) => f.write_str("no error details"),
		}
	}
}

#[derive(Debug, Error)]
pub enum CfError {
	#[error("invalid Cloud Controller URL: {0}")]
	InvalidBaseUrl(String),

	#[error("invalid identifier {0:?}")]
	InvalidId(String),

	#[error(transparent)]
	Token(#[from] TokenError),

	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("Cloud Controller returned {status}: {message}")]
	Api {
		status: u16,
		code: Option<i64>,
		message: String,
	},
}

impl CfError {
	pub(crate) fn from_response(status: u16, body: &str) -> Self {
		match CfErrorBody::parse(body) {
			Some(parsed) => CfError::Api {
				status,
				code: parsed.code,
				message: parsed.to_string(),
			},
			None => CfError::Api {
				status,
				code: None,
				message: body.to_string(),
			},
		}
	}

	/// The user record already exists.
	pub fn is_user_taken(&self) -> bool {
		match self {
			CfError::Api { status: 409, .. } => true,
			CfError::Api {
				status: 400,
				code: Some(code),
				..
			} => *code == USER_TAKEN_CODE,
			_ => false,
		}
	}
}

impl RetryableError for CfError {
	fn is_retryable(&self) -> bool {
		match self {
			CfError::Token(e) => e.is_retryable(),
			CfError::Network(e) => e.is_retryable(),
			CfError::InvalidBaseUrl(_) | CfError::InvalidId(_) | CfError::Api { .. } => false,
		}
	}

	fn response_status(&self) -> Option<StatusCode> {
		match self {
			CfError::Token(e) => e.response_status(),
			CfError::Network(e) => e.response_status(),
			CfError::Api { status, .. } => StatusCode::from_u16(*status).ok(),
			CfError::InvalidBaseUrl(_) | CfError::InvalidId(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use deployer_common_http::RetryConfig;

	#[test]
	fn error_body_is_folded_into_message() {
		let err = CfError::from_response(
			400,
			r#"{"code":20002,"description":"The UAA ID is taken: user-guid","error_code":"CF-UaaIdTaken"}"#,
		);
		assert_eq!(
			err.to_string(),
			"Cloud Controller returned 400: CF-UaaIdTaken: The UAA ID is taken: user-guid"
		);
		assert!(err.is_user_taken());
	}

	#[test]
	fn other_bad_requests_are_not_user_taken() {
		let err = CfError::from_response(
			400,
			r#"{"code":1001,"description":"Request invalid","error_code":"CF-MessageParseError"}"#,
		);
		assert!(!err.is_user_taken());
	}

	#[test]
	fn conflict_is_user_taken() {
		assert!(CfError::from_response(409, "").is_user_taken());
	}

	#[test]
	fn unparseable_body_is_kept_verbatim() {
		let err = CfError::from_response(502, "<html>Bad Gateway</html>");
		assert_eq!(
			err.to_string(),
			"Cloud Controller returned 502: <html>Bad Gateway</html>"
		);
		assert!(RetryConfig::default().should_retry(&err));
	}
}
