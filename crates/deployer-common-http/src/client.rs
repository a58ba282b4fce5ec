// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Creates a new HTTP client with the standard broker User-Agent header.
///
/// The User-Agent format is: `deployer-account-broker/{version}`
pub fn new_client() -> Result<Client, reqwest::Error> {
	builder().build()
}

/// Creates a new HTTP client builder with the standard User-Agent header.
///
/// Use this when you need to customize the client (e.g., disable redirects).
///
/// # Example
/// ```ignore
/// let client = deployer_common_http::builder()
///     .redirect(reqwest::redirect::Policy::none())
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with a custom timeout and the standard User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).build()
}

/// Returns the standard User-Agent string.
pub fn user_agent() -> String {
	format!("deployer-account-broker/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 2);
		assert_eq!(parts[0], "deployer-account-broker");
		assert!(!parts[1].is_empty());
	}

	#[test]
	fn client_with_timeout_builds() {
		assert!(new_client_with_timeout(Duration::from_secs(5)).is_ok());
	}
}
