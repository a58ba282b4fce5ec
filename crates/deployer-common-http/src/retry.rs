// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for transient HTTP failures.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

/// Errors that know whether retrying the request could help.
///
/// Errors carrying an HTTP response status are classified by
/// [`RetryConfig::retryable_statuses`]; `is_retryable` decides for the rest.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;

	/// Status of the non-success response behind this error, if any.
	fn response_status(&self) -> Option<StatusCode> {
		None
	}
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		self.is_timeout() || self.is_connect()
	}

	fn response_status(&self) -> Option<StatusCode> {
		self.status()
	}
}

/// Backoff settings for [`retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts including the first one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	/// Scale each delay by a random factor in `[0.5, 1.5)`.
	pub jitter: bool,
	/// Response statuses [`retry`] treats as transient.
	pub retryable_statuses: Vec<StatusCode>,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
			retryable_statuses: vec![
				StatusCode::REQUEST_TIMEOUT,
				StatusCode::TOO_MANY_REQUESTS,
				StatusCode::INTERNAL_SERVER_ERROR,
				StatusCode::BAD_GATEWAY,
				StatusCode::SERVICE_UNAVAILABLE,
				StatusCode::GATEWAY_TIMEOUT,
			],
		}
	}
}

impl RetryConfig {
	/// A config that makes exactly one attempt.
	pub fn no_retry() -> Self {
		Self {
			max_attempts: 1,
			..Default::default()
		}
	}

	pub fn is_retryable_status(&self, status: StatusCode) -> bool {
		self.retryable_statuses.contains(&status)
	}

	/// Whether another attempt could succeed after `err`.
	pub fn should_retry<E: RetryableError + ?Sized>(&self, err: &E) -> bool {
		match err.response_status() {
			Some(status) => self.is_retryable_status(status),
			None => err.is_retryable(),
		}
	}

	/// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1) as i32;
		let base = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
		let capped = base.min(self.max_delay.as_secs_f64());
		let scaled = if self.jitter {
			capped * (0.5 + fastrand::f64())
		} else {
			capped
		};
		Duration::from_secs_f64(scaled.max(0.0))
	}
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempts in `config` are exhausted. The last error is returned.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, E>
where
	E: RetryableError + std::fmt::Display,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let max_attempts = config.max_attempts.max(1);
	let mut attempt = 1;

	loop {
		match op().await {
			Ok(value) => return Ok(value),
			Err(e) if attempt < max_attempts && config.should_retry(&e) => {
				let delay = config.delay_for(attempt);
				warn!(
					attempt,
					max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = %e,
					"retrying request after transient failure"
				);
				tokio::time::sleep(delay).await;
				attempt += 1;
			}
			Err(e) => return Err(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	#[derive(Debug)]
	struct TestError {
		retryable: bool,
	}

	#[derive(Debug)]
	struct StatusError(StatusCode);

	impl std::fmt::Display for StatusError {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			write!(f, "server returned {}", self.0)
		}
	}

	impl RetryableError for StatusError {
		fn is_retryable(&self) -> bool {
			true
		}

		fn response_status(&self) -> Option<StatusCode> {
			Some(self.0)
		}
	}

	impl std::fmt::Display for TestError {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			write!(f, "test error (retryable: {})", self.retryable)
		}
	}

	impl RetryableError for TestError {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	fn fast_config(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(2),
			jitter: false,
			..Default::default()
		}
	}

	fn counting_op<'a, F>(
		calls: &'a Arc<AtomicU32>,
		outcome: F,
	) -> impl FnMut() -> std::future::Ready<Result<u32, TestError>> + 'a
	where
		F: Fn(u32) -> Result<u32, TestError> + 'a,
	{
		move || {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			std::future::ready(outcome(n))
		}
	}

	#[tokio::test]
	async fn succeeds_on_first_attempt() {
		let calls = Arc::new(AtomicU32::new(0));
		let result = retry(&fast_config(3), counting_op(&calls, |_| Ok(7))).await;
		assert_eq!(result.unwrap(), 7);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn retries_transient_errors_until_success() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op(&calls, |n| {
			if n < 2 {
				Err(TestError { retryable: true })
			} else {
				Ok(n)
			}
		});
		let result = retry(&fast_config(3), op).await;
		assert_eq!(result.unwrap(), 2);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn stops_after_max_attempts() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op(&calls, |_| Err(TestError { retryable: true }));
		let result = retry(&fast_config(2), op).await;
		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn does_not_retry_permanent_errors() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op(&calls, |_| Err(TestError { retryable: false }));
		let result = retry(&fast_config(5), op).await;
		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn no_retry_config_makes_one_attempt() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op(&calls, |_| Err(TestError { retryable: true }));
		let _ = retry(&RetryConfig::no_retry(), op).await;
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn default_statuses_cover_gateway_errors() {
		let config = RetryConfig::default();
		assert!(config.is_retryable_status(StatusCode::BAD_GATEWAY));
		assert!(config.is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
		assert!(!config.is_retryable_status(StatusCode::CONFLICT));
		assert!(!config.is_retryable_status(StatusCode::NOT_FOUND));
	}

	#[tokio::test]
	async fn status_errors_follow_configured_statuses() {
		let calls = Arc::new(AtomicU32::new(0));
		let counter = calls.clone();
		let op = move || {
			counter.fetch_add(1, Ordering::SeqCst);
			std::future::ready(Err::<(), _>(StatusError(StatusCode::SERVICE_UNAVAILABLE)))
		};
		let _ = retry(&fast_config(3), op).await;
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn empty_status_list_disables_status_retries() {
		let calls = Arc::new(AtomicU32::new(0));
		let counter = calls.clone();
		let op = move || {
			counter.fetch_add(1, Ordering::SeqCst);
			std::future::ready(Err::<(), _>(StatusError(StatusCode::SERVICE_UNAVAILABLE)))
		};
		let config = RetryConfig {
			retryable_statuses: vec![],
			..fast_config(3)
		};
		let _ = retry(&config, op).await;
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn custom_status_list_is_honoured() {
		let config = RetryConfig {
			retryable_statuses: vec![StatusCode::CONFLICT],
			..Default::default()
		};
		assert!(config.should_retry(&StatusError(StatusCode::CONFLICT)));
		assert!(!config.should_retry(&StatusError(StatusCode::BAD_GATEWAY)));
		assert!(config.should_retry(&TestError { retryable: true }));
	}

	proptest! {
		#[test]
		fn delay_never_exceeds_jittered_max(attempt in 1u32..20) {
			let config = RetryConfig {
				base_delay: Duration::from_millis(100),
				max_delay: Duration::from_secs(2),
				jitter: true,
				..Default::default()
			};
			let delay = config.delay_for(attempt);
			prop_assert!(delay <= Duration::from_secs(3));
		}

		#[test]
		fn delay_without_jitter_is_monotonic(attempt in 1u32..15) {
			let config = RetryConfig {
				jitter: false,
				..Default::default()
			};
			prop_assert!(config.delay_for(attempt) <= config.delay_for(attempt + 1));
		}
	}
}
