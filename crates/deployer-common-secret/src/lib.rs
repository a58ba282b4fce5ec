// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper types for the deployer account broker.
//!
//! [`Secret<T>`] wraps a sensitive value so that it is never printed by
//! `Debug`, `Display` or serde serialization, and is zeroized on drop.
//! Generated passwords, credential messages, broker credentials and OAuth
//! client secrets all travel through the broker as [`SecretString`].
//!
//! # Example
//!
//! ```
//! use deployer_common_secret::SecretString;
//!
//! let password = SecretString::new("hunter2".to_string());
//! assert_eq!(format!("{password:?}"), "Secret([REDACTED])");
//! assert_eq!(password.expose(), "hunter2");
//! ```

pub mod env;

use std::fmt;

use zeroize::Zeroize;

pub use env::{load_secret_env, SecretEnvError};

/// Placeholder printed instead of a secret value.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never appear in logs or serialized output.
pub struct Secret<T: Zeroize> {
	inner: T,
}

/// The common case: a secret string.
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	pub fn new(value: T) -> Self {
		Self { inner: value }
	}

	/// Borrow the wrapped value. There is no `Deref`; every exposure is explicit.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl<T: Zeroize + Default> Secret<T> {
	/// Consume the wrapper and return the inner value.
	pub fn into_inner(mut self) -> T {
		std::mem::take(&mut self.inner)
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Secret({REDACTED})")
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Secret<T>
where
	T: Zeroize + serde::Deserialize<'de>,
{
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		T::deserialize(deserializer).map(Secret::new)
	}
}
