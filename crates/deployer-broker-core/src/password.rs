// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bootstrap password generation.

use deployer_common_secret::SecretString;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Source of bootstrap passwords.
///
/// Plain closures `Fn(usize) -> String` implement this, which is how tests
/// pin the password to a known value.
pub trait PasswordGenerator: Send + Sync {
	fn generate(&self, length: usize) -> SecretString;
}

/// Alphanumeric passwords from the thread-local CSPRNG.
///
/// 62 symbols give ~5.95 bits per character, so the default length of 32 is
/// ~190 bits. A failing OS entropy source panics inside `rand`; that is a
/// process-level fault, not a provisioning error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPasswordGenerator;

impl PasswordGenerator for RandomPasswordGenerator {
	fn generate(&self, length: usize) -> SecretString {
		let password: String = rand::thread_rng()
			.sample_iter(&Alphanumeric)
			.take(length)
			.map(char::from)
			.collect();
		SecretString::new(password)
	}
}

impl<F> PasswordGenerator for F
where
	F: Fn(usize) -> String + Send + Sync,
{
	fn generate(&self, length: usize) -> SecretString {
		SecretString::new(self(length))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn closure_is_a_generator() {
		let generator = |_: usize| "password".to_string();
		assert_eq!(generator.generate(32).expose(), "password");
	}

	#[test]
	fn consecutive_passwords_differ() {
		let a = RandomPasswordGenerator.generate(32);
		let b = RandomPasswordGenerator.generate(32);
		assert_ne!(a.expose(), b.expose());
	}

	#[test]
	fn zero_length_is_empty() {
		assert!(RandomPasswordGenerator.generate(0).expose().is_empty());
	}

	proptest! {
		#[test]
		fn generates_requested_length(length in 1usize..256) {
			let password = RandomPasswordGenerator.generate(length);
			prop_assert_eq!(password.expose().len(), length);
		}

		#[test]
		fn generates_only_alphanumerics(length in 1usize..128) {
			let password = RandomPasswordGenerator.generate(length);
			prop_assert!(password.expose().chars().all(|c| c.is_ascii_alphanumeric()));
		}
	}
}
