// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from the environment.
//!
//! A secret named `FOO` is read from `FOO` directly, or from the file named by
//! `FOO_FILE` when `FOO` is unset. The file form is what container platforms
//! use for mounted secrets.

use std::path::PathBuf;

use crate::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file {path} for {name}: {source}")]
	FileRead {
		name: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("both {name} and {name}_FILE are set")]
	Ambiguous { name: String },
}

/// Load a secret from `name` or `name_FILE`.
///
/// Returns `Ok(None)` when neither is set or the value is empty.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let direct = std::env::var(name).ok().filter(|v| !v.is_empty());
	let file_var = format!("{name}_FILE");
	let file = std::env::var(&file_var).ok().filter(|v| !v.is_empty());

	match (direct, file) {
		(Some(_), Some(_)) => Err(SecretEnvError::Ambiguous {
			name: name.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => read_secret_file(name, PathBuf::from(path)),
		(None, None) => Ok(None),
	}
}

fn read_secret_file(name: &str, path: PathBuf) -> Result<Option<SecretString>, SecretEnvError> {
	let content = std::fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
		name: name.to_string(),
		path: path.clone(),
		source,
	})?;

	let trimmed = content.trim_end_matches(['\n', '\r']).to_string();
	if trimmed.is_empty() {
		return Ok(None);
	}
	Ok(Some(SecretString::new(trimmed)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	// Each test uses its own variable name; the process environment is shared
	// between test threads.

	#[test]
	fn unset_returns_none() {
		let result = load_secret_env("DEPLOYER_TEST_SECRET_UNSET").unwrap();
		assert!(result.is_none());
	}

	#[test]
	fn direct_value_is_loaded() {
		std::env::set_var("DEPLOYER_TEST_SECRET_DIRECT", "direct-value");
		let result = load_secret_env("DEPLOYER_TEST_SECRET_DIRECT").unwrap();
		assert_eq!(result.unwrap().expose(), "direct-value");
		std::env::remove_var("DEPLOYER_TEST_SECRET_DIRECT");
	}

	#[test]
	fn file_value_is_loaded_and_trimmed() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();
		std::env::set_var("DEPLOYER_TEST_SECRET_VIA_FILE_FILE", file.path());

		let result = load_secret_env("DEPLOYER_TEST_SECRET_VIA_FILE").unwrap();
		assert_eq!(result.unwrap().expose(), "from-file");
		std::env::remove_var("DEPLOYER_TEST_SECRET_VIA_FILE_FILE");
	}

	#[test]
	fn missing_file_is_an_error() {
		std::env::set_var(
			"DEPLOYER_TEST_SECRET_MISSING_FILE",
			"/nonexistent/deployer/secret",
		);
		let result = load_secret_env("DEPLOYER_TEST_SECRET_MISSING");
		assert!(matches!(result, Err(SecretEnvError::FileRead { .. })));
		std::env::remove_var("DEPLOYER_TEST_SECRET_MISSING_FILE");
	}

	#[test]
	fn both_set_is_ambiguous() {
		std::env::set_var("DEPLOYER_TEST_SECRET_BOTH", "a");
		std::env::set_var("DEPLOYER_TEST_SECRET_BOTH_FILE", "/tmp/b");
		let result = load_secret_env("DEPLOYER_TEST_SECRET_BOTH");
		assert!(matches!(result, Err(SecretEnvError::Ambiguous { .. })));
		std::env::remove_var("DEPLOYER_TEST_SECRET_BOTH");
		std::env::remove_var("DEPLOYER_TEST_SECRET_BOTH_FILE");
	}
}
