// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Values passed between the broker and its collaborators.

use std::fmt;

use deployer_common_secret::SecretString;

/// Caller-assigned identifier of a service instance.
///
/// Used verbatim as the directory user name, so the same instance always maps
/// to the same directory user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for InstanceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for InstanceId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for InstanceId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

/// ID assigned by the identity service. The platform account reuses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for UserId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for UserId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
	pub value: String,
	pub primary: bool,
}

impl Email {
	pub fn primary(value: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			primary: true,
		}
	}
}

/// A directory user as returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
	pub id: UserId,
	pub user_name: String,
	pub emails: Vec<Email>,
}

/// A directory user to be created.
#[derive(Debug, Clone)]
pub struct NewDirectoryUser {
	pub user_name: String,
	pub password: SecretString,
	pub emails: Vec<Email>,
}

/// Provision request fields from the broker protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionDetails {
	pub service_id: String,
	pub plan_id: String,
	pub organization_guid: String,
	pub space_guid: String,
}

/// Deprovision request fields from the broker protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeprovisionDetails {
	pub service_id: String,
	pub plan_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedServiceSpec {
	/// Always `false`; provisioning completes within the request.
	pub is_async: bool,
	/// Retrieval link returned by the credential channel.
	pub dashboard_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprovisionServiceSpec {
	/// Always `false`; deprovisioning completes within the request.
	pub is_async: bool,
}

/// Static settings injected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
	/// Primary email set on every directory user the broker creates.
	pub email_address: String,
	/// Length of the generated bootstrap password.
	pub password_length: usize,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn instance_id_displays_verbatim() {
		let id = InstanceId::new("instance-guid");
		assert_eq!(id.to_string(), "instance-guid");
		assert_eq!(id.as_str(), "instance-guid");
	}

	#[test]
	fn primary_email_is_primary() {
		let email = Email::primary("fake@fake.org");
		assert_eq!(email.value, "fake@fake.org");
		assert!(email.primary);
	}

	#[test]
	fn new_directory_user_debug_hides_password() {
		let user = NewDirectoryUser {
			user_name: "instance-guid".to_string(),
			password: SecretString::from("hunter2hunter2"),
			emails: vec![],
		};
		assert!(!format!("{user:?}").contains("hunter2hunter2"));
	}
}
