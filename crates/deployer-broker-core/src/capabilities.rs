// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborator capabilities consumed by the broker.
//!
//! Each trait is the minimal set of calls the broker makes. Transport clients
//! and test doubles both implement them; implementations own their own
//! retry, auth and timeout behaviour and must classify failures into the
//! matching [`BrokerError`] variant.

use async_trait::async_trait;
use deployer_common_secret::SecretString;

use crate::error::BrokerError;
use crate::types::{DirectoryUser, NewDirectoryUser, UserId};

/// The identity service holding directory users.
#[async_trait]
pub trait IdentityClient: Send + Sync {
	/// Resolve a user by user name. Absent users are [`BrokerError::NotFound`].
	async fn get_user(&self, user_name: &str) -> Result<DirectoryUser, BrokerError>;

	/// Create a user and return it with its assigned ID.
	async fn create_user(&self, user: NewDirectoryUser) -> Result<DirectoryUser, BrokerError>;

	async fn delete_user(&self, id: &UserId) -> Result<(), BrokerError>;
}

/// The platform API holding accounts and their org/space membership.
#[async_trait]
pub trait PlatformClient: Send + Sync {
	/// Create a platform account whose ID is the directory user's ID.
	async fn create_user(&self, id: &UserId) -> Result<(), BrokerError>;

	async fn delete_user(&self, id: &UserId) -> Result<(), BrokerError>;

	async fn add_user_to_org(&self, id: &UserId, org_guid: &str) -> Result<(), BrokerError>;

	async fn add_user_to_space(&self, id: &UserId, space_guid: &str) -> Result<(), BrokerError>;
}

/// Out-of-band delivery of a message, returning a link to retrieve it.
#[async_trait]
pub trait CredentialSender: Send + Sync {
	async fn send(&self, message: &SecretString) -> Result<String, BrokerError>;
}
