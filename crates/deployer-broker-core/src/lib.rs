// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deployer account provisioning.
//!
//! A deployer account is a directory user in the identity service plus a
//! platform account with the same ID, attached to one organization and one
//! space. The bootstrap password is never returned to the caller; it goes out
//! through a credential channel that hands back a one-time retrieval link.
//!
//! [`DeployerAccountBroker`] sequences the calls to the three collaborators:
//!
//! - [`IdentityClient`]: look up, create and delete directory users
//! - [`PlatformClient`]: create and delete platform accounts, attach them to
//!   organizations and spaces
//! - [`CredentialSender`]: deliver a message and return a retrieval link
//!
//! Every collaborator error is a [`BrokerError`] and is returned to the
//! caller unchanged. No step is retried and nothing is rolled back.

pub mod broker;
pub mod capabilities;
pub mod error;
pub mod password;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use broker::{credential_message, DeployerAccountBroker, Step};
pub use capabilities::{CredentialSender, IdentityClient, PlatformClient};
pub use error::{AttachTarget, BrokerError, System};
pub use password::{PasswordGenerator, RandomPasswordGenerator};
pub use types::{
	BrokerConfig, DeprovisionDetails, DeprovisionServiceSpec, DirectoryUser, Email, InstanceId,
	NewDirectoryUser, ProvisionDetails, ProvisionedServiceSpec, UserId,
};

pub use tokio_util::sync::CancellationToken;
