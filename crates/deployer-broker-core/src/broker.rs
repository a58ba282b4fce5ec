// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The provision and deprovision workflows.
//!
//! # Provision
//!
//! 1. Generate a password and build `"<instance id> | <password>"`.
//! 2. Send it through the credential channel and keep the returned link.
//! 3. Create the directory user (user name = instance id).
//! 4. Create the platform account with the directory user's ID.
//! 5. Attach the account to the organization, then to the space.
//!
//! The credential is sent first so that a delivery failure leaves no account
//! behind.
//!
//! # Deprovision
//!
//! 1. Look up the directory user by instance id.
//! 2. Delete the directory user, then the platform account, both by the
//!    resolved ID.
//!
//! # Failures
//!
//! The first collaborator error ends the operation and is returned as is.
//! Earlier steps are not compensated: a failure after the directory user was
//! created leaves that user (and possibly the platform account) in place for
//! an operator to clean up. Concurrent calls for the same instance id are not
//! serialized.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use deployer_common_secret::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::{CredentialSender, IdentityClient, PlatformClient};
use crate::error::BrokerError;
use crate::password::{PasswordGenerator, RandomPasswordGenerator};
use crate::types::{
	BrokerConfig, DeprovisionDetails, DeprovisionServiceSpec, Email, InstanceId, NewDirectoryUser,
	ProvisionDetails, ProvisionedServiceSpec,
};

/// An external call made by one of the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
	SendCredentials,
	CreateDirectoryUser,
	CreatePlatformAccount,
	AttachOrganization,
	AttachSpace,
	LookupDirectoryUser,
	DeleteDirectoryUser,
	DeletePlatformAccount,
}

impl Step {
	pub fn as_str(&self) -> &'static str {
		match self {
			Step::SendCredentials => "send credentials",
			Step::CreateDirectoryUser => "create directory user",
			Step::CreatePlatformAccount => "create platform account",
			Step::AttachOrganization => "attach organization",
			Step::AttachSpace => "attach space",
			Step::LookupDirectoryUser => "look up directory user",
			Step::DeleteDirectoryUser => "delete directory user",
			Step::DeletePlatformAccount => "delete platform account",
		}
	}
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The message handed to the credential channel.
pub fn credential_message(instance_id: &InstanceId, password: &SecretString) -> SecretString {
	SecretString::new(format!("{} | {}", instance_id, password.expose()))
}

/// Orchestrates deployer accounts across the identity service, the platform
/// API and the credential channel.
pub struct DeployerAccountBroker {
	identity: Arc<dyn IdentityClient>,
	platform: Arc<dyn PlatformClient>,
	credentials: Arc<dyn CredentialSender>,
	passwords: Arc<dyn PasswordGenerator>,
	config: BrokerConfig,
}

impl DeployerAccountBroker {
	/// Create a broker that generates random passwords.
	pub fn new(
		identity: Arc<dyn IdentityClient>,
		platform: Arc<dyn PlatformClient>,
		credentials: Arc<dyn CredentialSender>,
		config: BrokerConfig,
	) -> Self {
		Self {
			identity,
			platform,
			credentials,
			passwords: Arc::new(RandomPasswordGenerator),
			config,
		}
	}

	/// Replace the password source.
	pub fn with_password_generator(mut self, generator: impl PasswordGenerator + 'static) -> Self {
		self.passwords = Arc::new(generator);
		self
	}

	pub fn config(&self) -> &BrokerConfig {
		&self.config
	}

	/// Create a deployer account for `instance_id`.
	///
	/// `accepts_incomplete` is accepted for protocol compatibility and ignored;
	/// the account is complete when this returns `Ok`.
	///
	/// `cancel` is checked before each external call, never during one.
	#[instrument(
		name = "broker.provision",
		skip_all,
		fields(
			instance_id = %instance_id,
			org_guid = %details.organization_guid,
			space_guid = %details.space_guid,
		)
	)]
	pub async fn provision(
		&self,
		cancel: &CancellationToken,
		instance_id: &InstanceId,
		details: &ProvisionDetails,
		accepts_incomplete: bool,
	) -> Result<ProvisionedServiceSpec, BrokerError> {
		debug!(accepts_incomplete, "provisioning deployer account");

		let password = self.passwords.generate(self.config.password_length);
		let message = credential_message(instance_id, &password);

		let dashboard_url = run_step(cancel, Step::SendCredentials, || {
			self.credentials.send(&message)
		})
		.await?;
		drop(message);

		let new_user = NewDirectoryUser {
			user_name: instance_id.to_string(),
			password,
			emails: vec![Email::primary(self.config.email_address.clone())],
		};
		let user = run_step(cancel, Step::CreateDirectoryUser, || {
			self.identity.create_user(new_user)
		})
		.await?;

		run_step(cancel, Step::CreatePlatformAccount, || {
			self.platform.create_user(&user.id)
		})
		.await?;

		run_step(cancel, Step::AttachOrganization, || {
			self
				.platform
				.add_user_to_org(&user.id, &details.organization_guid)
		})
		.await?;

		run_step(cancel, Step::AttachSpace, || {
			self.platform.add_user_to_space(&user.id, &details.space_guid)
		})
		.await?;

		info!(user_id = %user.id, "provisioned deployer account");

		Ok(ProvisionedServiceSpec {
			is_async: false,
			dashboard_url,
		})
	}

	/// Delete the deployer account for `instance_id`.
	///
	/// An unknown instance fails with [`BrokerError::NotFound`] before any
	/// delete is attempted, so a second deprovision of the same instance is
	/// never reported as success.
	#[instrument(name = "broker.deprovision", skip_all, fields(instance_id = %instance_id))]
	pub async fn deprovision(
		&self,
		cancel: &CancellationToken,
		instance_id: &InstanceId,
		details: &DeprovisionDetails,
		accepts_incomplete: bool,
	) -> Result<DeprovisionServiceSpec, BrokerError> {
		debug!(
			accepts_incomplete,
			service_id = %details.service_id,
			plan_id = %details.plan_id,
			"deprovisioning deployer account"
		);

		let user = run_step(cancel, Step::LookupDirectoryUser, || {
			self.identity.get_user(instance_id.as_str())
		})
		.await?;

		run_step(cancel, Step::DeleteDirectoryUser, || {
			self.identity.delete_user(&user.id)
		})
		.await?;

		run_step(cancel, Step::DeletePlatformAccount, || {
			self.platform.delete_user(&user.id)
		})
		.await?;

		info!(user_id = %user.id, "deprovisioned deployer account");

		Ok(DeprovisionServiceSpec { is_async: false })
	}
}

async fn run_step<T, F, Fut>(
	cancel: &CancellationToken,
	step: Step,
	call: F,
) -> Result<T, BrokerError>
where
	F: FnOnce() -> Fut,
	Fut: Future<Output = Result<T, BrokerError>>,
{
	if cancel.is_cancelled() {
		warn!(step = %step, "cancelled before step");
		return Err(BrokerError::Cancelled { step });
	}

	debug!(step = %step, "starting step");
	call()
		.await
		.inspect_err(|e| warn!(step = %step, error = %e, "step failed"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{AttachTarget, System};
	use crate::testing::{Call, CallLog, FakeCredentialSender, FakeIdentity, FakePlatform, Operation};
	use crate::types::UserId;

	const LINK: &str = "https://fugacio.us/m/42";

	struct Harness {
		log: CallLog,
		identity: Arc<FakeIdentity>,
		platform: Arc<FakePlatform>,
		sender: Arc<FakeCredentialSender>,
		broker: DeployerAccountBroker,
	}

	fn harness() -> Harness {
		let log = CallLog::default();
		let identity = Arc::new(FakeIdentity::new(log.clone(), "user-guid"));
		let platform = Arc::new(FakePlatform::new(log.clone()));
		let sender = Arc::new(FakeCredentialSender::new(log.clone(), LINK));
		let broker = DeployerAccountBroker::new(
			identity.clone(),
			platform.clone(),
			sender.clone(),
			BrokerConfig {
				email_address: "fake@fake.org".to_string(),
				password_length: 32,
			},
		)
		.with_password_generator(|_: usize| "password".to_string());

		Harness {
			log,
			identity,
			platform,
			sender,
			broker,
		}
	}

	fn details() -> ProvisionDetails {
		ProvisionDetails {
			organization_guid: "org-guid".to_string(),
			space_guid: "space-guid".to_string(),
			..Default::default()
		}
	}

	async fn provision(h: &Harness) -> Result<ProvisionedServiceSpec, BrokerError> {
		h.broker
			.provision(
				&CancellationToken::new(),
				&InstanceId::new("instance-guid"),
				&details(),
				false,
			)
			.await
	}

	async fn deprovision(h: &Harness) -> Result<DeprovisionServiceSpec, BrokerError> {
		h.broker
			.deprovision(
				&CancellationToken::new(),
				&InstanceId::new("instance-guid"),
				&DeprovisionDetails::default(),
				false,
			)
			.await
	}

	mod provision {
		use super::*;

		#[tokio::test]
		async fn returns_a_provision_service_spec() {
			let h = harness();

			let spec = provision(&h).await.unwrap();

			assert!(!spec.is_async);
			assert_eq!(spec.dashboard_url, LINK);
			assert_eq!(
				h.log.calls(),
				vec![
					Call::Send {
						message: "instance-guid | password".to_string()
					},
					Call::CreateDirectoryUser {
						user_name: "instance-guid".to_string(),
						password: "password".to_string(),
						emails: vec![Email::primary("fake@fake.org")],
					},
					Call::CreatePlatformAccount {
						id: UserId::new("user-guid")
					},
					Call::AddUserToOrg {
						id: UserId::new("user-guid"),
						org_guid: "org-guid".to_string()
					},
					Call::AddUserToSpace {
						id: UserId::new("user-guid"),
						space_guid: "space-guid".to_string()
					},
				]
			);
		}

		#[tokio::test]
		async fn sends_credentials_before_touching_any_account() {
			let h = harness();
			provision(&h).await.unwrap();

			let calls = h.log.calls();
			assert!(matches!(calls.first(), Some(Call::Send { .. })));
			assert_eq!(h.log.count(Operation::Send), 1);
		}

		#[tokio::test]
		async fn platform_calls_use_identity_assigned_id() {
			let h = harness();
			provision(&h).await.unwrap();

			let platform_ids: Vec<UserId> = h
				.log
				.calls()
				.into_iter()
				.filter_map(|call| match call {
					Call::CreatePlatformAccount { id }
					| Call::AddUserToOrg { id, .. }
					| Call::AddUserToSpace { id, .. } => Some(id),
					_ => None,
				})
				.collect();

			assert_eq!(platform_ids.len(), 3);
			assert!(platform_ids.iter().all(|id| id.as_str() == "user-guid"));
		}

		#[tokio::test]
		async fn success_leaves_one_user_one_account_and_both_attachments() {
			let h = harness();
			provision(&h).await.unwrap();

			assert_eq!(h.identity.user_count(), 1);
			assert!(h.platform.has_account(&UserId::new("user-guid")));
			assert!(h.platform.in_org(&UserId::new("user-guid"), "org-guid"));
			assert!(h.platform.in_space(&UserId::new("user-guid"), "space-guid"));
		}

		#[tokio::test]
		async fn generated_password_length_comes_from_config() {
			let h = harness();
			let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
			let recorder = seen.clone();
			let broker = h.broker.with_password_generator(move |length: usize| {
				recorder.lock().unwrap().push(length);
				"x".repeat(length)
			});

			broker
				.provision(
					&CancellationToken::new(),
					&InstanceId::new("instance-guid"),
					&details(),
					false,
				)
				.await
				.unwrap();

			assert_eq!(*seen.lock().unwrap(), vec![32]);
		}

		#[tokio::test]
		async fn accepts_incomplete_does_not_change_result() {
			let h = harness();
			let spec = h
				.broker
				.provision(
					&CancellationToken::new(),
					&InstanceId::new("instance-guid"),
					&details(),
					true,
				)
				.await
				.unwrap();
			assert!(!spec.is_async);
		}

		#[tokio::test]
		async fn delivery_failure_creates_no_accounts() {
			let h = harness();
			let failure = BrokerError::delivery_failed("503 Service Unavailable");
			h.sender.fail_with(failure.clone());

			let err = provision(&h).await.unwrap_err();

			assert_eq!(err, failure);
			assert_eq!(h.log.count(Operation::CreateDirectoryUser), 0);
			assert_eq!(h.log.count(Operation::CreatePlatformAccount), 0);
			assert_eq!(h.identity.user_count(), 0);
		}

		#[tokio::test]
		async fn identity_create_failure_stops_before_platform() {
			let h = harness();
			let failure = BrokerError::already_exists(System::Identity, "userName taken");
			h.identity.fail_on(Operation::CreateDirectoryUser, failure.clone());

			let err = provision(&h).await.unwrap_err();

			assert_eq!(err, failure);
			assert!(err.is_conflict());
			assert_eq!(h.log.count(Operation::CreatePlatformAccount), 0);
			assert_eq!(h.log.count(Operation::AddUserToOrg), 0);
			assert_eq!(h.log.count(Operation::AddUserToSpace), 0);
		}

		#[tokio::test]
		async fn platform_create_failure_stops_before_attach() {
			let h = harness();
			let failure = BrokerError::create_failed(System::Platform, "CF-UaaIdTaken");
			h.platform.fail_on(Operation::CreatePlatformAccount, failure.clone());

			let err = provision(&h).await.unwrap_err();

			assert_eq!(err, failure);
			assert_eq!(h.log.count(Operation::AddUserToOrg), 0);
			assert_eq!(h.log.count(Operation::AddUserToSpace), 0);
		}

		#[tokio::test]
		async fn org_attach_failure_stops_before_space() {
			let h = harness();
			let failure = BrokerError::attach_failed(
				System::Platform,
				AttachTarget::Organization("org-guid".to_string()),
				"CF-OrganizationNotFound",
			);
			h.platform.fail_on(Operation::AddUserToOrg, failure.clone());

			let err = provision(&h).await.unwrap_err();

			assert_eq!(err, failure);
			assert_eq!(h.log.count(Operation::AddUserToSpace), 0);
		}

		#[tokio::test]
		async fn mid_sequence_failure_is_not_rolled_back() {
			let h = harness();
			h.platform.fail_on(
				Operation::AddUserToSpace,
				BrokerError::attach_failed(
					System::Platform,
					AttachTarget::Space("space-guid".to_string()),
					"CF-NotAuthorized",
				),
			);

			provision(&h).await.unwrap_err();

			assert_eq!(h.identity.user_count(), 1);
			assert!(h.platform.has_account(&UserId::new("user-guid")));
			assert_eq!(h.log.count(Operation::DeleteDirectoryUser), 0);
			assert_eq!(h.log.count(Operation::DeletePlatformAccount), 0);
		}

		#[tokio::test]
		async fn cancelled_before_start_makes_no_calls() {
			let h = harness();
			let cancel = CancellationToken::new();
			cancel.cancel();

			let err = h
				.broker
				.provision(&cancel, &InstanceId::new("instance-guid"), &details(), false)
				.await
				.unwrap_err();

			assert_eq!(
				err,
				BrokerError::Cancelled {
					step: Step::SendCredentials
				}
			);
			assert!(h.log.calls().is_empty());
		}

		#[tokio::test]
		async fn cancellation_takes_effect_at_next_step_boundary() {
			let h = harness();
			let cancel = CancellationToken::new();
			h.identity.cancel_after(Operation::CreateDirectoryUser, cancel.clone());

			let err = h
				.broker
				.provision(&cancel, &InstanceId::new("instance-guid"), &details(), false)
				.await
				.unwrap_err();

			assert_eq!(
				err,
				BrokerError::Cancelled {
					step: Step::CreatePlatformAccount
				}
			);
			assert_eq!(h.log.count(Operation::CreateDirectoryUser), 1);
			assert_eq!(h.log.count(Operation::CreatePlatformAccount), 0);
		}
	}

	mod deprovision {
		use super::*;

		#[tokio::test]
		async fn returns_a_deprovision_service_spec() {
			let h = harness();
			h.identity.seed_user("instance-guid");
			h.platform.seed_account(&UserId::new("user-guid"));

			let spec = deprovision(&h).await.unwrap();

			assert!(!spec.is_async);
			assert_eq!(
				h.log.calls(),
				vec![
					Call::GetUser {
						user_name: "instance-guid".to_string()
					},
					Call::DeleteDirectoryUser {
						id: UserId::new("user-guid")
					},
					Call::DeletePlatformAccount {
						id: UserId::new("user-guid")
					},
				]
			);
		}

		#[tokio::test]
		async fn deletes_by_resolved_id_not_instance_id() {
			let h = harness();
			h.identity.seed_user("instance-guid");

			deprovision(&h).await.unwrap();

			let deleted: Vec<Call> = h
				.log
				.calls()
				.into_iter()
				.filter(|c| {
					matches!(
						c,
						Call::DeleteDirectoryUser { .. } | Call::DeletePlatformAccount { .. }
					)
				})
				.collect();
			assert_eq!(
				deleted,
				vec![
					Call::DeleteDirectoryUser {
						id: UserId::new("user-guid")
					},
					Call::DeletePlatformAccount {
						id: UserId::new("user-guid")
					},
				]
			);
		}

		#[tokio::test]
		async fn unknown_instance_is_not_found_and_deletes_nothing() {
			let h = harness();

			let err = deprovision(&h).await.unwrap_err();

			assert!(err.is_not_found());
			assert_eq!(h.log.count(Operation::DeleteDirectoryUser), 0);
			assert_eq!(h.log.count(Operation::DeletePlatformAccount), 0);
		}

		#[tokio::test]
		async fn lookup_failure_is_returned_unchanged() {
			let h = harness();
			let failure = BrokerError::lookup_failed(System::Identity, "connection refused");
			h.identity.fail_on(Operation::GetUser, failure.clone());

			let err = deprovision(&h).await.unwrap_err();

			assert_eq!(err, failure);
			assert!(!err.is_not_found());
			assert_eq!(h.log.count(Operation::DeleteDirectoryUser), 0);
		}

		#[tokio::test]
		async fn second_deprovision_is_not_found() {
			let h = harness();
			provision(&h).await.unwrap();

			deprovision(&h).await.unwrap();
			let err = deprovision(&h).await.unwrap_err();

			assert!(err.is_not_found());
			assert_eq!(h.identity.user_count(), 0);
			assert!(!h.platform.has_account(&UserId::new("user-guid")));
		}

		#[tokio::test]
		async fn identity_delete_failure_keeps_platform_account() {
			let h = harness();
			h.identity.seed_user("instance-guid");
			h.platform.seed_account(&UserId::new("user-guid"));
			let failure = BrokerError::delete_failed(System::Identity, "insufficient_scope");
			h.identity.fail_on(Operation::DeleteDirectoryUser, failure.clone());

			let err = deprovision(&h).await.unwrap_err();

			assert_eq!(err, failure);
			assert_eq!(h.log.count(Operation::DeletePlatformAccount), 0);
			assert!(h.platform.has_account(&UserId::new("user-guid")));
		}

		#[tokio::test]
		async fn platform_delete_failure_is_returned_unchanged() {
			let h = harness();
			h.identity.seed_user("instance-guid");
			h.platform.seed_account(&UserId::new("user-guid"));
			let failure = BrokerError::delete_failed(System::Platform, "CF-NotAuthorized");
			h.platform.fail_on(Operation::DeletePlatformAccount, failure.clone());

			let err = deprovision(&h).await.unwrap_err();

			assert_eq!(err, failure);
			assert_eq!(h.identity.user_count(), 0);
			assert!(h.platform.has_account(&UserId::new("user-guid")));
		}

		#[tokio::test]
		async fn cancellation_takes_effect_at_next_step_boundary() {
			let h = harness();
			h.identity.seed_user("instance-guid");
			h.platform.seed_account(&UserId::new("user-guid"));
			let cancel = CancellationToken::new();
			h.identity.cancel_after(Operation::DeleteDirectoryUser, cancel.clone());

			let err = h
				.broker
				.deprovision(
					&cancel,
					&InstanceId::new("instance-guid"),
					&DeprovisionDetails::default(),
					false,
				)
				.await
				.unwrap_err();

			assert_eq!(
				err,
				BrokerError::Cancelled {
					step: Step::DeletePlatformAccount
				}
			);
			assert_eq!(h.identity.user_count(), 0);
			assert_eq!(h.log.count(Operation::DeletePlatformAccount), 0);
			assert!(h.platform.has_account(&UserId::new("user-guid")));
		}
	}

	#[test]
	fn credential_message_joins_instance_and_password() {
		let message = credential_message(
			&InstanceId::new("instance-guid"),
			&SecretString::from("password"),
		);
		assert_eq!(message.expose(), "instance-guid | password");
	}
}
