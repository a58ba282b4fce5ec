// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory collaborators that record every call into a shared [`CallLog`].
//!
//! Each fake keeps enough state to behave like the real system across a
//! provision/deprovision cycle: created users can be looked up, deleted users
//! are gone, duplicate creation is a conflict.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deployer_common_secret::SecretString;
use tokio_util::sync::CancellationToken;

use crate::capabilities::{CredentialSender, IdentityClient, PlatformClient};
use crate::error::{BrokerError, System};
use crate::types::{DirectoryUser, Email, NewDirectoryUser, UserId};

/// A recorded collaborator call. Secrets are recorded in plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Send {
		message: String,
	},
	GetUser {
		user_name: String,
	},
	CreateDirectoryUser {
		user_name: String,
		password: String,
		emails: Vec<Email>,
	},
	DeleteDirectoryUser {
		id: UserId,
	},
	CreatePlatformAccount {
		id: UserId,
	},
	DeletePlatformAccount {
		id: UserId,
	},
	AddUserToOrg {
		id: UserId,
		org_guid: String,
	},
	AddUserToSpace {
		id: UserId,
		space_guid: String,
	},
}

impl Call {
	pub fn operation(&self) -> Operation {
		match self {
			Call::Send { .. } => Operation::Send,
			Call::GetUser { .. } => Operation::GetUser,
			Call::CreateDirectoryUser { .. } => Operation::CreateDirectoryUser,
			Call::DeleteDirectoryUser { .. } => Operation::DeleteDirectoryUser,
			Call::CreatePlatformAccount { .. } => Operation::CreatePlatformAccount,
			Call::DeletePlatformAccount { .. } => Operation::DeletePlatformAccount,
			Call::AddUserToOrg { .. } => Operation::AddUserToOrg,
			Call::AddUserToSpace { .. } => Operation::AddUserToSpace,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	Send,
	GetUser,
	CreateDirectoryUser,
	DeleteDirectoryUser,
	CreatePlatformAccount,
	DeletePlatformAccount,
	AddUserToOrg,
	AddUserToSpace,
}

/// Ordered record of calls across all fakes sharing it.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
	calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().unwrap().clone()
	}

	pub fn count(&self, operation: Operation) -> usize {
		self
			.calls
			.lock()
			.unwrap()
			.iter()
			.filter(|call| call.operation() == operation)
			.count()
	}

	fn record(&self, call: Call) {
		self.calls.lock().unwrap().push(call);
	}
}

/// Per-operation failures and cancellation triggers.
#[derive(Default)]
struct Script {
	failures: Mutex<HashMap<Operation, BrokerError>>,
	cancels: Mutex<HashMap<Operation, CancellationToken>>,
}

impl Script {
	fn fail_on(&self, operation: Operation, error: BrokerError) {
		self.failures.lock().unwrap().insert(operation, error);
	}

	fn cancel_after(&self, operation: Operation, token: CancellationToken) {
		self.cancels.lock().unwrap().insert(operation, token);
	}

	fn check(&self, operation: Operation) -> Result<(), BrokerError> {
		match self.failures.lock().unwrap().get(&operation) {
			Some(error) => Err(error.clone()),
			None => Ok(()),
		}
	}

	fn finished(&self, operation: Operation) {
		if let Some(token) = self.cancels.lock().unwrap().get(&operation) {
			token.cancel();
		}
	}
}

/// Directory that assigns the same ID to every user it creates.
pub struct FakeIdentity {
	log: CallLog,
	assigned_id: UserId,
	users: Mutex<HashMap<String, DirectoryUser>>,
	script: Script,
}

impl FakeIdentity {
	pub fn new(log: CallLog, assigned_id: impl Into<String>) -> Self {
		Self {
			log,
			assigned_id: UserId::new(assigned_id),
			users: Mutex::new(HashMap::new()),
			script: Script::default(),
		}
	}

	pub fn fail_on(&self, operation: Operation, error: BrokerError) {
		self.script.fail_on(operation, error);
	}

	/// Cancel `token` once `operation` has completed successfully.
	pub fn cancel_after(&self, operation: Operation, token: CancellationToken) {
		self.script.cancel_after(operation, token);
	}

	/// Add a user without recording a call.
	pub fn seed_user(&self, user_name: &str) {
		self.users.lock().unwrap().insert(
			user_name.to_string(),
			DirectoryUser {
				id: self.assigned_id.clone(),
				user_name: user_name.to_string(),
				emails: Vec::new(),
			},
		);
	}

	pub fn user_count(&self) -> usize {
		self.users.lock().unwrap().len()
	}
}

#[async_trait]
impl IdentityClient for FakeIdentity {
	async fn get_user(&self, user_name: &str) -> Result<DirectoryUser, BrokerError> {
		self.log.record(Call::GetUser {
			user_name: user_name.to_string(),
		});
		self.script.check(Operation::GetUser)?;

		let user = self
			.users
			.lock()
			.unwrap()
			.get(user_name)
			.cloned()
			.ok_or_else(|| BrokerError::not_found(System::Identity, user_name))?;
		self.script.finished(Operation::GetUser);
		Ok(user)
	}

	async fn create_user(&self, user: NewDirectoryUser) -> Result<DirectoryUser, BrokerError> {
		self.log.record(Call::CreateDirectoryUser {
			user_name: user.user_name.clone(),
			password: user.password.expose().clone(),
			emails: user.emails.clone(),
		});
		self.script.check(Operation::CreateDirectoryUser)?;

		let mut users = self.users.lock().unwrap();
		if users.contains_key(&user.user_name) {
			return Err(BrokerError::already_exists(
				System::Identity,
				format!("username {} already in use", user.user_name),
			));
		}
		let created = DirectoryUser {
			id: self.assigned_id.clone(),
			user_name: user.user_name.clone(),
			emails: user.emails,
		};
		users.insert(user.user_name, created.clone());
		drop(users);

		self.script.finished(Operation::CreateDirectoryUser);
		Ok(created)
	}

	async fn delete_user(&self, id: &UserId) -> Result<(), BrokerError> {
		self.log.record(Call::DeleteDirectoryUser { id: id.clone() });
		self.script.check(Operation::DeleteDirectoryUser)?;

		let mut users = self.users.lock().unwrap();
		let before = users.len();
		users.retain(|_, user| &user.id != id);
		if users.len() == before {
			return Err(BrokerError::delete_failed(
				System::Identity,
				format!("user {id} does not exist"),
			));
		}
		drop(users);

		self.script.finished(Operation::DeleteDirectoryUser);
		Ok(())
	}
}

/// Platform that tracks accounts and their org/space memberships.
pub struct FakePlatform {
	log: CallLog,
	accounts: Mutex<HashSet<UserId>>,
	orgs: Mutex<HashSet<(UserId, String)>>,
	spaces: Mutex<HashSet<(UserId, String)>>,
	script: Script,
}

impl FakePlatform {
	pub fn new(log: CallLog) -> Self {
		Self {
			log,
			accounts: Mutex::new(HashSet::new()),
			orgs: Mutex::new(HashSet::new()),
			spaces: Mutex::new(HashSet::new()),
			script: Script::default(),
		}
	}

	pub fn fail_on(&self, operation: Operation, error: BrokerError) {
		self.script.fail_on(operation, error);
	}

	pub fn cancel_after(&self, operation: Operation, token: CancellationToken) {
		self.script.cancel_after(operation, token);
	}

	pub fn seed_account(&self, id: &UserId) {
		self.accounts.lock().unwrap().insert(id.clone());
	}

	pub fn has_account(&self, id: &UserId) -> bool {
		self.accounts.lock().unwrap().contains(id)
	}

	pub fn in_org(&self, id: &UserId, org_guid: &str) -> bool {
		self
			.orgs
			.lock()
			.unwrap()
			.contains(&(id.clone(), org_guid.to_string()))
	}

	pub fn in_space(&self, id: &UserId, space_guid: &str) -> bool {
		self
			.spaces
			.lock()
			.unwrap()
			.contains(&(id.clone(), space_guid.to_string()))
	}
}

#[async_trait]
impl PlatformClient for FakePlatform {
	async fn create_user(&self, id: &UserId) -> Result<(), BrokerError> {
		self
			.log
			.record(Call::CreatePlatformAccount { id: id.clone() });
		self.script.check(Operation::CreatePlatformAccount)?;

		if !self.accounts.lock().unwrap().insert(id.clone()) {
			return Err(BrokerError::already_exists(
				System::Platform,
				format!("user {id} already exists"),
			));
		}
		self.script.finished(Operation::CreatePlatformAccount);
		Ok(())
	}

	async fn delete_user(&self, id: &UserId) -> Result<(), BrokerError> {
		self
			.log
			.record(Call::DeletePlatformAccount { id: id.clone() });
		self.script.check(Operation::DeletePlatformAccount)?;

		self.accounts.lock().unwrap().remove(id);
		self.orgs.lock().unwrap().retain(|(member, _)| member != id);
		self.spaces.lock().unwrap().retain(|(member, _)| member != id);
		self.script.finished(Operation::DeletePlatformAccount);
		Ok(())
	}

	async fn add_user_to_org(&self, id: &UserId, org_guid: &str) -> Result<(), BrokerError> {
		self.log.record(Call::AddUserToOrg {
			id: id.clone(),
			org_guid: org_guid.to_string(),
		});
		self.script.check(Operation::AddUserToOrg)?;

		self
			.orgs
			.lock()
			.unwrap()
			.insert((id.clone(), org_guid.to_string()));
		self.script.finished(Operation::AddUserToOrg);
		Ok(())
	}

	async fn add_user_to_space(&self, id: &UserId, space_guid: &str) -> Result<(), BrokerError> {
		self.log.record(Call::AddUserToSpace {
			id: id.clone(),
			space_guid: space_guid.to_string(),
		});
		self.script.check(Operation::AddUserToSpace)?;

		self
			.spaces
			.lock()
			.unwrap()
			.insert((id.clone(), space_guid.to_string()));
		self.script.finished(Operation::AddUserToSpace);
		Ok(())
	}
}

/// Credential channel that always returns the same link.
pub struct FakeCredentialSender {
	log: CallLog,
	link: String,
	failure: Mutex<Option<BrokerError>>,
}

impl FakeCredentialSender {
	pub fn new(log: CallLog, link: impl Into<String>) -> Self {
		Self {
			log,
			link: link.into(),
			failure: Mutex::new(None),
		}
	}

	pub fn fail_with(&self, error: BrokerError) {
		*self.failure.lock().unwrap() = Some(error);
	}
}

#[async_trait]
impl CredentialSender for FakeCredentialSender {
	async fn send(&self, message: &SecretString) -> Result<String, BrokerError> {
		self.log.record(Call::Send {
			message: message.expose().clone(),
		});
		if let Some(error) = self.failure.lock().unwrap().clone() {
			return Err(error);
		}
		Ok(self.link.clone())
	}
}
