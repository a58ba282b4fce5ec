// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Failure taxonomy shared by the broker and its collaborators.
//!
//! Collaborators classify their own failures into a [`BrokerError`]; the
//! broker returns the first one it sees without wrapping it, so the protocol
//! layer can map each variant to a status code.

use std::fmt;

use crate::broker::Step;

/// External system a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum System {
	Identity,
	Platform,
	CredentialChannel,
}

impl fmt::Display for System {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			System::Identity => "identity service",
			System::Platform => "platform API",
			System::CredentialChannel => "credential channel",
		};
		f.write_str(name)
	}
}

/// What an attach call tried to attach the account to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachTarget {
	Organization(String),
	Space(String),
}

impl fmt::Display for AttachTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AttachTarget::Organization(guid) => write!(f, "organization {guid}"),
			AttachTarget::Space(guid) => write!(f, "space {guid}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
	/// The directory has no user with this name.
	#[error("{system} has no user named {user_name}")]
	NotFound { system: System, user_name: String },

	/// The system could not be queried.
	#[error("{system} lookup failed: {message}")]
	LookupFailed { system: System, message: String },

	#[error("{system} refused to create account: {message}")]
	CreateFailed {
		system: System,
		message: String,
		/// The account already exists, e.g. a reused instance identifier.
		already_exists: bool,
	},

	#[error("{system} refused to attach account to {target}: {message}")]
	AttachFailed {
		system: System,
		target: AttachTarget,
		message: String,
	},

	#[error("{system} refused to delete account: {message}")]
	DeleteFailed { system: System, message: String },

	#[error("credential delivery failed: {message}")]
	DeliveryFailed { message: String },

	/// The caller gave up before the step started. No call was made for it.
	#[error("operation cancelled before {step}")]
	Cancelled { step: Step },
}

impl BrokerError {
	pub fn not_found(system: System, user_name: impl Into<String>) -> Self {
		Self::NotFound {
			system,
			user_name: user_name.into(),
		}
	}

	pub fn lookup_failed(system: System, message: impl Into<String>) -> Self {
		Self::LookupFailed {
			system,
			message: message.into(),
		}
	}

	pub fn create_failed(system: System, message: impl Into<String>) -> Self {
		Self::CreateFailed {
			system,
			message: message.into(),
			already_exists: false,
		}
	}

	pub fn already_exists(system: System, message: impl Into<String>) -> Self {
		Self::CreateFailed {
			system,
			message: message.into(),
			already_exists: true,
		}
	}

	pub fn attach_failed(system: System, target: AttachTarget, message: impl Into<String>) -> Self {
		Self::AttachFailed {
			system,
			target,
			message: message.into(),
		}
	}

	pub fn delete_failed(system: System, message: impl Into<String>) -> Self {
		Self::DeleteFailed {
			system,
			message: message.into(),
		}
	}

	pub fn delivery_failed(message: impl Into<String>) -> Self {
		Self::DeliveryFailed {
			message: message.into(),
		}
	}

	/// True when the instance has no directory user.
	pub fn is_not_found(&self) -> bool {
		matches!(self, BrokerError::NotFound { .. })
	}

	/// True when creation failed because the account already exists.
	pub fn is_conflict(&self) -> bool {
		matches!(
			self,
			BrokerError::CreateFailed {
				already_exists: true,
				..
			}
		)
	}

	/// The external system the failure came from, if any.
	pub fn system(&self) -> Option<System> {
		match self {
			BrokerError::NotFound { system, .. }
			| BrokerError::LookupFailed { system, .. }
			| BrokerError::CreateFailed { system, .. }
			| BrokerError::AttachFailed { system, .. }
			| BrokerError::DeleteFailed { system, .. } => Some(*system),
			BrokerError::DeliveryFailed { .. } => Some(System::CredentialChannel),
			BrokerError::Cancelled { .. } => None,
		}
	}
}
