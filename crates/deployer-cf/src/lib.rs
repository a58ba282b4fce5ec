// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cloud Controller v2 client.
//!
//! [`CfClient`] creates and deletes platform user records and grants
//! organization membership and space developer roles. It implements
//! [`deployer_broker_core::PlatformClient`].

mod client;
mod error;

pub use client::CfClient;
pub use error::{CfError, CfErrorBody, USER_TAKEN_CODE};
