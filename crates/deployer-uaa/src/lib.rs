// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! UAA client for the deployer account broker.
//!
//! Two pieces:
//!
//! - [`ClientCredentialsTokenProvider`] obtains and caches an OAuth2 access
//!   token for the broker's own UAA client. The Cloud Controller client uses
//!   the same provider through [`AccessTokenProvider`].
//! - [`UaaClient`] manages directory users through the SCIM `/Users`
//!   endpoints and implements [`deployer_broker_core::IdentityClient`].

mod client;
mod error;
mod token;
mod types;

pub use client::{scim_filter, UaaClient};
pub use error::{TokenError, UaaError};
pub use token::{AccessTokenProvider, ClientCredentialsTokenProvider, StaticTokenProvider};
