// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Service broker HTTP API for deployer accounts.
//!
//! Serves the catalog, provision and deprovision endpoints of the service
//! broker protocol (v2) on top of [`deployer_broker_core::DeployerAccountBroker`].
//! Binding endpoints are not served; the single service is not bindable.

pub mod app;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod routes;

pub use app::{build_broker, StartupError};
pub use auth::BrokerCredentials;
pub use catalog::{catalog, Catalog, Plan, Service, PLAN_ID, SERVICE_ID};
pub use error::ApiError;
pub use routes::{create_router, AppState};
