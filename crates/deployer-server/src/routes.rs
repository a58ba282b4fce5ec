// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use axum::{
	middleware,
	routing::{get, put},
	Router,
};
use deployer_broker_core::DeployerAccountBroker;

use crate::auth::{api_version_middleware, basic_auth_middleware, BrokerCredentials};
use crate::catalog::{catalog, Catalog};
use crate::handlers::{catalog as catalog_handlers, health, instances};

#[derive(Clone)]
pub struct AppState {
	pub broker: Arc<DeployerAccountBroker>,
	pub catalog: Arc<Catalog>,
}

impl AppState {
	pub fn new(broker: DeployerAccountBroker) -> Self {
		Self {
			broker: Arc::new(broker),
			catalog: Arc::new(catalog()),
		}
	}
}

pub fn create_router(state: AppState, credentials: BrokerCredentials) -> Router {
	let broker_api = Router::new()
		.route("/v2/catalog", get(catalog_handlers::get_catalog))
		.route(
			"/v2/service_instances/{instance_id}",
			put(instances::provision).delete(instances::deprovision),
		)
		.layer(middleware::from_fn(api_version_middleware))
		.layer(middleware::from_fn_with_state(
			credentials,
			basic_auth_middleware,
		));

	Router::new()
		.route("/health", get(health::health))
		.merge(broker_api)
		.with_state(state)
}
