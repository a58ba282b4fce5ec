// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `PUT` and `DELETE /v2/service_instances/{instance_id}`.
//!
//! The orchestration runs on its own task. The request future holds a drop
//! guard for the task's cancellation token, so a caller that disconnects
//! stops the workflow at the next step boundary.

use std::future::Future;

use axum::{
	extract::{rejection::JsonRejection, Path, Query, State},
	http::StatusCode,
	Json,
};
use deployer_broker_core::{
	BrokerError, CancellationToken, DeprovisionDetails, InstanceId, ProvisionDetails,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProvisionRequest {
	#[serde(default)]
	pub service_id: String,
	#[serde(default)]
	pub plan_id: String,
	#[serde(default)]
	pub organization_guid: String,
	#[serde(default)]
	pub space_guid: String,
}

#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
	pub dashboard_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProvisionQuery {
	#[serde(default)]
	pub accepts_incomplete: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeprovisionQuery {
	#[serde(default)]
	pub service_id: String,
	#[serde(default)]
	pub plan_id: String,
	#[serde(default)]
	pub accepts_incomplete: bool,
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
	if value.trim().is_empty() {
		return Err(ApiError::BadRequest(format!("{field} is required")));
	}
	Ok(())
}

fn check_offered(state: &AppState, service_id: &str, plan_id: &str) -> Result<(), ApiError> {
	if !state.catalog.offers(service_id, plan_id) {
		return Err(ApiError::BadRequest(format!(
			"plan {plan_id} of service {service_id} is not offered by this broker"
		)));
	}
	Ok(())
}

/// Run `work` on a separate task, cancelling its token if this future is
/// dropped first.
async fn run_cancellable<T, F, Fut>(work: F) -> Result<T, ApiError>
where
	T: Send + 'static,
	F: FnOnce(CancellationToken) -> Fut,
	Fut: Future<Output = Result<T, BrokerError>> + Send + 'static,
{
	let token = CancellationToken::new();
	let _guard = token.clone().drop_guard();

	let result = tokio::spawn(work(token)).await.map_err(|e| {
		error!(error = %e, "broker task failed");
		ApiError::Internal("broker task failed".to_string())
	})?;

	Ok(result?)
}

#[instrument(skip_all, fields(instance_id = %instance_id))]
pub async fn provision(
	State(state): State<AppState>,
	Path(instance_id): Path<String>,
	Query(query): Query<ProvisionQuery>,
	body: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProvisionResponse>), ApiError> {
	let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

	require("service_id", &body.service_id)?;
	require("plan_id", &body.plan_id)?;
	require("organization_guid", &body.organization_guid)?;
	require("space_guid", &body.space_guid)?;
	check_offered(&state, &body.service_id, &body.plan_id)?;

	let broker = state.broker.clone();
	let instance_id = InstanceId::new(instance_id);
	let details = ProvisionDetails {
		service_id: body.service_id,
		plan_id: body.plan_id,
		organization_guid: body.organization_guid,
		space_guid: body.space_guid,
	};

	let spec = run_cancellable(move |cancel| async move {
		broker
			.provision(&cancel, &instance_id, &details, query.accepts_incomplete)
			.await
	})
	.await?;

	info!("service instance provisioned");
	Ok((
		StatusCode::CREATED,
		Json(ProvisionResponse {
			dashboard_url: spec.dashboard_url,
		}),
	))
}

#[instrument(skip_all, fields(instance_id = %instance_id))]
pub async fn deprovision(
	State(state): State<AppState>,
	Path(instance_id): Path<String>,
	Query(query): Query<DeprovisionQuery>,
) -> Result<Json<Value>, ApiError> {
	require("service_id", &query.service_id)?;
	require("plan_id", &query.plan_id)?;
	check_offered(&state, &query.service_id, &query.plan_id)?;

	let broker = state.broker.clone();
	let instance_id = InstanceId::new(instance_id);
	let details = DeprovisionDetails {
		service_id: query.service_id,
		plan_id: query.plan_id,
	};
	let accepts_incomplete = query.accepts_incomplete;

	run_cancellable(move |cancel| async move {
		broker
			.deprovision(&cancel, &instance_id, &details, accepts_incomplete)
			.await
	})
	.await?;

	info!("service instance deprovisioned");
	Ok(Json(json!({})))
}
