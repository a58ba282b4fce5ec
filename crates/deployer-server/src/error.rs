// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use deployer_broker_core::BrokerError;
use serde_json::json;

/// Errors returned by the broker API, rendered as protocol responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("unauthorized")]
	Unauthorized,
	#[error("bad request: {0}")]
	BadRequest(String),
	#[error("unsupported broker API version: {0}")]
	PreconditionFailed(String),
	#[error("instance already exists")]
	Conflict,
	#[error("instance does not exist")]
	Gone,
	#[error("internal error: {0}")]
	Internal(String),
}

impl From<BrokerError> for ApiError {
	fn from(e: BrokerError) -> Self {
		if e.is_conflict() {
			ApiError::Conflict
		} else if e.is_not_found() {
			ApiError::Gone
		} else {
			ApiError::Internal(e.to_string())
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			ApiError::Unauthorized => {
				let mut response =
					(StatusCode::UNAUTHORIZED, Json(json!({"description": "unauthorized"})))
						.into_response();
				response.headers_mut().insert(
					header::WWW_AUTHENTICATE,
					HeaderValue::from_static("Basic realm=\"deployer-account-broker\""),
				);
				return response;
			}
			ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"description": msg})),
			ApiError::PreconditionFailed(msg) => {
				(StatusCode::PRECONDITION_FAILED, json!({"description": msg}))
			}
			ApiError::Conflict => (StatusCode::CONFLICT, json!({})),
			ApiError::Gone => (StatusCode::GONE, json!({})),
			ApiError::Internal(msg) => (
				StatusCode::INTERNAL_SERVER_ERROR,
				json!({"description": msg}),
			),
		};

		(status, Json(body)).into_response()
	}
}
