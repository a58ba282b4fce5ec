// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};

use crate::catalog::Catalog;
use crate::routes::AppState;

pub async fn get_catalog(State(state): State<AppState>) -> Json<Catalog> {
	Json(state.catalog.as_ref().clone())
}
