// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The broker's catalog: one service with one plan.

use serde::Serialize;

pub const SERVICE_ID: &str = "b8d6c2a4-3f1e-4c55-9a07-6e2d4f8a1c93";
pub const SERVICE_NAME: &str = "deployer-account";
pub const PLAN_ID: &str = "0f4e7a2b-91c6-4d38-b5e2-7c1a9d3e6f58";
pub const PLAN_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
	pub services: Vec<Service>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
	pub id: String,
	pub name: String,
	pub description: String,
	pub bindable: bool,
	pub plan_updateable: bool,
	pub tags: Vec<String>,
	pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
	pub id: String,
	pub name: String,
	pub description: String,
	pub free: bool,
}

pub fn catalog() -> Catalog {
	Catalog {
		services: vec![Service {
			id: SERVICE_ID.to_string(),
			name: SERVICE_NAME.to_string(),
			description: "Platform account for deploying applications to a single space".to_string(),
			bindable: false,
			plan_updateable: false,
			tags: vec!["deployer".to_string(), "account".to_string()],
			plans: vec![Plan {
				id: PLAN_ID.to_string(),
				name: PLAN_NAME.to_string(),
				description: "A space developer account whose password is delivered as a one-time link"
					.to_string(),
				free: true,
			}],
		}],
	}
}

impl Catalog {
	/// True when `plan_id` is a plan of `service_id`.
	pub fn offers(&self, service_id: &str, plan_id: &str) -> bool {
		self
			.services
			.iter()
			.filter(|s| s.id == service_id)
			.any(|s| s.plans.iter().any(|p| p.id == plan_id))
	}
}
