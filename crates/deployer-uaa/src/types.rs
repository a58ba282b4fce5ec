// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! UAA wire types.

use deployer_broker_core::{DirectoryUser, Email, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
	pub access_token: String,
	#[serde(default)]
	pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ScimEmail {
	pub value: String,
	#[serde(default)]
	pub primary: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScimCreateUser<'a> {
	pub user_name: &'a str,
	pub password: &'a str,
	pub emails: Vec<ScimEmail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScimUser {
	pub id: String,
	pub user_name: String,
	#[serde(default)]
	pub emails: Vec<ScimEmail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScimListResponse {
	#[serde(default)]
	pub resources: Vec<ScimUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UaaErrorBody {
	pub error: Option<String>,
	pub error_description: Option<String>,
	pub message: Option<String>,
}

impl UaaErrorBody {
	/// Best human-readable message, falling back to the raw body.
	pub fn describe(body: &str) -> String {
		match serde_json::from_str::<UaaErrorBody>(body) {
			Ok(parsed) => parsed
				.error_description
				.or(parsed.message)
				.or(parsed.error)
				.unwrap_or_else(|| body.to_string()),
			Err(_) => body.to_string(),
		}
	}
}

impl From<ScimUser> for DirectoryUser {
	fn from(user: ScimUser) -> Self {
		DirectoryUser {
			id: UserId::new(user.id),
			user_name: user.user_name,
			emails: user
				.emails
				.into_iter()
				.map(|e| Email {
					value: e.value,
					primary: e.primary,
				})
				.collect(),
		}
	}
}

impl From<&Email> for ScimEmail {
	fn from(email: &Email) -> Self {
		ScimEmail {
			value: email.value.clone(),
			primary: email.primary,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn list_response_ignores_paging_fields() {
		let body = r#"{
			"resources": [],
			"startIndex": 1,
			"itemsPerPage": 100,
			"totalResults": 0,
			"schemas": ["urn:scim:schemas:core:1.0"]
		}"#;
		let parsed: ScimListResponse = serde_json::from_str(body).unwrap();
		assert!(parsed.resources.is_empty());
	}

	#[test]
	fn scim_user_maps_to_directory_user() {
		let body = r#"{
			"id": "user-guid",
			"userName": "instance-guid",
			"emails": [{"value": "fake@fake.org", "primary": true}]
		}"#;
		let user: DirectoryUser = serde_json::from_str::<ScimUser>(body).unwrap().into();
		assert_eq!(user.id.as_str(), "user-guid");
		assert_eq!(user.user_name, "instance-guid");
		assert_eq!(user.emails, vec![Email::primary("fake@fake.org")]);
	}

	#[test]
	fn create_body_is_camel_case() {
		let body = ScimCreateUser {
			user_name: "instance-guid",
			password: "pw",
			emails: vec![ScimEmail {
				value: "fake@fake.org".to_string(),
				primary: true,
			}],
		};
		let json = serde_json::to_value(&body).unwrap();
		assert_eq!(json["userName"], "instance-guid");
		assert_eq!(json["emails"][0]["primary"], true);
	}

	#[test]
	fn describe_prefers_error_description() {
		let body = r#"{"error":"scim_resource_already_exists","error_description":"Username already in use: instance-guid"}"#;
		assert_eq!(
			UaaErrorBody::describe(body),
			"Username already in use: instance-guid"
		);
		assert_eq!(UaaErrorBody::describe("plain text"), "plain text");
	}
}
