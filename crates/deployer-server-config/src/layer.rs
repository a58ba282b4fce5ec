// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::sections::{
	BrokerAuthConfigLayer, CfConfigLayer, FugaciousConfigLayer, HttpConfigLayer, LoggingConfigLayer,
	ProvisioningConfigLayer, UaaConfigLayer,
};

/// A partial configuration as produced by one source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub broker: Option<BrokerAuthConfigLayer>,
	#[serde(default)]
	pub uaa: Option<UaaConfigLayer>,
	#[serde(default)]
	pub cf: Option<CfConfigLayer>,
	#[serde(default)]
	pub fugacious: Option<FugaciousConfigLayer>,
	#[serde(default)]
	pub provisioning: Option<ProvisioningConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T: Default>(into: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	if let Some(other) = other {
		merge(into.get_or_insert_with(T::default), other);
	}
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.broker, other.broker, BrokerAuthConfigLayer::merge);
		merge_section(&mut self.uaa, other.uaa, UaaConfigLayer::merge);
		merge_section(&mut self.cf, other.cf, CfConfigLayer::merge);
		merge_section(&mut self.fugacious, other.fugacious, FugaciousConfigLayer::merge);
		merge_section(
			&mut self.provisioning,
			other.provisioning,
			ProvisioningConfigLayer::merge,
		);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}
