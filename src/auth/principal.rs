//! Snapshot of the authenticated user as last reported by the backend.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Last-known authenticated principal.
///
/// Only the identifying fields are typed; anything else the backend returns is kept verbatim in
/// [`Principal::attributes`] so the snapshot survives a persist/load cycle unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Principal {
	/// Backend user identifier.
	pub id: u64,
	/// Login e-mail address.
	pub email: String,
	/// Optional username.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Optional given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Optional family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Optional role label.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
	/// Remaining backend-specific fields.
	#[serde(flatten)]
	pub attributes: Map<String, Value>,
}
impl Principal {
	/// Creates a principal with only the identifying fields populated.
	pub fn new(id: u64, email: impl Into<String>) -> Self {
		Self {
			id,
			email: email.into(),
			username: None,
			first_name: None,
			last_name: None,
			role: None,
			attributes: Map::new(),
		}
	}

	/// Sets the role label.
	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.role = Some(role.into());

		self
	}

	/// Returns "first last" when either name is known.
	pub fn display_name(&self) -> Option<String> {
		let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
			.into_iter()
			.flatten()
			.filter(|part| !part.is_empty())
			.collect();

		if parts.is_empty() { None } else { Some(parts.join(" ")) }
	}
}
