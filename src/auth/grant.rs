//! Token-endpoint grants and the user profiles they unlock.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token bundle returned by the token endpoint, plus the authorization code it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
	/// Bearer token for profile and API calls.
	pub access_token: TokenSecret,
	/// Refresh token, issued for permanent-duration grants.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime of the access token in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Token type reported by the provider (usually `bearer`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Scopes granted, as reported by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Authorization code the grant was exchanged from.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	/// Provider fields not modeled above.
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl AccessGrant {
	/// Records the authorization code the grant was exchanged from.
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());

		self
	}
}

/// Provider-defined profile of the authenticated user.
///
/// Fields are kept as raw JSON because the provider owns their shape; the grant that
/// unlocked the profile is attached as `access` before the profile reaches the host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Raw provider fields.
	#[serde(flatten)]
	pub fields: JsonMap<String, JsonValue>,
	/// Grant used to fetch the profile.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access: Option<AccessGrant>,
}
impl UserProfile {
	/// Wraps raw provider fields.
	pub fn new(fields: JsonMap<String, JsonValue>) -> Self {
		Self { fields, access: None }
	}

	/// Attaches the grant that unlocked this profile.
	pub fn with_access(mut self, grant: AccessGrant) -> Self {
		self.access = Some(grant);

		self
	}

	/// Looks up a raw provider field.
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.fields.get(key)
	}

	/// Provider user identifier, when present.
	pub fn id(&self) -> Option<&JsonValue> {
		self.get("id")
	}

	/// Serializes the profile, including `access`, into a JSON value.
	pub fn to_json(&self) -> serde_json::Result<JsonValue> {
		serde_json::to_value(self)
	}
}
