//! OAuth client identity owned by the strategy and the provider's view of owned clients.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Client credentials the strategy presents to the token endpoint.
///
/// Registrations are replaced wholesale on reconciliation and never partially mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistration {
	/// Provider-issued client identifier.
	pub client_id: String,
	/// Provider-issued client secret.
	pub client_secret: TokenSecret,
}
impl ClientRegistration {
	/// Creates a registration from raw credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<TokenSecret>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into() }
	}
}

/// One entry of the provider's owned-client list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
	/// Provider-issued client identifier.
	pub client_id: String,
	/// Display name the client was registered with.
	#[serde(default)]
	pub name: String,
	/// Callback URL the client was registered with.
	#[serde(default)]
	pub redirect_uri: String,
}
impl ClientInfo {
	/// Returns true when the client was registered for this site, either by name or by
	/// callback URL, and is therefore a stale registration from a previous run.
	pub fn belongs_to(&self, site_name: &str, return_url: &Url) -> bool {
		self.name == site_name
			|| self.redirect_uri == return_url.as_str()
			|| Url::parse(&self.redirect_uri).is_ok_and(|url| &url == return_url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_info_matches_by_name_or_redirect() {
		let return_url =
			Url::parse("https://acme.test/callback").expect("Return URL fixture should parse.");
		let by_name = ClientInfo {
			client_id: "1".into(),
			name: "acme".into(),
			redirect_uri: "https://elsewhere.test/cb".into(),
		};
		let by_redirect = ClientInfo {
			client_id: "2".into(),
			name: "other".into(),
			redirect_uri: "https://acme.test/callback".into(),
		};
		let unrelated = ClientInfo {
			client_id: "3".into(),
			name: "other".into(),
			redirect_uri: "https://other.test/callback".into(),
		};

		assert!(by_name.belongs_to("acme", &return_url));
		assert!(by_redirect.belongs_to("acme", &return_url));
		assert!(!unrelated.belongs_to("acme", &return_url));
	}

	#[test]
	fn client_info_tolerates_missing_fields() {
		let info: ClientInfo = serde_json::from_str(r#"{"client_id":"abc","extra":true}"#)
			.expect("Client info should deserialize without optional fields.");

		assert_eq!(info.client_id, "abc");
		assert!(info.name.is_empty());
	}

	#[test]
	fn registration_debug_redacts_secret() {
		let registration = ClientRegistration::new("id", "very-secret");

		assert!(!format!("{registration:?}").contains("very-secret"));
	}
}
