//! OPSkins endpoint layout and the catalogue of provider calls made by the strategy.
//!
//! [`ProviderEndpoints`] holds the three roots the provider exposes (the `api` host used for
//! client management and profiles, the authorize page, and the token endpoint) so tests and
//! staging deployments can point the strategy at a mock server. [`ProviderCall`] names every
//! request the strategy issues and resolves it to a concrete URL.

// self
use crate::{_prelude::*, error::ConfigError};

/// Production API root for client management and profile calls.
pub const API_BASE: &str = "https://api.opskins.com";
/// Version segment appended to every API interface path.
pub const API_VERSION: &str = "v1";
/// Production authorize page.
pub const AUTHORIZE_URL: &str = "https://oauth.opskins.com/v1/authorize";
/// Production token endpoint.
pub const TOKEN_URL: &str = "https://oauth.opskins.com/v1/access_token";

/// Calls the strategy issues against the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderCall {
	/// `IOAuth/GetOwnedClientList`.
	ListClients,
	/// `IOAuth/CreateClient`.
	CreateClient,
	/// `IOAuth/DeleteClient`.
	DeleteClient,
	/// Token endpoint with `grant_type=authorization_code`.
	ExchangeCode,
	/// Token endpoint with `grant_type=refresh_token`.
	RefreshToken,
	/// `IUser/GetProfile`.
	FetchProfile,
	/// Authorize redirect (and the callback it produces).
	Authorize,
}
impl ProviderCall {
	/// Interface path below the API root, for calls served by the `api` host.
	pub const fn interface(self) -> Option<&'static str> {
		match self {
			ProviderCall::ListClients => Some("IOAuth/GetOwnedClientList"),
			ProviderCall::CreateClient => Some("IOAuth/CreateClient"),
			ProviderCall::DeleteClient => Some("IOAuth/DeleteClient"),
			ProviderCall::FetchProfile => Some("IUser/GetProfile"),
			ProviderCall::ExchangeCode | ProviderCall::RefreshToken | ProviderCall::Authorize =>
				None,
		}
	}

	/// Human-readable action used in error messages.
	pub const fn action(self) -> &'static str {
		match self {
			ProviderCall::ListClients => "get owned client list",
			ProviderCall::CreateClient => "create a client",
			ProviderCall::DeleteClient => "delete a client",
			ProviderCall::ExchangeCode => "exchange the authorization code",
			ProviderCall::RefreshToken => "refresh the access token",
			ProviderCall::FetchProfile => "get user profile",
			ProviderCall::Authorize => "authorize the user",
		}
	}
}
impl Display for ProviderCall {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.action())
	}
}

/// Endpoint roots used by a strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
	/// API root; always stored with a trailing slash so interface paths join below it.
	pub api_base: Url,
	/// Authorize page the user-agent is redirected to.
	pub authorization: Url,
	/// Token endpoint for code exchanges and refreshes.
	pub token: Url,
}
impl ProviderEndpoints {
	/// Parses the three endpoint roots.
	pub fn parse(api_base: &str, authorization: &str, token: &str) -> Result<Self, ConfigError> {
		let mut api_base = Url::parse(api_base)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "api", source })?;

		if !api_base.path().ends_with('/') {
			let path = format!("{}/", api_base.path());

			api_base.set_path(&path);
		}

		let authorization = Url::parse(authorization)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let token = Url::parse(token)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;

		Ok(Self { api_base, authorization, token })
	}

	/// Production OPSkins endpoints.
	pub fn opskins() -> Result<Self, ConfigError> {
		Self::parse(API_BASE, AUTHORIZE_URL, TOKEN_URL)
	}

	/// Resolves the URL a call is sent to.
	pub fn url_for(&self, call: ProviderCall) -> Result<Url, ConfigError> {
		match call {
			ProviderCall::ExchangeCode | ProviderCall::RefreshToken => Ok(self.token.clone()),
			ProviderCall::Authorize => Ok(self.authorization.clone()),
			_ => {
				let interface = call.interface().unwrap_or_default();

				self.api_base
					.join(&format!("{interface}/{API_VERSION}/"))
					.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "api", source })
			},
		}
	}
}
