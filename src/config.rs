//! Immutable strategy configuration and its validating builder.

// self
use crate::{
	_prelude::*,
	auth::{DEFAULT_SCOPE, ScopeSet, TokenSecret},
	error::ConfigError,
	provider::ProviderEndpoints,
	state::DEFAULT_STATE_TTL,
};

/// Validated configuration for one [`Strategy`](crate::Strategy).
#[derive(Clone, Debug)]
pub struct StrategyConfig {
	name: String,
	return_url: Url,
	api_key: TokenSecret,
	scopes: ScopeSet,
	mobile: bool,
	permanent: bool,
	endpoints: ProviderEndpoints,
	state_ttl: Duration,
}
impl StrategyConfig {
	/// Starts a builder; `name`, `return_url`, and `api_key` are required.
	pub fn builder() -> StrategyConfigBuilder {
		StrategyConfigBuilder::default()
	}

	/// Site name the OAuth client is registered under.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Callback URL the provider redirects back to.
	pub fn return_url(&self) -> &Url {
		&self.return_url
	}

	/// API key used for client management calls.
	pub fn api_key(&self) -> &TokenSecret {
		&self.api_key
	}

	/// Scopes requested on the authorize page.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	/// Whether the mobile authorize page is requested.
	pub fn mobile(&self) -> bool {
		self.mobile
	}

	/// Whether a permanent (refreshable) grant is requested.
	pub fn permanent(&self) -> bool {
		self.permanent
	}

	/// Provider endpoints.
	pub fn endpoints(&self) -> &ProviderEndpoints {
		&self.endpoints
	}

	/// Lifetime of issued state tokens.
	pub fn state_ttl(&self) -> Duration {
		self.state_ttl
	}
}

/// Builder for [`StrategyConfig`].
#[derive(Debug, Default)]
pub struct StrategyConfigBuilder {
	name: Option<String>,
	return_url: Option<String>,
	api_key: Option<TokenSecret>,
	scopes: Option<String>,
	mobile: bool,
	permanent: bool,
	endpoints: Option<ProviderEndpoints>,
	state_ttl: Option<Duration>,
}
impl StrategyConfigBuilder {
	/// Sets the site name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Sets the callback return URL.
	pub fn return_url(mut self, url: impl Into<String>) -> Self {
		self.return_url = Some(url.into());

		self
	}

	/// Sets the provider API key.
	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(TokenSecret::new(key));

		self
	}

	/// Sets the whitespace-separated scopes (defaults to `identity`).
	pub fn scopes(mut self, scopes: impl Into<String>) -> Self {
		self.scopes = Some(scopes.into());

		self
	}

	/// Requests the mobile authorize page (`mobile=1`).
	pub fn mobile(mut self, mobile: bool) -> Self {
		self.mobile = mobile;

		self
	}

	/// Requests a permanent grant (`duration=permanent`).
	pub fn permanent(mut self, permanent: bool) -> Self {
		self.permanent = permanent;

		self
	}

	/// Overrides the provider endpoints (defaults to production OPSkins).
	pub fn endpoints(mut self, endpoints: ProviderEndpoints) -> Self {
		self.endpoints = Some(endpoints);

		self
	}

	/// Overrides the state-token lifetime (defaults to 10 minutes).
	pub fn state_ttl(mut self, ttl: Duration) -> Self {
		self.state_ttl = Some(ttl);

		self
	}

	/// Validates the collected parameters.
	pub fn build(self) -> Result<StrategyConfig, ConfigError> {
		let name = required(self.name, "name")?;
		let return_url = required(self.return_url, "return_url")?;
		let api_key = self
			.api_key
			.filter(|key| !key.expose().trim().is_empty())
			.ok_or(ConfigError::MissingField { field: "api_key" })?;
		let return_url = Url::parse(&return_url)
			.map_err(|source| ConfigError::InvalidReturnUrl { source })?;
		let scopes = ScopeSet::from_str(self.scopes.as_deref().unwrap_or(DEFAULT_SCOPE))?;
		let scopes = if scopes.is_empty() { ScopeSet::new([DEFAULT_SCOPE])? } else { scopes };
		let endpoints = match self.endpoints {
			Some(endpoints) => endpoints,
			None => ProviderEndpoints::opskins()?,
		};
		let state_ttl = self.state_ttl.unwrap_or(DEFAULT_STATE_TTL);

		if !state_ttl.is_positive() {
			return Err(ConfigError::NonPositiveStateTtl);
		}

		Ok(StrategyConfig {
			name,
			return_url,
			api_key,
			scopes,
			mobile: self.mobile,
			permanent: self.permanent,
			endpoints,
			state_ttl,
		})
	}
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
	value.filter(|v| !v.trim().is_empty()).ok_or(ConfigError::MissingField { field })
}
