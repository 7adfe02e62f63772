//! Host-facing authentication orchestrator.
//!
//! A [`Strategy`] answers every inbound request with exactly one [`AuthOutcome`]: requests
//! outside the return URL are redirected to the provider's authorize page, and requests on the
//! return URL are treated as callbacks (state check, code exchange, profile fetch, and host
//! verification, in that order).

// crates.io
use url::form_urlencoded;
// self
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};
use crate::{
	_prelude::*,
	auth::{AccessGrant, ClientRegistration, TokenSecret, UserProfile},
	config::StrategyConfig,
	error::ProtocolError,
	http::ProviderHttpClient,
	oauth::TokenClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	profile::ProfileClient,
	provider::ProviderCall,
	registry::ClientRegistry,
	state::StateRegistry,
	store::ClientStore,
};

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport.
pub type ReqwestStrategy<V> = Strategy<ReqwestHttpClient, V>;

/// Boxed future returned by [`Verifier::verify`].
pub type VerifyFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + 'a + Send>>;

/// Host hook that turns an authenticated profile into the host's user value.
///
/// Any async closure `Fn(UserProfile) -> impl Future<Output = Result<T, E>>` is a verifier.
pub trait Verifier
where
	Self: Send + Sync,
{
	/// Value produced for a successfully verified profile.
	type Output: Send;

	/// Accepts or rejects `profile`.
	fn verify(&self, profile: UserProfile) -> VerifyFuture<'_, Self::Output>;
}
impl<F, Fut, T, E> Verifier for F
where
	F: Send + Sync + Fn(UserProfile) -> Fut,
	Fut: 'static + Send + Future<Output = std::result::Result<T, E>>,
	T: Send,
	E: Into<BoxError>,
{
	type Output = T;

	fn verify(&self, profile: UserProfile) -> VerifyFuture<'_, Self::Output> {
		let fut = self(profile);

		Box::pin(async move { fut.await.map_err(Into::into) })
	}
}

/// Inbound request as seen by the strategy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthRequest {
	/// Request path, compared against the return URL's path.
	pub path: String,
	/// Raw query string without the leading `?`.
	pub query: Option<String>,
}
impl AuthRequest {
	/// Creates a request from its path and optional raw query.
	pub fn new(path: impl Into<String>, query: Option<&str>) -> Self {
		Self { path: path.into(), query: query.map(str::to_owned) }
	}

	/// Splits an absolute URL or an origin-form target (`/path?query`).
	pub fn from_uri(uri: &str) -> Self {
		if let Ok(url) = Url::parse(uri) {
			return Self::new(url.path(), url.query());
		}

		let target = uri.split_once('#').map_or(uri, |(target, _)| target);

		match target.split_once('?') {
			Some((path, query)) => Self::new(path, Some(query)),
			None => Self::new(target, None),
		}
	}

	/// Decoded query parameter `key`; the first occurrence wins.
	pub fn param(&self, key: &str) -> Option<String> {
		let query = self.query.as_deref()?;

		form_urlencoded::parse(query.as_bytes())
			.find(|(name, _)| name == key)
			.map(|(_, value)| value.into_owned())
	}
}

/// Terminal result of [`Strategy::authenticate`].
#[derive(Debug)]
pub enum AuthOutcome<T> {
	/// Send the user-agent to this authorize URL.
	Redirect(Url),
	/// The callback succeeded and the verifier accepted the profile.
	Success(T),
	/// The callback failed; the request must not be treated as authenticated.
	Failure(Error),
}
impl<T> AuthOutcome<T> {
	/// Whether this is [`AuthOutcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Collapses the outcome into a result, mapping a redirect to `Ok(None)`.
	pub fn into_result(self) -> Result<Option<T>> {
		match self {
			Self::Redirect(_) => Ok(None),
			Self::Success(value) => Ok(Some(value)),
			Self::Failure(e) => Err(e),
		}
	}
}

/// OPSkins login strategy.
///
/// The strategy owns the state registry and the client registry, so several strategies (for
/// example one per site) can coexist in one process. Build one with
/// [`Strategy::connect_with_http_client`] to reconcile the OAuth client up front, or with
/// [`Strategy::with_http_client`] and call [`Strategy::reconcile`] later; until the first
/// reconciliation succeeds every login and token call fails with [`Error::NotReady`].
pub struct Strategy<C, V>
where
	C: ?Sized + ProviderHttpClient,
{
	config: Arc<StrategyConfig>,
	states: StateRegistry,
	registry: ClientRegistry<C>,
	tokens: TokenClient<C>,
	profiles: ProfileClient<C>,
	verifier: V,
}
impl<C, V> Strategy<C, V>
where
	C: ?Sized + ProviderHttpClient,
	V: Verifier,
{
	/// Strategy name hosts register the strategy under.
	pub const NAME: &'static str = "opskins";

	/// Creates an unreconciled strategy over a caller-provided transport.
	pub fn with_http_client(
		config: StrategyConfig,
		http_client: impl Into<Arc<C>>,
		store: Arc<dyn ClientStore>,
		verifier: V,
	) -> Result<Self> {
		let config = Arc::new(config);
		let http_client = http_client.into();
		let endpoints = config.endpoints();
		let profile_url = endpoints.url_for(ProviderCall::FetchProfile)?;
		let tokens = TokenClient::new(http_client.clone(), endpoints.token.clone());
		let profiles = ProfileClient::new(http_client.clone(), profile_url);

		Ok(Self {
			states: StateRegistry::new(config.state_ttl()),
			registry: ClientRegistry::new(config.clone(), http_client, store),
			tokens,
			profiles,
			verifier,
			config,
		})
	}

	/// Creates a strategy and reconciles its OAuth client before returning.
	pub async fn connect_with_http_client(
		config: StrategyConfig,
		http_client: impl Into<Arc<C>>,
		store: Arc<dyn ClientStore>,
		verifier: V,
	) -> Result<Self> {
		let strategy = Self::with_http_client(config, http_client, store, verifier)?;

		strategy.reconcile().await?;

		Ok(strategy)
	}

	/// Validated configuration.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Live state tokens.
	pub fn states(&self) -> &StateRegistry {
		&self.states
	}

	/// OAuth client registry.
	pub fn registry(&self) -> &ClientRegistry<C> {
		&self.registry
	}

	/// Re-runs client reconciliation.
	pub async fn reconcile(&self) -> Result<ClientRegistration> {
		self.registry.reconcile().await
	}

	/// Waits until the OAuth client has been reconciled.
	pub async fn wait_ready(&self) -> Result<ClientRegistration> {
		self.registry.wait_ready().await
	}

	/// Replaces the live state tokens, e.g. with tokens issued by a sibling process.
	pub fn set_states<I, S>(&self, tokens: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.states.replace(tokens);
	}

	/// Issues a state token and builds the provider's authorize URL.
	///
	/// Fails with [`Error::NotReady`] before reconciliation; no state token is issued then.
	pub fn login(&self) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Login;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.registry.current().map(|registration| {
			let state = self.states.issue();
			let mut url = self.config.endpoints().authorization.clone();

			{
				let mut query = url.query_pairs_mut();

				query
					.append_pair("response_type", "code")
					.append_pair("state", &state)
					.append_pair("client_id", &registration.client_id)
					.append_pair("scope", &self.config.scopes().normalized());

				if self.config.mobile() {
					query.append_pair("mobile", "1");
				}
				if self.config.permanent() {
					query.append_pair("duration", "permanent");
				}
			}

			url
		});

		obs::record_result(KIND, result)
	}

	/// Exchanges an authorization code with the reconciled client credentials.
	pub async fn exchange_code(&self, code: &str) -> Result<AccessGrant> {
		let registration = self.registry.current()?;

		self.tokens.exchange_code(&registration, code).await
	}

	/// Trades a refresh token for a new access token.
	pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSecret> {
		let registration = self.registry.current()?;

		self.tokens.refresh(&registration, refresh_token).await
	}

	/// Fetches the profile unlocked by `access_token`.
	pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
		self.registry.current()?;

		self.profiles.fetch_profile(access_token).await
	}

	/// Handles one inbound request.
	pub async fn authenticate(&self, request: &AuthRequest) -> AuthOutcome<V::Output> {
		if request.path != self.config.return_url().path() {
			return match self.login() {
				Ok(url) => AuthOutcome::Redirect(url),
				Err(e) => AuthOutcome::Failure(e),
			};
		}

		const KIND: FlowKind = FlowKind::Callback;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			FlowSpan::new(KIND, "authenticate").instrument(self.handle_callback(request)).await;

		match obs::record_result(KIND, result) {
			Ok(value) => AuthOutcome::Success(value),
			Err(e) => {
				obs::warn_flow(KIND, "authenticate", &e);

				AuthOutcome::Failure(e)
			},
		}
	}

	async fn handle_callback(&self, request: &AuthRequest) -> Result<V::Output> {
		let state_ok = request.param("state").is_some_and(|state| self.states.validate(&state));

		if !state_ok {
			return Err(Error::StateMismatch);
		}
		if let Some(error) = request.param("error") {
			return Err(ProtocolError::Provider {
				call: ProviderCall::Authorize,
				error,
				description: request.param("error_description"),
			}
			.into());
		}

		let code = request
			.param("code")
			.filter(|code| !code.is_empty())
			.ok_or(ProtocolError::MissingField { call: ProviderCall::Authorize, field: "code" })?;
		let grant = self.exchange_code(&code).await?;
		let profile = self.fetch_profile(grant.access_token.expose()).await?.with_access(grant);

		self.verifier.verify(profile).await.map_err(|source| Error::Verification { source })
	}
}
#[cfg(feature = "reqwest")]
impl<V> Strategy<ReqwestHttpClient, V>
where
	V: Verifier,
{
	/// Creates an unreconciled strategy over a default reqwest client.
	pub fn new(config: StrategyConfig, store: Arc<dyn ClientStore>, verifier: V) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::http_client_build)?;

		Self::with_http_client(config, ReqwestHttpClient::with_client(client), store, verifier)
	}

	/// Creates a strategy over a default reqwest client and reconciles it before returning.
	pub async fn connect(
		config: StrategyConfig,
		store: Arc<dyn ClientStore>,
		verifier: V,
	) -> Result<Self> {
		let strategy = Self::new(config, store, verifier)?;

		strategy.reconcile().await?;

		Ok(strategy)
	}
}
impl<C, V> Debug for Strategy<C, V>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Strategy")
			.field("config", &self.config)
			.field("states", &self.states.len())
			.field("registry", &self.registry)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		auth::ClientRegistration,
		http::fake::FakeHttpClient,
		store::{MemoryStore, StoreError},
	};

	const LIST_PATH: &str = "/IOAuth/GetOwnedClientList/v1/";
	const CREATE_PATH: &str = "/IOAuth/CreateClient/v1/";
	const TOKEN_PATH: &str = "/v1/access_token";
	const PROFILE_PATH: &str = "/IUser/GetProfile/v1/";

	type EchoStrategy = Strategy<
		FakeHttpClient,
		fn(UserProfile) -> std::future::Ready<std::result::Result<JsonValue, StoreError>>,
	>;

	fn echo(profile: UserProfile) -> std::future::Ready<std::result::Result<JsonValue, StoreError>> {
		std::future::ready(profile.to_json().map_err(|e| StoreError::Serialization {
			message: e.to_string(),
		}))
	}

	fn config(mobile: bool, permanent: bool) -> StrategyConfig {
		StrategyConfig::builder()
			.name("acme")
			.return_url("https://acme.test/auth/callback")
			.api_key("key-123")
			.mobile(mobile)
			.permanent(permanent)
			.build()
			.expect("Test config should build.")
	}

	fn provider() -> FakeHttpClient {
		let fake = FakeHttpClient::default();

		fake.reply(LIST_PATH, 200, r#"{"status":1,"response":{"clients":[]}}"#).reply(
			CREATE_PATH,
			200,
			r#"{"status":1,"response":{"client":{"client_id":"cid"},"secret":"cs"}}"#,
		);

		fake
	}

	async fn connected(fake: &FakeHttpClient, config: StrategyConfig) -> EchoStrategy {
		Strategy::connect_with_http_client(
			config,
			fake.clone(),
			Arc::new(MemoryStore::default()),
			echo as fn(_) -> _,
		)
		.await
		.expect("Strategy should connect.")
	}

	fn state_of(url: &Url) -> String {
		url.query_pairs()
			.find(|(name, _)| name == "state")
			.map(|(_, value)| value.into_owned())
			.expect("Login URL should carry a state.")
	}

	#[tokio::test]
	async fn login_url_carries_state_client_and_scope() {
		let fake = provider();
		let strategy = connected(&fake, config(false, false)).await;
		let url = strategy.login().expect("Login should succeed once ready.");
		let state = state_of(&url);

		assert_eq!(
			url.as_str(),
			format!(
				"https://oauth.opskins.com/v1/authorize?response_type=code&state={state}&client_id=cid&scope=identity"
			)
		);
		assert_eq!(state.len(), 32);
		assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
		assert_eq!(strategy.states().snapshot(), [state]);
	}

	#[tokio::test]
	async fn login_url_appends_mobile_and_permanent_flags() {
		let fake = provider();
		let strategy = connected(&fake, config(true, true)).await;
		let url = strategy.login().expect("Login should succeed once ready.");

		assert!(url.as_str().ends_with("&scope=identity&mobile=1&duration=permanent"));
		assert_eq!(EchoStrategy::NAME, "opskins");
	}

	#[tokio::test]
	async fn non_callback_path_redirects() {
		let fake = provider();
		let strategy = connected(&fake, config(false, false)).await;

		match strategy.authenticate(&AuthRequest::from_uri("/auth/opskins")).await {
			AuthOutcome::Redirect(url) =>
				assert!(url.as_str().starts_with("https://oauth.opskins.com/v1/authorize?")),
			other => panic!("Expected a redirect, got {other:?}."),
		}
	}

	#[tokio::test]
	async fn login_before_reconcile_is_not_ready() {
		let strategy: EchoStrategy = Strategy::with_http_client(
			config(false, false),
			provider(),
			Arc::new(MemoryStore::default()),
			echo as fn(_) -> _,
		)
		.expect("Strategy should build.");

		assert!(matches!(strategy.login(), Err(Error::NotReady)));
		assert!(strategy.states().is_empty(), "No state may be issued before readiness.");
		assert!(matches!(strategy.exchange_code("ABC").await, Err(Error::NotReady)));
		assert!(matches!(strategy.refresh_access_token("R").await, Err(Error::NotReady)));

		strategy.reconcile().await.expect("Reconcile should succeed.");

		assert!(strategy.login().is_ok());
	}

	#[tokio::test]
	async fn callback_attaches_grant_and_code() {
		let fake = provider();
		let strategy = connected(&fake, config(false, false)).await;

		fake.reply(TOKEN_PATH, 200, r#"{"access_token":"T"}"#).reply(
			PROFILE_PATH,
			200,
			r#"{"status":1,"response":{"id":42}}"#,
		);
		strategy.set_states(["s1"]);

		let request = AuthRequest::from_uri("/auth/callback?state=s1&code=ABC");

		match strategy.authenticate(&request).await {
			AuthOutcome::Success(value) =>
				assert_eq!(value, json!({"id":42,"access":{"access_token":"T","code":"ABC"}})),
			other => panic!("Expected success, got {other:?}."),
		}

		assert_eq!(fake.requests_to(TOKEN_PATH)[0].body, "grant_type=authorization_code&code=ABC");
		assert_eq!(
			fake.requests_to(PROFILE_PATH)[0].headers.get("authorization").map(String::as_str),
			Some("Bearer T")
		);

		match strategy.authenticate(&request).await {
			AuthOutcome::Failure(Error::StateMismatch) => {},
			other => panic!("Replayed state must be rejected, got {other:?}."),
		}
	}

	#[tokio::test]
	async fn unknown_state_fails_without_exchange() {
		let fake = provider();
		let strategy = connected(&fake, config(false, false)).await;
		let request = AuthRequest::new("/auth/callback", Some("state=never-issued&code=ABC"));

		assert!(matches!(
			strategy.authenticate(&request).await,
			AuthOutcome::Failure(Error::StateMismatch)
		));
		assert!(fake.requests_to(TOKEN_PATH).is_empty());
	}

	#[tokio::test]
	async fn provider_denial_and_missing_code_fail() {
		let fake = provider();
		let strategy = connected(&fake, config(false, false)).await;

		strategy.set_states(["s1", "s2"]);

		let denied = AuthRequest::new("/auth/callback", Some("state=s1&error=access_denied"));

		match strategy.authenticate(&denied).await {
			AuthOutcome::Failure(Error::Protocol(ProtocolError::Provider { error, .. })) =>
				assert_eq!(error, "access_denied"),
			other => panic!("Expected a provider failure, got {other:?}."),
		}

		let codeless = AuthRequest::new("/auth/callback", Some("state=s2"));

		assert!(matches!(
			strategy.authenticate(&codeless).await,
			AuthOutcome::Failure(Error::Protocol(ProtocolError::MissingField { field: "code", .. }))
		));
		assert!(fake.requests_to(TOKEN_PATH).is_empty());
	}

	#[tokio::test]
	async fn verifier_rejection_is_a_failure() {
		let fake = provider();

		fake.reply(TOKEN_PATH, 200, r#"{"access_token":"T"}"#).reply(
			PROFILE_PATH,
			200,
			r#"{"status":1,"response":{"id":7,"banned":true}}"#,
		);

		let strategy = Strategy::connect_with_http_client(
			config(false, false),
			fake.clone(),
			Arc::new(MemoryStore::default()),
			|profile: UserProfile| async move {
				if profile.get("banned") == Some(&JsonValue::Bool(true)) {
					Err(StoreError::Backend { message: "banned".into() })
				} else {
					Ok(profile)
				}
			},
		)
		.await
		.expect("Strategy should connect.");

		strategy.set_states(["s1"]);

		match strategy.authenticate(&AuthRequest::new("/auth/callback", Some("state=s1&code=C"))).await
		{
			AuthOutcome::Failure(Error::Verification { source }) =>
				assert!(source.to_string().contains("banned")),
			other => panic!("Expected a verification failure, got {other:?}."),
		}
	}

	#[tokio::test]
	async fn token_error_surfaces_as_failure() {
		let fake = provider();
		let strategy = connected(&fake, config(false, false)).await;

		fake.reply(TOKEN_PATH, 200, r#"{"error":"invalid_grant"}"#);
		strategy.set_states(["s1"]);

		let outcome =
			strategy.authenticate(&AuthRequest::new("/auth/callback", Some("state=s1&code=C"))).await;

		assert!(matches!(
			outcome,
			AuthOutcome::Failure(Error::Protocol(ProtocolError::Provider { .. }))
		));
		assert!(fake.requests_to(PROFILE_PATH).is_empty());
	}

	#[tokio::test]
	async fn refresh_uses_reconciled_credentials() {
		let fake = provider();
		let strategy = connected(&fake, config(false, true)).await;

		fake.reply(TOKEN_PATH, 200, r#"{"access_token":"T2"}"#);

		let token = strategy.refresh_access_token("R").await.expect("Refresh should succeed.");

		assert_eq!(token.expose(), "T2");
		assert_eq!(
			strategy.wait_ready().await.expect("Strategy should be ready."),
			ClientRegistration::new("cid", "cs")
		);
	}

	#[test]
	fn auth_request_parses_targets() {
		let relative = AuthRequest::from_uri("/auth/callback?state=a%20b&code=1#frag");

		assert_eq!(relative.path, "/auth/callback");
		assert_eq!(relative.param("state").as_deref(), Some("a b"));
		assert_eq!(relative.param("code").as_deref(), Some("1"));

		let absolute = AuthRequest::from_uri("https://acme.test/auth/callback?code=2&code=3");

		assert_eq!(absolute.path, "/auth/callback");
		assert_eq!(absolute.param("code").as_deref(), Some("2"));
		assert_eq!(absolute.param("state"), None);
	}
}
