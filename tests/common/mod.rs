//! Shared fixtures for the httpmock-backed integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
// self
use opskins_auth::{
	StrategyConfig,
	auth::UserProfile,
	http::ReqwestHttpClient,
	provider::ProviderEndpoints,
	reqwest::Client,
	store::{ClientStore, MemoryStore},
	strategy::ReqwestStrategy,
};

pub const SITE_NAME: &str = "acme-it";
pub const RETURN_URL: &str = "https://acme.test/auth/opskins/callback";
pub const API_KEY: &str = "key-it";
/// `Basic base64("key-it:")`.
pub const API_AUTHORIZATION: &str = "Basic a2V5LWl0Og==";
/// `Basic base64("cid-it:secret-it")`.
pub const CLIENT_AUTHORIZATION: &str = "Basic Y2lkLWl0OnNlY3JldC1pdA==";

pub const LIST_PATH: &str = "/IOAuth/GetOwnedClientList/v1/";
pub const CREATE_PATH: &str = "/IOAuth/CreateClient/v1/";
pub const DELETE_PATH: &str = "/IOAuth/DeleteClient/v1/";
pub const PROFILE_PATH: &str = "/IUser/GetProfile/v1/";
pub const AUTHORIZE_PATH: &str = "/v1/authorize";
pub const TOKEN_PATH: &str = "/v1/access_token";

pub type ProfileStrategy = ReqwestStrategy<
	fn(UserProfile) -> std::future::Ready<Result<UserProfile, std::convert::Infallible>>,
>;

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Points every provider endpoint at `server`.
pub fn config(server: &MockServer) -> StrategyConfig {
	let endpoints = ProviderEndpoints::parse(
		&server.base_url(),
		&server.url(AUTHORIZE_PATH),
		&server.url(TOKEN_PATH),
	)
	.expect("Mock endpoints should parse.");

	StrategyConfig::builder()
		.name(SITE_NAME)
		.return_url(RETURN_URL)
		.api_key(API_KEY)
		.endpoints(endpoints)
		.build()
		.expect("Integration config should build.")
}

pub fn accept(profile: UserProfile) -> std::future::Ready<Result<UserProfile, std::convert::Infallible>> {
	std::future::ready(Ok(profile))
}

/// Connects a strategy whose verifier hands the profile back unchanged.
pub async fn connect(server: &MockServer, store: Arc<dyn ClientStore>) -> ProfileStrategy {
	ProfileStrategy::connect_with_http_client(
		config(server),
		test_reqwest_http_client(),
		store,
		accept as fn(_) -> _,
	)
	.await
	.expect("Strategy should connect against the mock provider.")
}

pub fn memory_store() -> Arc<dyn ClientStore> {
	Arc::new(MemoryStore::default())
}

pub fn owned_clients(clients: serde_json::Value) -> serde_json::Value {
	serde_json::json!({ "status": 1, "response": { "clients": clients } })
}

pub fn created_client() -> serde_json::Value {
	serde_json::json!({
		"status": 1,
		"response": {
			"client": { "client_id": "cid-it", "name": SITE_NAME, "redirect_uri": RETURN_URL },
			"secret": "secret-it",
		},
	})
}
