//! Token endpoint client for authorization-code and refresh-token grants.
//!
//! Both grants are form posts authenticated with HTTP Basic `client_id:client_secret`. The
//! provider reports failures in the body (an `error` field), sometimes alongside a success
//! status, so every response is inspected for `error` before the grant is decoded.

// self
use crate::{
	_prelude::*,
	api,
	auth::{AccessGrant, ClientRegistration, TokenSecret},
	error::ProtocolError,
	http::{self, ProviderHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderCall,
};

/// Exchanges codes and refresh tokens at the provider's token endpoint.
pub struct TokenClient<C>
where
	C: ?Sized + ProviderHttpClient,
{
	http_client: Arc<C>,
	token_url: Url,
}
impl<C> TokenClient<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates a client for `token_url`.
	pub fn new(http_client: impl Into<Arc<C>>, token_url: Url) -> Self {
		Self { http_client: http_client.into(), token_url }
	}

	/// Exchanges an authorization `code` for an access grant.
	///
	/// The returned grant already carries `code`.
	pub async fn exchange_code(
		&self,
		registration: &ClientRegistration,
		code: &str,
	) -> Result<AccessGrant> {
		const KIND: FlowKind = FlowKind::ExchangeCode;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = FlowSpan::new(KIND, "exchange_code")
			.instrument(async move {
				let (status, body) = self
					.post(
						ProviderCall::ExchangeCode,
						registration,
						&[("grant_type", "authorization_code"), ("code", code)],
					)
					.await?;
				let grant = decode_grant(ProviderCall::ExchangeCode, status, body)?;

				Ok(grant.with_code(code))
			})
			.await;

		obs::record_result(KIND, result)
	}

	/// Trades `refresh_token` for a fresh access token.
	pub async fn refresh(
		&self,
		registration: &ClientRegistration,
		refresh_token: &str,
	) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::Refresh;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = FlowSpan::new(KIND, "refresh")
			.instrument(async move {
				let (status, body) = self
					.post(
						ProviderCall::RefreshToken,
						registration,
						&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
					)
					.await?;
				let grant = decode_grant(ProviderCall::RefreshToken, status, body)?;

				Ok(grant.access_token)
			})
			.await;

		obs::record_result(KIND, result)
	}

	async fn post(
		&self,
		call: ProviderCall,
		registration: &ClientRegistration,
		form: &[(&str, &str)],
	) -> Result<(u16, JsonMap<String, JsonValue>)> {
		let authorization = api::basic_authorization(
			&registration.client_id,
			registration.client_secret.expose(),
		);
		let request = api::post_form(&self.token_url, &authorization, form)?;
		let response = http::execute(self.http_client.as_ref(), request).await?;

		let body = api::decode_oauth_body(call, &response)?;

		Ok((response.status().as_u16(), body))
	}
}
impl<C> Debug for TokenClient<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenClient").field("token_url", &self.token_url.as_str()).finish()
	}
}

fn decode_grant(
	call: ProviderCall,
	status: u16,
	body: JsonMap<String, JsonValue>,
) -> Result<AccessGrant> {
	match body.get("access_token") {
		Some(JsonValue::String(token)) if !token.is_empty() => {},
		_ => return Err(ProtocolError::MissingField { call, field: "access_token" }.into()),
	}

	serde_path_to_error::deserialize(JsonValue::Object(body))
		.map_err(|source| ProtocolError::Parse { call, status, source }.into())
}
