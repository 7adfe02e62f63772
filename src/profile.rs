//! Authenticated user profile lookup.

// self
use crate::{
	_prelude::*,
	api,
	auth::UserProfile,
	error::ProtocolError,
	http::{self, ProviderHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderCall,
};

/// Fetches `IUser/GetProfile` with a bearer access token.
pub struct ProfileClient<C>
where
	C: ?Sized + ProviderHttpClient,
{
	http_client: Arc<C>,
	profile_url: Url,
}
impl<C> ProfileClient<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates a client for `profile_url`.
	pub fn new(http_client: impl Into<Arc<C>>, profile_url: Url) -> Self {
		Self { http_client: http_client.into(), profile_url }
	}

	/// Returns the `response` object of the profile payload.
	///
	/// The payload is not checked for `status == 1`; only an `error` field marks failure.
	pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
		const KIND: FlowKind = FlowKind::Profile;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = FlowSpan::new(KIND, "fetch_profile")
			.instrument(async move {
				let request =
					api::get(&self.profile_url, &api::bearer_authorization(access_token))?;
				let response = http::execute(self.http_client.as_ref(), request).await?;
				let mut body = api::decode_oauth_body(ProviderCall::FetchProfile, &response)?;

				match body.remove("response") {
					Some(JsonValue::Object(fields)) => Ok(UserProfile::new(fields)),
					_ => Err(ProtocolError::MissingField {
						call: ProviderCall::FetchProfile,
						field: "response",
					}
					.into()),
				}
			})
			.await;

		obs::record_result(KIND, result)
	}
}
impl<C> Debug for ProfileClient<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProfileClient").field("profile_url", &self.profile_url.as_str()).finish()
	}
}
