//! OAuth client registration manager.
//!
//! The strategy owns exactly one OAuth client at the provider. On start-up the registry
//! compares the persisted registration against the provider's owned-client list: a live
//! persisted client is adopted as-is, otherwise every client left behind for this site is
//! deleted and a fresh one is created, persisted, and adopted. Token and profile calls are
//! gated on the first successful reconciliation.

// self
use crate::{
	_prelude::*,
	api,
	auth::{ClientInfo, ClientRegistration},
	config::StrategyConfig,
	error::ProtocolError,
	http::{self, ProviderHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderCall,
	store::ClientStore,
};

#[derive(Debug, Deserialize)]
struct OwnedClients {
	#[serde(default)]
	clients: Vec<ClientInfo>,
}

#[derive(Serialize)]
struct CreateClientBody<'a> {
	name: &'a str,
	redirect_uri: &'a str,
}

/// Tracks the strategy's OAuth client and keeps it in sync with the provider.
pub struct ClientRegistry<C>
where
	C: ?Sized + ProviderHttpClient,
{
	config: Arc<StrategyConfig>,
	http_client: Arc<C>,
	store: Arc<dyn ClientStore>,
	current: RwLock<Option<ClientRegistration>>,
	ready: AsyncOnceCell<()>,
	reconcile_guard: AsyncMutex<()>,
}
impl<C> ClientRegistry<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates an unreconciled registry.
	pub fn new(
		config: Arc<StrategyConfig>,
		http_client: Arc<C>,
		store: Arc<dyn ClientStore>,
	) -> Self {
		Self {
			config,
			http_client,
			store,
			current: RwLock::new(None),
			ready: AsyncOnceCell::new(),
			reconcile_guard: AsyncMutex::new(()),
		}
	}

	/// Configuration the registry reconciles against.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Returns the adopted registration, or [`Error::NotReady`] before the first
	/// successful reconciliation.
	pub fn current(&self) -> Result<ClientRegistration> {
		self.current.read().clone().ok_or(Error::NotReady)
	}

	/// Whether a registration has been adopted.
	pub fn is_ready(&self) -> bool {
		self.ready.is_initialized()
	}

	/// Waits until a reconciliation succeeds, then returns the adopted registration.
	pub async fn wait_ready(&self) -> Result<ClientRegistration> {
		self.ready.wait().await;

		self.current()
	}

	/// Lists the clients owned by the configured API key.
	pub async fn list_clients(&self) -> Result<Vec<ClientInfo>> {
		const CALL: ProviderCall = ProviderCall::ListClients;

		let url = self.config.endpoints().url_for(CALL)?;
		let request = api::get(&url, &self.api_authorization())?;
		let response = http::execute(self.http_client.as_ref(), request).await?;
		let owned: OwnedClients = api::decode_envelope(CALL, &response)?;

		Ok(owned.clients)
	}

	/// Registers a new client named after the site with the configured return URL.
	pub async fn create_client(&self) -> Result<ClientRegistration> {
		const CALL: ProviderCall = ProviderCall::CreateClient;

		let url = self.config.endpoints().url_for(CALL)?;
		let body = CreateClientBody {
			name: self.config.name(),
			redirect_uri: self.config.return_url().as_str(),
		};
		let request = api::post_json(&url, &self.api_authorization(), &body)?;
		let response = http::execute(self.http_client.as_ref(), request).await?;
		let payload = api::open_envelope(CALL, &response)?;
		let created = payload.response.as_ref();
		let client_id = created
			.and_then(|value| value.pointer("/client/client_id"))
			.and_then(JsonValue::as_str)
			.filter(|id| !id.is_empty());
		let secret = created
			.and_then(|value| value.get("secret"))
			.and_then(JsonValue::as_str)
			.filter(|secret| !secret.is_empty());

		match (client_id, secret) {
			(Some(client_id), Some(secret)) => Ok(ClientRegistration::new(client_id, secret)),
			(client_id, _) => {
				if payload.message.is_some() {
					return Err(ProtocolError::Status {
						call: CALL,
						status: Some(1),
						message: payload.message,
					}
					.into());
				}

				let field = if client_id.is_none() { "client.client_id" } else { "secret" };

				Err(ProtocolError::MissingField { call: CALL, field }.into())
			},
		}
	}

	/// Deletes client `client_id`.
	///
	/// Best effort: failures are logged and otherwise ignored so a stale client can never
	/// block reconciliation.
	pub async fn delete_client(&self, client_id: &str) {
		if let Err(e) = self.try_delete_client(client_id).await {
			obs::warn_flow(
				FlowKind::Reconcile,
				"delete_client",
				&format_args!("Failed to delete OAuth client {client_id}: {e}"),
			);
		}
	}

	/// Brings the adopted registration in line with the provider.
	///
	/// Concurrent calls are serialized; the readiness gate opens on the first success.
	pub async fn reconcile(&self) -> Result<ClientRegistration> {
		const KIND: FlowKind = FlowKind::Reconcile;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let _guard = self.reconcile_guard.lock().await;
		let result = FlowSpan::new(KIND, "reconcile").instrument(self.reconcile_locked()).await;

		obs::record_result(KIND, result)
	}

	async fn reconcile_locked(&self) -> Result<ClientRegistration> {
		let persisted = self.store.load().await?;
		let live = self.list_clients().await?;

		if let Some(registration) = persisted
			.filter(|registration| live.iter().any(|client| client.client_id == registration.client_id))
		{
			obs::info_flow(
				FlowKind::Reconcile,
				"adopt",
				&format_args!("Reusing OAuth client {}.", registration.client_id),
			);
			self.adopt(registration.clone()).await;

			return Ok(registration);
		}

		let (name, return_url) = (self.config.name(), self.config.return_url());

		for client in live.iter().filter(|client| client.belongs_to(name, return_url)) {
			self.delete_client(&client.client_id).await;
		}

		let registration = self.create_client().await?;

		self.store.save(registration.clone()).await?;
		obs::info_flow(
			FlowKind::Reconcile,
			"create_client",
			&format_args!("Registered OAuth client {}.", registration.client_id),
		);
		self.adopt(registration.clone()).await;

		Ok(registration)
	}

	async fn try_delete_client(&self, client_id: &str) -> Result<()> {
		const CALL: ProviderCall = ProviderCall::DeleteClient;

		let url = self.config.endpoints().url_for(CALL)?;
		let request =
			api::post_form(&url, &self.api_authorization(), &[("client_id", client_id)])?;
		let response = http::execute(self.http_client.as_ref(), request).await?;

		api::open_envelope(CALL, &response).map(|_| ())
	}

	async fn adopt(&self, registration: ClientRegistration) {
		*self.current.write() = Some(registration);

		let _ = self.ready.set(()).await;
	}

	fn api_authorization(&self) -> String {
		api::basic_authorization(self.config.api_key().expose(), "")
	}
}
impl<C> Debug for ClientRegistry<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientRegistry")
			.field("name", &self.config.name())
			.field("ready", &self.is_ready())
			.field(
				"client_id",
				&self.current.read().as_ref().map(|registration| registration.client_id.clone()),
			)
			.finish()
	}
}
