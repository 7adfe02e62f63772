//! In-process [`ClientStore`] for tests and ephemeral deployments.

// self
use crate::{
	_prelude::*,
	auth::ClientRegistration,
	store::{ClientStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<ClientRegistration>>>;

/// Keeps the registration in memory; clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store that already holds `registration`.
	pub fn with_registration(registration: ClientRegistration) -> Self {
		Self(Arc::new(RwLock::new(Some(registration))))
	}

	/// Returns the stored registration without going through the async contract.
	pub fn snapshot(&self) -> Option<ClientRegistration> {
		self.0.read().clone()
	}
}
impl ClientStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<ClientRegistration>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, registration: ClientRegistration) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(registration);

			Ok(())
		})
	}
}
