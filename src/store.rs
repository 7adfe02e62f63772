//! Persistence contract for the strategy's OAuth client registration.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::ClientRegistration};

/// Boxed future returned by [`ClientStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend that remembers the client registration between restarts.
pub trait ClientStore
where
	Self: Send + Sync,
{
	/// Loads the persisted registration, if any.
	fn load(&self) -> StoreFuture<'_, Option<ClientRegistration>>;

	/// Persists `registration`, replacing whatever was stored before.
	fn save(&self, registration: ClientRegistration) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`ClientStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
