//! JSON-file [`ClientStore`], the default for single-host deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::ClientRegistration,
	store::{ClientStore, StoreError, StoreFuture},
};

/// Persists the registration to a JSON file, replacing it atomically on every save.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	write_guard: Arc<Mutex<()>>,
}
impl FileStore {
	/// File name used when callers only pick a directory.
	pub const DEFAULT_FILE_NAME: &'static str = "opskins-client.json";

	/// Opens a store at `path`, creating parent directories as needed.
	///
	/// The file itself is read lazily on [`ClientStore::load`], so a missing file simply means
	/// no registration has been saved yet.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		Ok(Self { path, write_guard: Default::default() })
	}

	/// Opens `dir/opskins-client.json`.
	pub fn in_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
		Self::open(dir.as_ref().join(Self::DEFAULT_FILE_NAME))
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn read_now(&self) -> Result<Option<ClientRegistration>, StoreError> {
		if !self.path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(&self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", self.path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", self.path.display()),
		})
	}

	fn write_now(&self, registration: &ClientRegistration) -> Result<(), StoreError> {
		let _guard = self.write_guard.lock();

		ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(registration).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize client registration: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl ClientStore for FileStore {
	fn load(&self) -> StoreFuture<'_, Option<ClientRegistration>> {
		Box::pin(async move { self.read_now() })
	}

	fn save(&self, registration: ClientRegistration) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.write_now(&registration) })
	}
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", parent.display()),
		})?;
	}

	Ok(())
}
