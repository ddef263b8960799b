//! Key-value storage contract and built-in store implementations.
//!
//! Stores are string-keyed and string-valued. Writes are synchronous: the redirect flow
//! must know the session record landed before it navigates away from the page.

pub mod file;
pub mod memory;
pub mod token_cache;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use token_cache::TokenCache;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Callback invoked for every change observed by a store.
pub type StoreListener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// Storage backend contract used for both the session and the durable store.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if any.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes `key`. Removing a missing key is not an error.
	fn delete(&self, key: &str) -> Result<(), StoreError>;

	/// Registers a change listener and returns its handle.
	fn subscribe(&self, listener: StoreListener) -> SubscriptionId;

	/// Removes a listener; returns `false` when the handle was unknown.
	fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Where a change originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeSource {
	/// Written through this store instance.
	Local,
	/// Replayed from another context sharing the same storage.
	External,
}

/// Change notification delivered to [`StoreListener`]s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEvent {
	/// Key that changed.
	pub key: String,
	/// Value after the change; `None` when the key was removed.
	pub new_value: Option<String>,
	/// Origin of the change.
	pub source: ChangeSource,
}

/// Handle returned by [`KeyValueStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// A stored value could not be encoded or decoded.
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

/// Listener registry shared by the built-in stores.
#[derive(Default)]
pub(crate) struct Listeners {
	next_id: AtomicU64,
	entries: RwLock<Vec<(SubscriptionId, StoreListener)>>,
}
impl Listeners {
	pub(crate) fn add(&self, listener: StoreListener) -> SubscriptionId {
		let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

		self.entries.write().push((id, listener));

		id
	}

	pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
		let mut entries = self.entries.write();
		let before = entries.len();

		entries.retain(|(candidate, _)| *candidate != id);

		entries.len() != before
	}

	/// Delivers `event` outside the registry lock so listeners may touch the store.
	pub(crate) fn notify(&self, event: StoreEvent) {
		let snapshot = self.entries.read().iter().map(|(_, l)| l.clone()).collect::<Vec<_>>();

		for listener in snapshot {
			listener(&event);
		}
	}
}
impl Debug for Listeners {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Listeners").field("count", &self.entries.read().len()).finish()
	}
}

/// Reads and decodes a JSON value stored under `key`.
pub(crate) fn get_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError>
where
	T: for<'de> Deserialize<'de>,
{
	let Some(raw) = store.get(key)? else {
		return Ok(None);
	};

	serde_json::from_str(&raw)
		.map(Some)
		.map_err(|e| StoreError::Serialization { message: format!("Failed to decode {key}: {e}") })
}

/// Encodes `value` as JSON and stores it under `key`.
pub(crate) fn set_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError>
where
	T: ?Sized + Serialize,
{
	let raw = serde_json::to_string(value)
		.map_err(|e| StoreError::Serialization { message: format!("Failed to encode {key}: {e}") })?;

	store.set(key, &raw)
}
