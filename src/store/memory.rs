//! Thread-safe in-memory [`KeyValueStore`] standing in for browser session storage.

// self
use crate::{
	_prelude::*,
	store::{ChangeSource, KeyValueStore, Listeners, StoreError, StoreEvent, StoreListener, SubscriptionId},
};

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	map: Arc<RwLock<HashMap<String, String>>>,
	listeners: Arc<Listeners>,
}
impl MemoryStore {
	/// Applies a change made by another context sharing the same storage area.
	///
	/// The value is written (or removed when `new_value` is `None`) and listeners receive the
	/// event tagged [`ChangeSource::External`].
	pub fn apply_external_change(&self, key: impl Into<String>, new_value: Option<String>) {
		let key = key.into();

		{
			let mut map = self.map.write();

			match &new_value {
				Some(value) => map.insert(key.clone(), value.clone()),
				None => map.remove(&key),
			};
		}

		self.listeners.notify(StoreEvent { key, new_value, source: ChangeSource::External });
	}

	/// Number of stored keys.
	pub fn len(&self) -> usize {
		self.map.read().len()
	}

	/// Returns true when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.map.read().is_empty()
	}

	/// Sorted snapshot of stored keys.
	pub fn keys(&self) -> Vec<String> {
		let mut keys = self.map.read().keys().cloned().collect::<Vec<_>>();

		keys.sort();

		keys
	}
}
impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.map.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.map.write().insert(key.to_owned(), value.to_owned());
		self.listeners.notify(StoreEvent {
			key: key.to_owned(),
			new_value: Some(value.to_owned()),
			source: ChangeSource::Local,
		});

		Ok(())
	}

	fn delete(&self, key: &str) -> Result<(), StoreError> {
		let removed = self.map.write().remove(key);

		if removed.is_some() {
			self.listeners.notify(StoreEvent {
				key: key.to_owned(),
				new_value: None,
				source: ChangeSource::Local,
			});
		}

		Ok(())
	}

	fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
		self.listeners.add(listener)
	}

	fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.listeners.remove(id)
	}
}
