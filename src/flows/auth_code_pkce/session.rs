//! In-flight request record kept in the session store across the provider round trip.

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	flows::auth_code_pkce::{PkceCodes, StateObject},
	store::{self, KeyValueStore, StoreError},
};

const SCOPE: &str = "scope";
const STATE_OBJECT: &str = "state-object";
const PKCE_CODES: &str = "pkce-codes";

/// Values persisted before navigating to the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionRecord {
	/// Scopes requested by the attempt; empty when nothing is cached.
	pub scope: ScopeSet,
	/// State object whose `encoded_state` was sent to the provider.
	pub state_object: Option<StateObject>,
	/// PKCE pair whose challenge was sent to the provider.
	pub pkce_codes: Option<PkceCodes>,
}

/// Reads and writes the [`SessionRecord`] under the configured prefix.
#[derive(Clone)]
pub struct SessionCache {
	store: Arc<dyn KeyValueStore>,
	prefix: String,
}
impl SessionCache {
	/// Wraps `store`, scoping every key under `prefix`.
	pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
		Self { store, prefix: prefix.into() }
	}

	/// Fully-qualified storage keys, in write order.
	pub fn keys(&self) -> [String; 3] {
		[self.key(SCOPE), self.key(STATE_OBJECT), self.key(PKCE_CODES)]
	}

	/// Persists the in-flight record, replacing any earlier attempt.
	pub fn write(
		&self,
		scope: &ScopeSet,
		state_object: &StateObject,
		pkce_codes: &PkceCodes,
	) -> Result<(), StoreError> {
		store::set_json(self.store.as_ref(), &self.key(SCOPE), scope)?;
		store::set_json(self.store.as_ref(), &self.key(STATE_OBJECT), state_object)?;
		store::set_json(self.store.as_ref(), &self.key(PKCE_CODES), pkce_codes)
	}

	/// Loads the in-flight record.
	///
	/// Values that no longer decode are treated as absent so validation reports them as
	/// missing; backend failures are returned.
	pub fn read(&self) -> Result<SessionRecord, StoreError> {
		Ok(SessionRecord {
			scope: self.read_value(SCOPE)?.unwrap_or_default(),
			state_object: self.read_value(STATE_OBJECT)?,
			pkce_codes: self.read_value(PKCE_CODES)?,
		})
	}

	/// Removes every key, attempting all of them before reporting the first failure.
	pub fn clear(&self) -> Result<(), StoreError> {
		let mut first_error = None;

		for key in self.keys() {
			if let Err(e) = self.store.delete(&key) {
				first_error.get_or_insert(e);
			}
		}

		match first_error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	fn key(&self, name: &str) -> String {
		format!("{}{name}", self.prefix)
	}

	fn read_value<T>(&self, name: &str) -> Result<Option<T>, StoreError>
	where
		T: for<'de> Deserialize<'de>,
	{
		match store::get_json(self.store.as_ref(), &self.key(name)) {
			Err(StoreError::Serialization { message }) => {
				tracing::warn!(key = name, %message, "Discarding undecodable session value.");

				Ok(None)
			},
			other => other,
		}
	}
}
impl Debug for SessionCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionCache").field("prefix", &self.prefix).finish()
	}
}
