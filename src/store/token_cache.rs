//! Durable token cache keyed under the configured prefix.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	store::{self, KeyValueStore, StoreError},
};

const TOKEN_KEYS: &str = "token-keys";
const AUTHORITY: &str = "authority";

/// Reads and writes the active session's [`TokenRecord`] in a durable store.
#[derive(Clone)]
pub struct TokenCache {
	store: Arc<dyn KeyValueStore>,
	prefix: String,
}
impl TokenCache {
	/// Wraps `store`, scoping every key under `prefix`.
	pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
		Self { store, prefix: prefix.into() }
	}

	/// Fully-qualified key for the token record.
	pub fn token_key(&self) -> String {
		format!("{}{TOKEN_KEYS}", self.prefix)
	}

	/// Fully-qualified key for the authority marker.
	pub fn authority_key(&self) -> String {
		format!("{}{AUTHORITY}", self.prefix)
	}

	/// Persists the record and its authority.
	pub fn write(&self, record: &TokenRecord) -> Result<(), StoreError> {
		store::set_json(self.store.as_ref(), &self.token_key(), record)?;
		self.store.set(&self.authority_key(), &record.authority)
	}

	/// Loads the stored record, if any.
	pub fn read(&self) -> Result<Option<TokenRecord>, StoreError> {
		store::get_json(self.store.as_ref(), &self.token_key())
	}

	/// Loads the stored authority, if any.
	pub fn authority(&self) -> Result<Option<String>, StoreError> {
		self.store.get(&self.authority_key())
	}

	/// Removes the record and authority.
	pub fn clear(&self) -> Result<(), StoreError> {
		self.store.delete(&self.token_key())?;
		self.store.delete(&self.authority_key())
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache").field("prefix", &self.prefix).finish()
	}
}
