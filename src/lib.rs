//! Authorization Code + PKCE redirect client for browser-like hosts.
//!
//! One interactive sign-in round trip per provider: signed state and a PKCE pair are
//! persisted before navigating away, and the callback is validated against them before
//! the code is exchanged for tokens over a back-channel POST.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod flows;
pub mod host;
pub mod http;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientOptions,
		flows::RedirectClient,
		host::StaticHost,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		provider::ProviderDescriptor,
		store::{KeyValueStore, MemoryStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = RedirectClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Handles returned alongside a test client so assertions can inspect side effects.
	pub struct TestHarness {
		/// Session-scoped store holding the in-flight request record.
		pub session: Arc<MemoryStore>,
		/// Durable store holding the token record.
		pub durable: Arc<MemoryStore>,
		/// Host double recording navigations.
		pub host: Arc<StaticHost>,
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`RedirectClient`] backed by in-memory stores, a top-level browser host
	/// sitting on `current_url`, and the reqwest transport used across integration tests.
	pub fn build_reqwest_test_client(
		descriptor: ProviderDescriptor,
		current_url: &str,
	) -> (ReqwestTestClient, TestHarness) {
		let session = Arc::new(MemoryStore::default());
		let durable = Arc::new(MemoryStore::default());
		let host = Arc::new(StaticHost::browser(
			Url::parse(current_url).expect("Test host URL should parse successfully."),
		));
		let session_store: Arc<dyn KeyValueStore> = session.clone();
		let durable_store: Arc<dyn KeyValueStore> = durable.clone();
		let client = RedirectClient::with_http_client(
			descriptor,
			ClientOptions::default(),
			session_store,
			durable_store,
			host.clone(),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(client, TestHarness { session, durable, host })
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
