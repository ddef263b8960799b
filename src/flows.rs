//! Redirect client facade and the flows it drives.

pub mod auth_code_pkce;
pub mod common;

pub use auth_code_pkce::*;
pub use common::*;

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	config::ClientOptions,
	crypto::{OsRandom, SecureRandom},
	host::Host,
	http::{TokenHttpClient, TransportErrorMapper},
	provider::ProviderDescriptor,
	store::{KeyValueStore, TokenCache},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestRedirectClient = RedirectClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs the Authorization Code + PKCE round trip against a single provider descriptor.
///
/// The client owns its collaborators explicitly: a session-scoped store for the in-flight
/// request, a durable store for the resulting token record, the host that performs
/// navigation, and the HTTP transport for the code exchange. Nothing is kept in memory
/// between the two page loads of a round trip.
#[derive(Clone)]
pub struct RedirectClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for the token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before they become `request_error` responses.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Behavior switches.
	pub options: ClientOptions,
	/// Host environment performing preflight facts and navigation.
	pub host: Arc<dyn Host>,
	/// Secure random source for PKCE, nonces, and correlation ids.
	pub random: Arc<dyn SecureRandom>,
	session: SessionCache,
	tokens: TokenCache,
}
impl<C, M> RedirectClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	///
	/// `session_store` should be scoped to the browsing tab; `durable_store` should survive
	/// restarts. Both are keyed under [`ClientOptions::store_prefix`].
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		options: ClientOptions,
		session_store: Arc<dyn KeyValueStore>,
		durable_store: Arc<dyn KeyValueStore>,
		host: Arc<dyn Host>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let session = SessionCache::new(session_store, options.store_prefix.clone());
		let tokens = TokenCache::new(durable_store, options.store_prefix.clone());

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			options,
			host,
			random: Arc::new(OsRandom),
			session,
			tokens,
		}
	}

	/// Replaces the secure random source.
	pub fn with_random(mut self, random: Arc<dyn SecureRandom>) -> Self {
		self.random = random;

		self
	}

	/// In-flight request cache.
	pub fn session(&self) -> &SessionCache {
		&self.session
	}

	/// Durable token cache.
	pub fn tokens(&self) -> &TokenCache {
		&self.tokens
	}

	/// Token record written by the last successful exchange, if any.
	pub fn cached_token_record(&self) -> Result<Option<TokenRecord>> {
		Ok(self.tokens.read()?)
	}
}
#[cfg(feature = "reqwest")]
impl RedirectClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client with its own reqwest-backed transport.
	pub fn new(
		descriptor: ProviderDescriptor,
		options: ClientOptions,
		session_store: Arc<dyn KeyValueStore>,
		durable_store: Arc<dyn KeyValueStore>,
		host: Arc<dyn Host>,
	) -> Self {
		Self::with_http_client(
			descriptor,
			options,
			session_store,
			durable_store,
			host,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for RedirectClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedirectClient")
			.field("descriptor", &self.descriptor)
			.field("options", &self.options)
			.field("session", &self.session)
			.field("tokens", &self.tokens)
			.finish()
	}
}
