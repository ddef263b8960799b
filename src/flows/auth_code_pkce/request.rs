//! Authorization request building.
//!
//! A caller's [`AuthCodeRequest`] is initialized (scopes, state, nonce, response type and
//! mode) into an [`InitializedAuthCodeRequest`], which then receives its PKCE pair to
//! become a [`PreparedAuthCodeRequest`]. Only the PKCE step can fail on randomness.

// self
use crate::{
	_prelude::*,
	auth::{CorrelationId, ScopeSet},
	crypto::{self, SecureRandom},
	error::{ConfigError, CryptoError},
	flows::auth_code_pkce::{
		InteractionType, PkceCodes, StateObject, build_state, compose_state, generate_pkce_codes,
	},
	host::Host,
	provider::{ProviderDescriptor, ResponseMode},
};

/// `response_type` values sent on the authorization URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
	/// Authorization code.
	#[default]
	Code,
}
impl ResponseType {
	/// Wire value.
	pub fn as_str(self) -> &'static str {
		match self {
			ResponseType::Code => "code",
		}
	}
}

/// Caller-supplied sign-in request; every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthCodeRequest {
	/// Scopes requested in addition to the provider defaults.
	pub scopes: ScopeSet,
	/// Page to return to after sign-in; defaults to the current page.
	pub redirect_start_page: Option<String>,
	/// Correlation identifier; generated when absent.
	pub correlation_id: Option<CorrelationId>,
	/// Nonce; generated when absent.
	pub nonce: Option<String>,
	/// Metadata echoed back in the state object.
	pub state_meta: Option<BTreeMap<String, String>>,
	/// Opaque caller state, composed in when the provider preserves it.
	pub caller_state: Option<String>,
}
impl AuthCodeRequest {
	/// Request for the provided scopes.
	pub fn new(scopes: ScopeSet) -> Self {
		Self { scopes, ..Default::default() }
	}

	/// Sets the page to return to.
	pub fn with_redirect_start_page(mut self, page: impl Into<String>) -> Self {
		self.redirect_start_page = Some(page.into());

		self
	}

	/// Sets the correlation identifier.
	pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
		self.correlation_id = Some(correlation_id);

		self
	}

	/// Sets the nonce.
	pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = Some(nonce.into());

		self
	}

	/// Adds a state metadata entry.
	pub fn with_state_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.state_meta.get_or_insert_with(BTreeMap::new).insert(key.into(), value.into());

		self
	}

	/// Sets opaque caller state.
	pub fn with_caller_state(mut self, state: impl Into<String>) -> Self {
		self.caller_state = Some(state.into());

		self
	}
}

/// Request with every derived field populated except PKCE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitializedAuthCodeRequest {
	/// Caller scopes merged with the provider defaults.
	pub scopes: ScopeSet,
	/// Always [`ResponseType::Code`].
	pub response_type: ResponseType,
	/// Provider response mode, if it declares one.
	pub response_mode: Option<ResponseMode>,
	/// State object with `encoded_state` set.
	pub state_object: StateObject,
	/// Nonce for the attempt.
	pub nonce: String,
	/// Correlation identifier for the attempt.
	pub correlation_id: CorrelationId,
}
impl InitializedAuthCodeRequest {
	/// Exact `state` parameter value.
	pub fn state(&self) -> &str {
		self.state_object.encoded_state.as_deref().unwrap_or_default()
	}
}

/// Initialized request carrying its PKCE pair; ready for URL building and persistence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedAuthCodeRequest {
	/// Initialized request.
	pub request: InitializedAuthCodeRequest,
	/// PKCE pair for the attempt.
	pub pkce_codes: PkceCodes,
}

/// Populates scopes, state, nonce, and response parameters.
///
/// Reads the host's current URL for the default `redirect_start_page`; otherwise free of
/// side effects.
pub fn initialize_auth_code_request(
	descriptor: &ProviderDescriptor,
	host: &dyn Host,
	random: &dyn SecureRandom,
	request: AuthCodeRequest,
	interaction_type: InteractionType,
) -> Result<InitializedAuthCodeRequest, ConfigError> {
	tracing::trace!("Initializing auth code request.");

	let AuthCodeRequest {
		scopes,
		redirect_start_page,
		correlation_id,
		nonce,
		state_meta,
		caller_state,
	} = request;
	let scopes = scopes.union(&descriptor.default_scopes);
	let correlation_id = correlation_id.unwrap_or_else(|| {
		CorrelationId::from_guid(crypto::generate_guid_or_fallback(random, "correlation_id"))
	});
	let redirect_start_page = match (interaction_type, redirect_start_page) {
		(_, Some(page)) => Some(page),
		(InteractionType::Redirect, None) => Some(host.current_url().to_string()),
	};
	let mut state_object =
		build_state(correlation_id.clone(), interaction_type, redirect_start_page, state_meta)?;

	if descriptor.quirks.preserve_caller_state {
		state_object.encoded_state = state_object
			.encoded_state
			.as_deref()
			.map(|library| compose_state(library, caller_state.as_deref()));
	}

	let nonce = nonce.unwrap_or_else(|| {
		crypto::generate_guid_or_fallback(random, "nonce").hyphenated().to_string()
	});

	Ok(InitializedAuthCodeRequest {
		scopes,
		response_type: ResponseType::Code,
		response_mode: descriptor.quirks.response_mode,
		state_object,
		nonce,
		correlation_id,
	})
}

/// Attaches a fresh PKCE pair. Fails without fallback when secure randomness is unavailable.
pub fn generate_pkce_params(
	request: InitializedAuthCodeRequest,
	random: &dyn SecureRandom,
) -> Result<PreparedAuthCodeRequest, CryptoError> {
	tracing::trace!("Generating PKCE parameters.");

	let pkce_codes = generate_pkce_codes(random)?;

	Ok(PreparedAuthCodeRequest { request, pkce_codes })
}
