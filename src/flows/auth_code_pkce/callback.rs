//! Callback parsing and validation.
//!
//! The callback URL is untrusted input. [`parse_auth_code_response`] reads it without
//! judging it; [`validate_auth_code_response`] compares it against the cached
//! [`SessionRecord`] and sets the first failure as the response's `error`.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	flows::{
		RedirectClient,
		auth_code_pkce::{
			AuthCodeResponse, AuthResponse, INVALID_REQUEST, INVALID_STATE, SessionRecord,
			StateObject,
		},
		common,
	},
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::CallbackLocation,
};

/// Reads the authorization response parameters from `url`.
///
/// Parameters come from the query or the fragment depending on `location`; a repeated
/// parameter keeps its first value. A missing `timestamp` is filled with the parse time.
/// The correlation identifier is taken from the cached state, never from the URL.
pub fn parse_auth_code_response(
	url: &Url,
	location: CallbackLocation,
	cached_state: Option<&StateObject>,
) -> AuthCodeResponse {
	tracing::trace!(?location, "Parsing auth code response.");

	let raw = match location {
		CallbackLocation::Query => url.query().unwrap_or_default(),
		CallbackLocation::Fragment => {
			let fragment = url.fragment().unwrap_or_default();

			fragment.strip_prefix('/').unwrap_or(fragment)
		},
	};
	let mut params = HashMap::new();

	for (name, value) in form_urlencoded::parse(raw.as_bytes()) {
		params.entry(name.into_owned()).or_insert_with(|| value.into_owned());
	}

	let mut take = |name: &str| params.remove(name);

	AuthCodeResponse {
		error: take("error"),
		error_description: take("error_description"),
		error_codes: take("error_codes"),
		code: take("code"),
		state: take("state"),
		timestamp: take("timestamp").unwrap_or_else(common::utc_timestamp_now),
		trace_id: take("trace_id"),
		correlation_id: cached_state.map(|state| state.correlation_id.clone()),
	}
}

/// Validates a parsed response against the cached request.
///
/// Checks run in a fixed order and the first failure wins. A response that already carries
/// a provider `error` is returned untouched, except that a description or error codes
/// without an `error` are promoted to `invalid_request`.
pub fn validate_auth_code_response(
	mut response: AuthCodeResponse,
	cached: &SessionRecord,
) -> AuthCodeResponse {
	tracing::trace!("Validating auth code response.");

	if response.error.is_none()
		&& (response.error_description.is_some() || response.error_codes.is_some())
	{
		response.error = Some(INVALID_REQUEST.to_owned());

		return response;
	}
	if response.error.is_some() {
		return response;
	}
	if response.code.as_deref().is_none_or(str::is_empty) {
		return response.reject(INVALID_REQUEST, "Failed to retrieve auth code from url");
	}
	if cached.scope.is_empty() {
		return response.reject(INVALID_STATE, "Scope not present in cache");
	}

	let Some(state) = response.state.clone().filter(|state| !state.is_empty()) else {
		return response.reject(INVALID_REQUEST, "Failed to retrieve state from url");
	};
	let Some(cached_state) = cached
		.state_object
		.as_ref()
		.and_then(|object| object.encoded_state.as_deref())
		.filter(|encoded| !encoded.is_empty())
	else {
		return response.reject(INVALID_STATE, "State not present in cache");
	};

	if state != cached_state {
		return response.reject(INVALID_STATE, "State mismatch");
	}
	if cached.pkce_codes.as_ref().is_none_or(|codes| codes.code_verifier.is_empty()) {
		return response.reject(INVALID_STATE, "Code verifier not present in cache");
	}

	response
}

impl<C, M> RedirectClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Completes the round trip using the host's current URL.
	pub async fn handle_redirect_callback(&self) -> Result<AuthResponse> {
		let url = self.host.current_url();

		self.handle_redirect_callback_url(&url).await
	}

	/// Completes the round trip for an explicit callback URL.
	///
	/// A rejected callback clears the in-flight record and is returned as
	/// [`AuthResponse::Rejected`]. A valid one is exchanged for tokens. Either way the
	/// in-flight record is gone once this returns `Ok`.
	pub async fn handle_redirect_callback_url(&self, url: &Url) -> Result<AuthResponse> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "handle_redirect_callback");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let cached = match self.session.read() {
					Ok(cached) => cached,
					Err(e) => {
						tracing::error!(error = %e, "Failed to read in-flight request; clearing it.");

						if let Err(clear_error) = self.session.clear() {
							tracing::error!(
								error = %clear_error,
								"Failed to clear in-flight request after a failed read."
							);
						}

						return Err(e.into());
					},
				};
				let parsed = parse_auth_code_response(
					url,
					self.descriptor.quirks.callback_location,
					cached.state_object.as_ref(),
				);
				let response = validate_auth_code_response(parsed, &cached);

				if response.is_error() {
					tracing::warn!(
						error = response.error.as_deref(),
						error_description = response.error_description.as_deref(),
						"Auth code response rejected."
					);

					self.session.clear()?;

					return Ok(AuthResponse::Rejected(response));
				}

				tracing::debug!(
					correlation_id = ?response.correlation_id,
					"Auth code response accepted."
				);

				let token = self.exchange_auth_code_for_token(&response, &cached).await?;

				Ok(AuthResponse::Token(token))
			})
			.await;

		match &result {
			Ok(response) if response.error().is_none() =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			_ => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
