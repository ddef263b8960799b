//! Back-channel authorization code exchange.
//!
//! Every outcome of the POST is returned as a [`TokenResponse`]: provider errors pass
//! through verbatim, non-2xx answers without an OAuth error body become `request_failed`,
//! and transport or decoding failures become `request_error`. Only storage failures
//! raise.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, Request, StatusCode,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::{Deserializer, de::Error as _};
use serde_json::Value;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord, TokenSecret},
	flows::{
		RedirectClient,
		auth_code_pkce::{
			AuthCodeResponse, REQUEST_ERROR, REQUEST_FAILED, SessionRecord, TokenResponse,
		},
		common,
	},
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
};

/// `Content-Type` of the token request.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Presence of one token endpoint field on the wire.
///
/// A key that was never sent, a key sent as `null`, a key carrying a value of the wrong
/// type, and a key carrying a usable value (even an empty one) decode to different
/// variants. A mistyped key never fails the whole body. Only [`WireField::Present`]
/// reaches the [`TokenResponse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireField<T> {
	/// The key was not sent.
	Absent,
	/// The key was sent as `null`.
	Null,
	/// The key carried a value of the wrong type.
	Mistyped,
	/// The key carried a value.
	Present(T),
}
impl<T> WireField<T> {
	/// Returns `true` for [`WireField::Present`].
	pub fn is_present(&self) -> bool {
		matches!(self, WireField::Present(_))
	}

	/// Returns `true` for [`WireField::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, WireField::Null)
	}

	/// Maps the carried value.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WireField<U> {
		match self {
			WireField::Absent => WireField::Absent,
			WireField::Null => WireField::Null,
			WireField::Mistyped => WireField::Mistyped,
			WireField::Present(value) => WireField::Present(f(value)),
		}
	}

	/// Carried value; `None` for absent, null, and mistyped keys alike.
	pub fn into_option(self) -> Option<T> {
		match self {
			WireField::Present(value) => Some(value),
			WireField::Absent | WireField::Null | WireField::Mistyped => None,
		}
	}

	fn unusable(&self) -> Option<&'static str> {
		match self {
			WireField::Null => Some("null"),
			WireField::Mistyped => Some("mistyped"),
			WireField::Absent | WireField::Present(_) => None,
		}
	}
}
impl<T> Default for WireField<T> {
	fn default() -> Self {
		WireField::Absent
	}
}
impl<'de, T> Deserialize<'de> for WireField<T>
where
	T: Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(match Value::deserialize(deserializer)? {
			Value::Null => WireField::Null,
			value => T::deserialize(value).map_or(WireField::Mistyped, WireField::Present),
		})
	}
}

/// `expires_in` as sent by providers that quote it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ExpiresIn(u64);
impl<'de> Deserialize<'de> for ExpiresIn {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Number(u64),
			Text(String),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Number(seconds) => Ok(Self(seconds)),
			Raw::Text(text) => text
				.trim()
				.parse()
				.map(Self)
				.map_err(|_| D::Error::custom(format!("expires_in `{text}` is not a number"))),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct WireTokenResponse {
	#[serde(default)]
	access_token: WireField<String>,
	#[serde(default)]
	id_token: WireField<String>,
	#[serde(default)]
	refresh_token: WireField<String>,
	#[serde(default)]
	token_type: WireField<String>,
	#[serde(default)]
	expires_in: WireField<ExpiresIn>,
	#[serde(default)]
	scope: WireField<String>,
	#[serde(default)]
	error: WireField<String>,
	#[serde(default)]
	error_description: WireField<String>,
	#[serde(default)]
	error_codes: WireField<Value>,
	#[serde(default)]
	timestamp: WireField<String>,
	#[serde(default)]
	trace_id: WireField<String>,
}
impl WireTokenResponse {
	fn unusable_fields(&self) -> Vec<(&'static str, &'static str)> {
		[
			("access_token", self.access_token.unusable()),
			("id_token", self.id_token.unusable()),
			("refresh_token", self.refresh_token.unusable()),
			("token_type", self.token_type.unusable()),
			("expires_in", self.expires_in.unusable()),
			("scope", self.scope.unusable()),
			("error", self.error.unusable()),
			("error_description", self.error_description.unusable()),
			("error_codes", self.error_codes.unusable()),
			("timestamp", self.timestamp.unusable()),
			("trace_id", self.trace_id.unusable()),
		]
		.into_iter()
		.filter_map(|(name, reason)| reason.map(|reason| (name, reason)))
		.collect()
	}

	fn into_response(self) -> TokenResponse {
		let unusable_fields = self.unusable_fields();

		if !unusable_fields.is_empty() {
			tracing::debug!(
				?unusable_fields,
				"Token response sent null or mistyped fields; treating them as unset."
			);
		}

		TokenResponse {
			access_token: self.access_token.map(TokenSecret::new).into_option(),
			id_token: self.id_token.map(TokenSecret::new).into_option(),
			refresh_token: self.refresh_token.map(TokenSecret::new).into_option(),
			token_type: self.token_type.into_option(),
			expires_in: self.expires_in.map(|ExpiresIn(seconds)| seconds).into_option(),
			scope: self.scope.into_option(),
			error: self.error.into_option(),
			error_description: self.error_description.into_option(),
			error_codes: self.error_codes.into_option().and_then(join_error_codes),
			timestamp: self.timestamp.into_option(),
			trace_id: self.trace_id.into_option(),
			..Default::default()
		}
	}
}

/// Builds the URL-encoded token request body.
///
/// Fields are written in the order `client_id`, `scope`, `code`, `redirect_uri`,
/// `grant_type`, `code_verifier`; `scope` and `grant_type` follow the provider quirks.
pub fn build_token_request_form(
	descriptor: &ProviderDescriptor,
	code: &str,
	scope: &ScopeSet,
	code_verifier: &str,
) -> String {
	let mut form = form_urlencoded::Serializer::new(String::new());

	form.append_pair("client_id", &descriptor.client_id);

	if descriptor.quirks.token_request_scope
		&& let Some(scope) = common::format_scope(scope, descriptor.quirks.scope_delimiter)
	{
		form.append_pair("scope", &scope);
	}

	form.append_pair("code", code);
	form.append_pair("redirect_uri", descriptor.redirect_uri.as_str());

	if descriptor.quirks.token_request_grant_type {
		form.append_pair("grant_type", AUTHORIZATION_CODE_GRANT);
	}

	form.append_pair("code_verifier", code_verifier);

	form.finish()
}

impl<C, M> RedirectClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges a validated code for tokens.
	///
	/// On success the token record is written to the durable store. The in-flight record
	/// is cleared whatever the outcome; a clear or write failure is raised after the clear
	/// has been attempted.
	pub async fn exchange_auth_code_for_token(
		&self,
		response: &AuthCodeResponse,
		cached: &SessionRecord,
	) -> Result<TokenResponse> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		let span = FlowSpan::new(KIND, "exchange_auth_code_for_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				tracing::trace!(correlation_id = ?response.correlation_id, "Exchanging auth code.");

				let issued_at = OffsetDateTime::now_utc();
				let mut token = self.request_token(response, cached).await;

				token.correlation_id = response.correlation_id.clone();
				token.timestamp.get_or_insert_with(|| common::utc_timestamp(issued_at));

				if token.is_error() {
					self.session.clear()?;

					return Ok(token);
				}

				let record = TokenRecord::builder(self.descriptor.authority.as_str())
					.issued_at(issued_at)
					.expires_in(token.expires_in)
					.id_token(token.id_token.clone())
					.access_token(token.access_token.clone())
					.refresh_token(token.refresh_token.clone())
					.build();
				let record = match record {
					Ok(record) => record,
					Err(e) => {
						tracing::warn!(error = %e, "Token response carried an unusable expiry.");

						token = TokenResponse {
							error: Some(REQUEST_ERROR.to_owned()),
							error_description: Some(e.to_string()),
							correlation_id: token.correlation_id,
							timestamp: token.timestamp,
							trace_id: token.trace_id,
							..Default::default()
						};

						self.session.clear()?;

						return Ok(token);
					},
				};
				let written = self.tokens.write(&record);

				self.session.clear()?;
				written?;

				token.state_object = cached.state_object.clone();

				tracing::debug!(
					correlation_id = ?token.correlation_id,
					expires_at = ?record.expires_at,
					"Auth code exchanged."
				);

				Ok(token)
			})
			.await;

		match &result {
			Ok(token) if !token.is_error() => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			_ => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn request_token(&self, response: &AuthCodeResponse, cached: &SessionRecord) -> TokenResponse {
		let body = build_token_request_form(
			&self.descriptor,
			response.code.as_deref().unwrap_or_default(),
			&cached.scope,
			cached.pkce_codes.as_ref().map(|codes| codes.code_verifier.expose()).unwrap_or_default(),
		);
		let request = Request::builder()
			.method(Method::POST)
			.uri(self.descriptor.endpoints.token.as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(ACCEPT, "application/json")
			.body(body.into_bytes());
		let request = match request {
			Ok(request) => request,
			Err(e) => {
				tracing::error!(error = %e, "Failed to build the token request.");

				return failure(
					REQUEST_ERROR,
					format!("Failed to build the token request: {e}."),
					None,
				);
			},
		};
		let handle = self.http_client.handle();

		match handle.call(request).await {
			Ok(http_response) => {
				let token = read_token_response(http_response.status(), http_response.body());

				if let Some(error) = token.error.as_deref() {
					tracing::warn!(
						status = http_response.status().as_u16(),
						error,
						error_description = token.error_description.as_deref(),
						"Token endpoint rejected the auth code."
					);
				}

				token
			},
			Err(e) => {
				let transport = self.transport_mapper.map_transport_error(e);

				tracing::error!(kind = transport.kind.as_str(), error = %transport, "Token request failed.");

				failure(REQUEST_ERROR, transport.message, Some(transport.kind.as_str().to_owned()))
			},
		}
	}
}

/// Interprets a token endpoint answer.
fn read_token_response(status: StatusCode, body: &[u8]) -> TokenResponse {
	let parsed = serde_json::from_slice::<WireTokenResponse>(body);

	if status.is_success() {
		return match parsed {
			Ok(wire) => wire.into_response(),
			Err(e) => failure(
				REQUEST_ERROR,
				format!("Token response could not be decoded: {e}."),
				Some(status.as_u16().to_string()),
			),
		};
	}

	match parsed {
		Ok(wire) if wire.error.is_present() => wire.into_response(),
		_ => failure(
			REQUEST_FAILED,
			status.canonical_reason().unwrap_or_default().to_owned(),
			Some(status.as_u16().to_string()),
		),
	}
}

fn failure(code: &str, description: String, error_codes: Option<String>) -> TokenResponse {
	TokenResponse {
		error: Some(code.to_owned()),
		error_description: Some(description),
		error_codes,
		..Default::default()
	}
}

fn join_error_codes(value: Value) -> Option<String> {
	let scalar = |value: Value| match value {
		Value::Null => None,
		Value::String(text) => Some(text),
		other => Some(other.to_string()),
	};

	match value {
		Value::Array(items) => {
			let joined = items.into_iter().filter_map(scalar).collect::<Vec<_>>().join(",");

			(!joined.is_empty()).then_some(joined)
		},
		other => scalar(other),
	}
}
