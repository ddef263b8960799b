//! State object codec.
//!
//! The library state is the standard base64 encoding of the state object's JSON (without
//! its own `encodedState` field). Providers that must carry caller state receive
//! `library|caller`; only the library part is ever decoded.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::CorrelationId, error::ConfigError};

/// Separator between library and caller state.
pub const CALLER_STATE_DELIMITER: char = '|';

/// How the authorization response is collected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
	/// Full-page redirect to the provider and back.
	#[default]
	Redirect,
}

/// Library state carried through the provider round trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateObject {
	/// Correlation identifier for the attempt.
	pub correlation_id: CorrelationId,
	/// Interaction that started the attempt.
	pub interaction_type: InteractionType,
	/// Page to return to once the flow completes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirect_start_page: Option<String>,
	/// Caller metadata echoed back after the round trip.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub meta: Option<BTreeMap<String, String>>,
	/// Exact `state` value placed on the authorization URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub encoded_state: Option<String>,
}
impl StateObject {
	/// Library part of [`StateObject::encoded_state`].
	pub fn library_state(&self) -> Option<&str> {
		self.encoded_state.as_deref().map(|value| split_state(value).0)
	}

	/// Caller part of [`StateObject::encoded_state`], if one was composed in.
	pub fn caller_state(&self) -> Option<&str> {
		self.encoded_state.as_deref().and_then(|value| split_state(value).1)
	}
}

/// Errors raised while decoding a `state` value.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StateDecodeError {
	/// The library part is not valid base64.
	#[error("State is not valid base64: {message}.")]
	Base64 {
		/// Decoder message.
		message: String,
	},
	/// The decoded bytes are not a state object.
	#[error("State is not a valid state object: {message}.")]
	Json {
		/// Parser message.
		message: String,
	},
}

/// Builds a state object and sets its `encoded_state`.
pub fn build_state(
	correlation_id: CorrelationId,
	interaction_type: InteractionType,
	redirect_start_page: Option<String>,
	meta: Option<BTreeMap<String, String>>,
) -> Result<StateObject, ConfigError> {
	let mut state = StateObject {
		correlation_id,
		interaction_type,
		redirect_start_page,
		meta,
		encoded_state: None,
	};

	state.encoded_state = Some(encode_state(&state)?);

	Ok(state)
}

/// Encodes the library state; `encoded_state` itself is never part of the payload.
pub fn encode_state(state: &StateObject) -> Result<String, ConfigError> {
	let payload = StateObject { encoded_state: None, ..state.clone() };
	let json = serde_json::to_vec(&payload).map_err(ConfigError::StateEncoding)?;

	Ok(STANDARD.encode(json))
}

/// Decodes a `state` value, ignoring any caller part.
///
/// The returned object's `encoded_state` equals `encoded`.
pub fn decode_state(encoded: &str) -> Result<StateObject, StateDecodeError> {
	let (library, _) = split_state(encoded);
	let bytes = STANDARD
		.decode(library)
		.map_err(|e| StateDecodeError::Base64 { message: e.to_string() })?;
	let mut state: StateObject = serde_json::from_slice(&bytes)
		.map_err(|e| StateDecodeError::Json { message: e.to_string() })?;

	state.encoded_state = Some(encoded.to_owned());

	Ok(state)
}

/// Joins library and caller state; without caller state the library state is returned as is.
pub fn compose_state(library: &str, caller: Option<&str>) -> String {
	match caller {
		Some(caller) if !caller.is_empty() =>
			format!("{library}{CALLER_STATE_DELIMITER}{caller}"),
		_ => library.to_owned(),
	}
}

/// Splits a composed state at the first delimiter.
pub fn split_state(value: &str) -> (&str, Option<&str>) {
	match value.split_once(CALLER_STATE_DELIMITER) {
		Some((library, caller)) => (library, Some(caller)),
		None => (value, None),
	}
}
