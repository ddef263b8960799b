//! Protocol results returned to callers as data.
//!
//! Callback and exchange failures never raise; they set the `error` field using either
//! the provider's own code or one of the client codes below.

// self
use crate::{
	_prelude::*,
	auth::{CorrelationId, TokenSecret},
	flows::auth_code_pkce::StateObject,
};

/// Callback is malformed or incomplete.
pub const INVALID_REQUEST: &str = "invalid_request";
/// Callback does not match the cached request.
pub const INVALID_STATE: &str = "invalid_state";
/// Token endpoint answered with a non-2xx status and no OAuth error body.
pub const REQUEST_FAILED: &str = "request_failed";
/// Token endpoint could not be reached or its answer could not be read.
pub const REQUEST_ERROR: &str = "request_error";

/// Classification of an `error` code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseErrorKind {
	/// [`INVALID_REQUEST`].
	InvalidRequest,
	/// [`INVALID_STATE`].
	InvalidState,
	/// Any code issued by the provider.
	Provider,
	/// [`REQUEST_FAILED`] or [`REQUEST_ERROR`].
	TokenExchangeFailed,
}
impl ResponseErrorKind {
	/// Classifies an `error` code.
	pub fn classify(code: &str) -> Self {
		match code {
			INVALID_REQUEST => Self::InvalidRequest,
			INVALID_STATE => Self::InvalidState,
			REQUEST_FAILED | REQUEST_ERROR => Self::TokenExchangeFailed,
			_ => Self::Provider,
		}
	}
}

/// Parameters read from the callback URL. Untrusted until validated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCodeResponse {
	/// OAuth error code.
	pub error: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
	/// Provider-specific error codes.
	pub error_codes: Option<String>,
	/// Authorization code.
	pub code: Option<String>,
	/// Returned `state` value.
	pub state: Option<String>,
	/// Provider timestamp, or the parse time as `YYYY-MM-DD HH:MM:SS UTC`.
	pub timestamp: String,
	/// Provider trace identifier.
	pub trace_id: Option<String>,
	/// Correlation identifier of the cached attempt.
	pub correlation_id: Option<CorrelationId>,
}
impl AuthCodeResponse {
	/// Returns `true` when an `error` is set.
	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}

	/// Classification of the `error`, if any.
	pub fn error_kind(&self) -> Option<ResponseErrorKind> {
		self.error.as_deref().map(ResponseErrorKind::classify)
	}

	pub(crate) fn reject(mut self, code: &str, description: &str) -> Self {
		self.error = Some(code.to_owned());
		self.error_description = Some(description.to_owned());

		self
	}
}

/// Result of the code exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
	/// Access token.
	pub access_token: Option<TokenSecret>,
	/// ID token.
	pub id_token: Option<TokenSecret>,
	/// Refresh token.
	pub refresh_token: Option<TokenSecret>,
	/// Token type, usually `Bearer`.
	pub token_type: Option<String>,
	/// Lifetime of the access token in seconds.
	pub expires_in: Option<u64>,
	/// Granted scopes as returned by the provider.
	pub scope: Option<String>,
	/// OAuth or client error code.
	pub error: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
	/// Provider error codes, comma-joined; HTTP status for [`REQUEST_FAILED`].
	pub error_codes: Option<String>,
	/// Provider timestamp, or the response time as `YYYY-MM-DD HH:MM:SS UTC`.
	pub timestamp: Option<String>,
	/// Provider trace identifier.
	pub trace_id: Option<String>,
	/// Correlation identifier of the attempt.
	pub correlation_id: Option<CorrelationId>,
	/// State object cached for the attempt.
	pub state_object: Option<StateObject>,
}
impl TokenResponse {
	/// Returns `true` when an `error` is set.
	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}

	/// Classification of the `error`, if any.
	pub fn error_kind(&self) -> Option<ResponseErrorKind> {
		self.error.as_deref().map(ResponseErrorKind::classify)
	}
}

/// Outcome of handling a redirect callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthResponse {
	/// The callback failed validation or carried a provider error; no exchange happened.
	Rejected(AuthCodeResponse),
	/// The code was exchanged; the response may still carry an exchange error.
	Token(TokenResponse),
}
impl AuthResponse {
	/// `error` code of whichever response is held.
	pub fn error(&self) -> Option<&str> {
		match self {
			AuthResponse::Rejected(response) => response.error.as_deref(),
			AuthResponse::Token(response) => response.error.as_deref(),
		}
	}

	/// Token response, when the exchange ran.
	pub fn token(&self) -> Option<&TokenResponse> {
		match self {
			AuthResponse::Token(response) => Some(response),
			AuthResponse::Rejected(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn error_codes_classify() {
		assert_eq!(ResponseErrorKind::classify("invalid_request"), ResponseErrorKind::InvalidRequest);
		assert_eq!(ResponseErrorKind::classify("invalid_state"), ResponseErrorKind::InvalidState);
		assert_eq!(ResponseErrorKind::classify("request_failed"), ResponseErrorKind::TokenExchangeFailed);
		assert_eq!(ResponseErrorKind::classify("request_error"), ResponseErrorKind::TokenExchangeFailed);
		assert_eq!(ResponseErrorKind::classify("access_denied"), ResponseErrorKind::Provider);
		assert_eq!(ResponseErrorKind::classify("invalid_grant"), ResponseErrorKind::Provider);
	}

	#[test]
	fn token_response_serializes_without_leaking_debug() {
		let response = TokenResponse {
			access_token: Some(TokenSecret::new("at-123")),
			expires_in: Some(3_600),
			..Default::default()
		};

		assert!(!format!("{response:?}").contains("at-123"));
		assert!(!response.is_error());
		assert_eq!(AuthResponse::Token(response.clone()).token(), Some(&response));
	}
}
