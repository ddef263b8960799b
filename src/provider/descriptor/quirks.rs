// self
use crate::_prelude::*;

/// `response_mode` values accepted by authorization endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
	/// Parameters returned in the callback query string.
	Query,
	/// Parameters returned in the callback fragment.
	Fragment,
	/// Parameters POSTed to the redirect URI.
	FormPost,
}
impl ResponseMode {
	/// Wire value used in the authorization URL.
	pub fn as_str(self) -> &'static str {
		match self {
			ResponseMode::Query => "query",
			ResponseMode::Fragment => "fragment",
			ResponseMode::FormPost => "form_post",
		}
	}
}

/// Part of the callback URL carrying the authorization response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackLocation {
	/// `?code=...&state=...`
	#[default]
	Query,
	/// `#code=...&state=...` or `#/code=...`
	Fragment,
}

/// Provider-specific quirks that change wire parameters without changing the flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// `response_mode` sent on the authorization URL; omitted when `None`.
	pub response_mode: Option<ResponseMode>,
	/// Where the callback parser looks for response parameters.
	pub callback_location: CallbackLocation,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Sends the cached `scope` in the token request body.
	pub token_request_scope: bool,
	/// Sends `grant_type=authorization_code` in the token request body.
	pub token_request_grant_type: bool,
	/// Composes caller-supplied state with the library state as `library|caller`.
	pub preserve_caller_state: bool,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			response_mode: Some(ResponseMode::Query),
			callback_location: CallbackLocation::Query,
			scope_delimiter: ' ',
			token_request_scope: false,
			token_request_grant_type: true,
			preserve_caller_state: false,
		}
	}
}
