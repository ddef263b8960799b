//! Ready-made descriptors for the providers the client ships adapters for.

// self
use crate::{
	_prelude::*,
	auth::{OPENID_SCOPE, ProviderId, ScopeSet},
	config::ProviderSettings,
	error::ConfigError,
	provider::{CallbackLocation, ProviderDescriptor, ProviderQuirks, ResponseMode},
};

/// Facebook scope requesting the public profile.
pub const PUBLIC_PROFILE_SCOPE: &str = "public_profile";
/// Microsoft personal-account authority.
pub const MICROSOFT_CONSUMERS_AUTHORITY: &str = "https://login.microsoftonline.com/consumers";

/// Microsoft identity platform: `response_mode=query`, and the token form carries
/// `scope` and `grant_type`.
pub fn microsoft(settings: ProviderSettings) -> Result<ProviderDescriptor, ConfigError> {
	let quirks = ProviderQuirks {
		response_mode: Some(ResponseMode::Query),
		callback_location: CallbackLocation::Query,
		scope_delimiter: ' ',
		token_request_scope: true,
		token_request_grant_type: true,
		preserve_caller_state: false,
	};

	Ok(settings
		.into_builder(ProviderId::new("microsoft")?)
		.default_scopes(ScopeSet::oidc_defaults())
		.quirks(quirks)
		.build()?)
}

/// Microsoft personal accounts with the well-known `consumers` endpoints.
pub fn microsoft_consumers(
	client_id: impl Into<String>,
	redirect_uri: Url,
) -> Result<ProviderDescriptor, ConfigError> {
	let authority = parse_known("authority", MICROSOFT_CONSUMERS_AUTHORITY)?;
	let authorization_endpoint = parse_known(
		"authorization_endpoint",
		&format!("{MICROSOFT_CONSUMERS_AUTHORITY}/oauth2/v2.0/authorize"),
	)?;
	let token_endpoint =
		parse_known("token_endpoint", &format!("{MICROSOFT_CONSUMERS_AUTHORITY}/oauth2/v2.0/token"))?;
	let end_session_endpoint = parse_known(
		"end_session_endpoint",
		&format!("{MICROSOFT_CONSUMERS_AUTHORITY}/oauth2/v2.0/logout"),
	)?;

	microsoft(ProviderSettings {
		authority,
		client_id: client_id.into(),
		redirect_uri,
		authorization_endpoint,
		token_endpoint,
		end_session_endpoint: Some(end_session_endpoint),
		post_logout_redirect_uri: None,
	})
}

/// Facebook Login: no `response_mode`, no `grant_type` or `scope` in the token form, and
/// `openid public_profile` as default scopes.
pub fn facebook(settings: ProviderSettings) -> Result<ProviderDescriptor, ConfigError> {
	let quirks = ProviderQuirks {
		response_mode: None,
		callback_location: CallbackLocation::Query,
		scope_delimiter: ' ',
		token_request_scope: false,
		token_request_grant_type: false,
		preserve_caller_state: false,
	};

	Ok(settings
		.into_builder(ProviderId::new("facebook")?)
		.default_scopes(ScopeSet::new([OPENID_SCOPE, PUBLIC_PROFILE_SCOPE])?)
		.quirks(quirks)
		.build()?)
}

fn parse_known(name: &'static str, value: &str) -> Result<Url, ConfigError> {
	Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name: name.into(), source })
}
