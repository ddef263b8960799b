//! Client options and provider settings.
//!
//! [`ProviderSettings`] can be read from a JSON document (errors carry the offending field
//! path) or from `{PREFIX}_*` environment variables.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	error::ConfigError,
	provider::{ProviderDescriptor, ProviderDescriptorBuilder},
};

/// Behavior switches for a [`RedirectClient`](crate::flows::RedirectClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
	/// Prefix applied to every storage key.
	pub store_prefix: String,
	/// Window name prefix identifying popups opened by this client (`{prefix}.`).
	pub popup_name_prefix: String,
	/// Builds and persists the request but skips navigation.
	pub debug_do_not_redirect_on_signin: bool,
}
impl ClientOptions {
	/// Default storage key prefix.
	pub const DEFAULT_STORE_PREFIX: &'static str = "ip/";
	/// Default popup window name prefix.
	pub const DEFAULT_POPUP_NAME_PREFIX: &'static str = "auth";

	/// Overrides the storage key prefix.
	pub fn with_store_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.store_prefix = prefix.into();

		self
	}

	/// Enables or disables navigation suppression.
	pub fn with_debug_do_not_redirect_on_signin(mut self, enabled: bool) -> Self {
		self.debug_do_not_redirect_on_signin = enabled;

		self
	}
}
impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			store_prefix: Self::DEFAULT_STORE_PREFIX.into(),
			popup_name_prefix: Self::DEFAULT_POPUP_NAME_PREFIX.into(),
			debug_do_not_redirect_on_signin: false,
		}
	}
}

/// Deployment-specific provider registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
	/// Issuer authority.
	pub authority: Url,
	/// Registered client identifier.
	pub client_id: String,
	/// Registered redirect URI.
	pub redirect_uri: Url,
	/// Authorization endpoint.
	pub authorization_endpoint: Url,
	/// Token endpoint.
	pub token_endpoint: Url,
	/// Optional end-session endpoint.
	#[serde(default)]
	pub end_session_endpoint: Option<Url>,
	/// Optional post-logout redirect URI.
	#[serde(default)]
	pub post_logout_redirect_uri: Option<Url>,
}
impl ProviderSettings {
	/// Parses settings from a JSON document.
	pub fn from_json(document: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(document);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}

	/// Reads `{prefix}_AUTHORITY`, `{prefix}_CLIENT_ID`, `{prefix}_REDIRECT_URI`,
	/// `{prefix}_AUTHORIZATION_ENDPOINT`, `{prefix}_TOKEN_ENDPOINT`, and the optional
	/// `{prefix}_END_SESSION_ENDPOINT` and `{prefix}_POST_LOGOUT_REDIRECT_URI`.
	pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
		Self::from_lookup(prefix, |name| env::var(name).ok())
	}

	/// Same as [`ProviderSettings::from_env`] with a caller-supplied variable lookup.
	pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let reader = EnvReader { prefix, lookup };

		Ok(Self {
			authority: reader.url("AUTHORITY")?,
			client_id: reader.required("CLIENT_ID")?,
			redirect_uri: reader.url("REDIRECT_URI")?,
			authorization_endpoint: reader.url("AUTHORIZATION_ENDPOINT")?,
			token_endpoint: reader.url("TOKEN_ENDPOINT")?,
			end_session_endpoint: reader.optional_url("END_SESSION_ENDPOINT")?,
			post_logout_redirect_uri: reader.optional_url("POST_LOGOUT_REDIRECT_URI")?,
		})
	}

	/// Seeds a descriptor builder with these settings.
	pub fn into_builder(self, id: ProviderId) -> ProviderDescriptorBuilder {
		let mut builder = ProviderDescriptor::builder(id)
			.authority(self.authority)
			.client_id(self.client_id)
			.redirect_uri(self.redirect_uri)
			.authorization_endpoint(self.authorization_endpoint)
			.token_endpoint(self.token_endpoint);

		if let Some(url) = self.end_session_endpoint {
			builder = builder.end_session_endpoint(url);
		}
		if let Some(url) = self.post_logout_redirect_uri {
			builder = builder.post_logout_redirect_uri(url);
		}

		builder
	}
}

struct EnvReader<'a, F> {
	prefix: &'a str,
	lookup: F,
}
impl<F> EnvReader<'_, F>
where
	F: Fn(&str) -> Option<String>,
{
	fn name(&self, suffix: &str) -> String {
		format!("{}_{suffix}", self.prefix)
	}

	fn optional(&self, suffix: &str) -> Option<(String, String)> {
		let name = self.name(suffix);

		(self.lookup)(&name).filter(|value| !value.trim().is_empty()).map(|value| (name, value))
	}

	fn required(&self, suffix: &str) -> Result<String, ConfigError> {
		self.optional(suffix)
			.map(|(_, value)| value)
			.ok_or_else(|| ConfigError::MissingSetting { name: self.name(suffix) })
	}

	fn url(&self, suffix: &str) -> Result<Url, ConfigError> {
		self.optional_url(suffix)?.ok_or_else(|| ConfigError::MissingSetting { name: self.name(suffix) })
	}

	fn optional_url(&self, suffix: &str) -> Result<Option<Url>, ConfigError> {
		let Some((name, value)) = self.optional(suffix) else {
			return Ok(None);
		};

		Url::parse(value.trim()).map(Some).map_err(|source| ConfigError::InvalidUrl { name, source })
	}
}
