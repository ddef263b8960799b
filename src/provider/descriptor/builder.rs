// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
	provider::{ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authority is required to attribute issued tokens.
	#[error("Missing authority.")]
	MissingAuthority,
	/// Authorization endpoint is required to start the redirect.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is required to exchange the code.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Client identifier is required on every request.
	#[error("Missing client identifier.")]
	MissingClientId,
	/// Redirect URI is required on every request.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Issuer authority.
	pub authority: Option<Url>,
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// Optional end-session endpoint.
	pub end_session_endpoint: Option<Url>,
	/// Registered client identifier.
	pub client_id: Option<String>,
	/// Registered redirect URI.
	pub redirect_uri: Option<Url>,
	/// Optional post-logout redirect URI.
	pub post_logout_redirect_uri: Option<Url>,
	/// Scopes merged into every request.
	pub default_scopes: ScopeSet,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier and OIDC default scopes.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			authority: None,
			authorization_endpoint: None,
			token_endpoint: None,
			end_session_endpoint: None,
			client_id: None,
			redirect_uri: None,
			post_logout_redirect_uri: None,
			default_scopes: ScopeSet::oidc_defaults(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the issuer authority.
	pub fn authority(mut self, url: Url) -> Self {
		self.authority = Some(url);

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the optional end-session endpoint.
	///
	/// Only validated and carried on the descriptor; sign-in never reads it.
	pub fn end_session_endpoint(mut self, url: Url) -> Self {
		self.end_session_endpoint = Some(url);

		self
	}

	/// Sets the registered client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Sets the optional post-logout redirect URI.
	///
	/// Only validated and carried on the descriptor; sign-in never reads it.
	pub fn post_logout_redirect_uri(mut self, url: Url) -> Self {
		self.post_logout_redirect_uri = Some(url);

		self
	}

	/// Replaces the default scopes.
	pub fn default_scopes(mut self, scopes: ScopeSet) -> Self {
		self.default_scopes = scopes;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authority = self.authority.ok_or(ProviderDescriptorError::MissingAuthority)?;
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let client_id = self
			.client_id
			.filter(|id| !id.trim().is_empty())
			.ok_or(ProviderDescriptorError::MissingClientId)?;
		let redirect_uri = self.redirect_uri.ok_or(ProviderDescriptorError::MissingRedirectUri)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			authority,
			endpoints: ProviderEndpoints {
				authorization,
				token,
				end_session: self.end_session_endpoint,
			},
			client_id,
			redirect_uri,
			post_logout_redirect_uri: self.post_logout_redirect_uri,
			default_scopes: self.default_scopes,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("authority", &self.authority)?;
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if let Some(end_session) = self.endpoints.end_session.as_ref() {
			validate_endpoint("end_session", end_session)?;
		}

		validate_endpoint("redirect", &self.redirect_uri)?;

		if let Some(post_logout) = self.post_logout_redirect_uri.as_ref() {
			validate_endpoint("post_logout_redirect", post_logout)?;
		}

		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderDescriptorError> {
	if delimiter.is_control() {
		Err(ProviderDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	fn complete() -> ProviderDescriptorBuilder {
		ProviderDescriptor::builder(ProviderId::new("idp").expect("Provider id should be valid."))
			.authority(url("https://idp.example.com"))
			.authorization_endpoint(url("https://idp.example.com/authorize"))
			.token_endpoint(url("https://idp.example.com/token"))
			.client_id("client-123")
			.redirect_uri(url("https://app.example.com/callback"))
	}

	#[test]
	fn complete_builder_produces_descriptor() {
		let descriptor = complete().build().expect("Complete builder should validate.");

		assert_eq!(descriptor.client_id, "client-123");
		assert_eq!(descriptor.default_scopes, ScopeSet::oidc_defaults());
		assert!(descriptor.endpoints.end_session.is_none());
	}

	#[test]
	fn missing_parts_are_reported() {
		let err = ProviderDescriptor::builder(ProviderId::new("idp").expect("Valid id."))
			.build()
			.expect_err("Empty builder must fail.");

		assert_eq!(err, ProviderDescriptorError::MissingAuthority);
		assert_eq!(
			complete().client_id("  ").build().expect_err("Blank client id must fail."),
			ProviderDescriptorError::MissingClientId
		);
	}

	#[test]
	fn plain_http_only_allowed_for_loopback() {
		let err = complete()
			.token_endpoint(url("http://idp.example.com/token"))
			.build()
			.expect_err("Remote HTTP endpoints must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
		assert!(complete().token_endpoint(url("http://127.0.0.1:8080/token")).build().is_ok());
		assert!(complete().redirect_uri(url("http://localhost:3000/cb")).build().is_ok());
		assert!(complete().token_endpoint(url("http://[::1]:8080/token")).build().is_ok());
	}

	#[test]
	fn control_character_delimiters_are_rejected() {
		let quirks = ProviderQuirks { scope_delimiter: '\n', ..Default::default() };
		let err = complete().quirks(quirks).build().expect_err("Control delimiter must fail.");

		assert_eq!(err, ProviderDescriptorError::InvalidScopeDelimiter { delimiter: '\n' });
	}
}
