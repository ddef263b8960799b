//! Provider descriptor data structures shared by every step of the flow.
//!
//! A descriptor is the only place provider divergence lives: endpoints, client
//! registration, default scopes, and the [`ProviderQuirks`] that adjust wire parameters.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
};

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is sent to.
	pub authorization: Url,
	/// Token endpoint used for the back-channel exchange.
	pub token: Url,
	/// Optional end-session (logout) endpoint.
	///
	/// Validated and carried for the host application's own sign-out; no flow reads it.
	pub end_session: Option<Url>,
}

/// Immutable provider descriptor consumed by the redirect client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Issuer authority recorded alongside issued tokens.
	pub authority: Url,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Registered client identifier.
	pub client_id: String,
	/// Registered redirect URI.
	pub redirect_uri: Url,
	/// Redirect URI used after logout, if registered.
	///
	/// Carried alongside [`ProviderEndpoints::end_session`] for the host application's own
	/// sign-out.
	pub post_logout_redirect_uri: Option<Url>,
	/// Scopes merged into every request.
	pub default_scopes: ScopeSet,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}
}
