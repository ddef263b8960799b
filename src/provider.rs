//! Provider-facing descriptors and the presets built on them.
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, client registration, default scopes, and provider quirks (response mode,
//! callback location, scope delimiter, token form parameters). `presets` assembles
//! descriptors for the providers the client ships adapters for.

pub mod descriptor;
pub mod presets;

pub use descriptor::*;
pub use presets::*;
