//! Client-level error types raised before or outside the protocol round trip.
//!
//! Protocol failures (bad callback, state mismatch, rejected code exchange) are not
//! errors in this sense: they travel back to callers as data inside
//! [`AuthCodeResponse`](crate::flows::AuthCodeResponse) and
//! [`TokenResponse`](crate::flows::TokenResponse). The variants below cover the
//! conditions that must abort an attempt outright.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Preflight rejected the host environment.
	#[error(transparent)]
	Environment(#[from] EnvironmentError),
	/// Secure randomness is unavailable.
	#[error(transparent)]
	Crypto(#[from] CryptoError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Host environment failures raised synchronously before any state is persisted.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EnvironmentError {
	/// The host is not a browser-like environment.
	#[error("The current environment is not a browser environment.")]
	NotBrowser,
	/// The current frame is embedded in another document.
	#[error("Redirect is not supported in an iframe.")]
	EmbeddedFrame,
	/// The current window is a popup opened by this library.
	#[error("Sign-in is not supported in popups opened by the client.")]
	LibraryPopup {
		/// Window name that matched the popup prefix.
		window_name: String,
	},
	/// The host refused or failed to navigate.
	#[error("Navigation to the authorization endpoint failed: {reason}.")]
	NavigationFailed {
		/// Host-supplied reason string.
		reason: String,
	},
}

/// Cryptographic primitive failures; never degraded silently for PKCE material.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CryptoError {
	/// The secure random source could not produce bytes.
	#[error("Secure random source is unavailable: {message}.")]
	RandomUnavailable {
		/// Source-supplied failure description.
		message: String,
	},
	/// Code challenge parameters are incomplete.
	#[error("Please provide both a code challenge and code challenge method.")]
	MissingCodeChallenge,
	/// Code challenge method is not `S256`.
	#[error("Invalid code challenge method: {method}.")]
	UnsupportedChallengeMethod {
		/// Method supplied by the caller.
		method: String,
	},
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Provider descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Request scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// A required setting was not supplied.
	#[error("Setting `{name}` is missing.")]
	MissingSetting {
		/// Setting name (environment variable or field path).
		name: String,
	},
	/// A URL-valued setting could not be parsed.
	#[error("Setting `{name}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name (environment variable or field path).
		name: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A JSON configuration document failed to deserialize.
	#[error("Configuration document is invalid at `{path}`.")]
	Document {
		/// Path to the offending field.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// State object could not be serialized.
	#[error("State object could not be encoded.")]
	StateEncoding(#[source] serde_json::Error),
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Document { path, source: e.into_inner() }
	}
}
