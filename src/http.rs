//! Transport primitives for the back-channel token exchange.
//!
//! The module exposes [`TokenHttpClient`] so downstream crates can plug in custom HTTP
//! stacks, and [`TransportErrorMapper`] so each stack can describe its own failures. The
//! exchange never raises transport errors; the mapper's [`TransportFailure`] becomes the
//! `request_error` description returned to the caller.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports capable of executing token requests.
///
/// The trait is the client's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so they can be shared behind `Arc`, and the handles they return
/// must own whatever state is required so their request futures remain `Send` for the
/// lifetime of the in-flight exchange.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single exchange.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for one outbound request.
	fn handle(&self) -> Self::Handle;
}

/// Coarse classification of a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportFailureKind {
	/// The request could not be built from the provided parts.
	Request,
	/// The connection could not be established.
	Connect,
	/// The request timed out.
	Timeout,
	/// Low-level I/O failure.
	Io,
	/// Anything the mapper could not classify.
	Other,
}

impl TransportFailureKind {
	/// Stable label, used as the `error_codes` value of a `request_error` response.
	pub const fn as_str(self) -> &'static str {
		match self {
			TransportFailureKind::Request => "request",
			TransportFailureKind::Connect => "connect",
			TransportFailureKind::Timeout => "timeout",
			TransportFailureKind::Io => "io",
			TransportFailureKind::Other => "other",
		}
	}
}

/// Description of a transport failure, surfaced as a `request_error` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportFailure {
	/// Failure classification.
	pub kind: TransportFailureKind,
	/// Human-readable message used as the error description.
	pub message: String,
}
impl TransportFailure {
	/// Creates a failure description.
	pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}
}
impl Display for TransportFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.message)
	}
}

/// Maps HTTP transport failures into [`TransportFailure`] descriptions.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Describes an [`HttpClientError`] emitted by the transport.
	fn map_transport_error(&self, error: HttpClientError<E>) -> TransportFailure;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints return results directly, so a custom [`ReqwestClient`] passed through
/// [`ReqwestHttpClient::with_client`] should not follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, error: HttpClientError<ReqwestError>) -> TransportFailure {
		match error {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => TransportFailure::new(
				TransportFailureKind::Request,
				format!("Failed to build the token request: {inner}."),
			),
			HttpClientError::Io(inner) => TransportFailure::new(
				TransportFailureKind::Io,
				format!("I/O error while calling the token endpoint: {inner}."),
			),
			HttpClientError::Other(message) => TransportFailure::new(
				TransportFailureKind::Other,
				format!("HTTP client error occurred while calling the token endpoint: {message}."),
			),
			_ => TransportFailure::new(
				TransportFailureKind::Other,
				"HTTP client error occurred while calling the token endpoint.",
			),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> TransportFailure {
	let kind = if err.is_builder() {
		TransportFailureKind::Request
	} else if err.is_timeout() {
		TransportFailureKind::Timeout
	} else if err.is_connect() {
		TransportFailureKind::Connect
	} else {
		TransportFailureKind::Other
	};

	TransportFailure::new(kind, format!("Request to the token endpoint failed: {err}."))
}
