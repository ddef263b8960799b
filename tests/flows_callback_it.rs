#![cfg(feature = "reqwest")]

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use httpmock::prelude::*;
// self
use oauth2_redirect::{
	_preludet::*,
	auth::{ProviderId, ScopeSet},
	config::ClientOptions,
	flows::{
		AuthCodeRequest, AuthResponse, FORM_CONTENT_TYPE, INVALID_STATE, REQUEST_ERROR,
		REQUEST_FAILED, RedirectClient, build_token_request_form,
	},
	host::StaticHost,
	http::ReqwestTransportErrorMapper,
	provider::ProviderDescriptor,
	store::{KeyValueStore, MemoryStore, StoreError, StoreListener, SubscriptionId},
	url::form_urlencoded,
};

const CLIENT_ID: &str = "client-it";
const START_PAGE: &str = "https://app.example.com/inbox";
const CALLBACK: &str = "https://app.example.com/callback";

fn build_descriptor(token_endpoint: &str) -> ProviderDescriptor {
	ProviderDescriptor::builder(
		ProviderId::new("mock-http").expect("Provider identifier should be valid."),
	)
	.authority(Url::parse("https://idp.example.com/common").expect("Authority should parse."))
	.authorization_endpoint(
		Url::parse("https://idp.example.com/authorize").expect("Authorization endpoint should parse."),
	)
	.token_endpoint(Url::parse(token_endpoint).expect("Token endpoint should parse."))
	.client_id(CLIENT_ID)
	.redirect_uri(Url::parse(CALLBACK).expect("Redirect should parse."))
	.build()
	.expect("Provider descriptor should build successfully.")
}

/// Starts a sign-in and returns the `state` the provider would echo back.
fn start_sign_in(client: &ReqwestTestClient) -> String {
	let request =
		AuthCodeRequest::new(ScopeSet::new(["email"]).expect("Scope set should be valid."))
			.with_state_meta("returnTo", "/inbox");
	let redirect = client.get_auth_code(Some(request)).expect("Redirect should start.");

	redirect
		.url
		.query_pairs()
		.find(|(name, _)| name == "state")
		.map(|(_, value)| value.into_owned())
		.expect("Authorization URL should carry a state.")
}

fn callback_url(params: &[(&str, &str)]) -> Url {
	let query = form_urlencoded::Serializer::new(String::new()).extend_pairs(params).finish();

	Url::parse(&format!("{CALLBACK}?{query}")).expect("Callback URL should parse.")
}

/// Session store whose reads of one key fail once `failing` is switched on.
struct UnreadableKeyStore {
	inner: MemoryStore,
	failing_suffix: &'static str,
	failing: AtomicBool,
}
impl KeyValueStore for UnreadableKeyStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		if self.failing.load(Ordering::SeqCst) && key.ends_with(self.failing_suffix) {
			return Err(StoreError::Backend { message: "storage area unavailable".into() });
		}

		self.inner.get(key)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.inner.set(key, value)
	}

	fn delete(&self, key: &str) -> Result<(), StoreError> {
		self.inner.delete(key)
	}

	fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
		self.inner.subscribe(listener)
	}

	fn unsubscribe(&self, id: SubscriptionId) -> bool {
		self.inner.unsubscribe(id)
	}
}

fn assert_session_cleared(harness: &TestHarness) {
	for key in ["ip/scope", "ip/state-object", "ip/pkce-codes"] {
		assert_eq!(
			harness.session.get(key).expect("Session read should succeed."),
			None,
			"`{key}` should be cleared."
		);
	}
}

#[tokio::test]
async fn successful_round_trip_persists_tokens_and_clears_session() {
	let server = MockServer::start_async().await;
	let (client, harness) =
		build_reqwest_test_client(build_descriptor(&server.url("/token")), START_PAGE);
	let state = start_sign_in(&client);
	let cached = client.session().read().expect("Session record should load.");
	let verifier = cached.pkce_codes.as_ref().expect("PKCE codes should be cached.").code_verifier.clone();
	let expected_body =
		build_token_request_form(&client.descriptor, "code-123", &cached.scope, verifier.expose());

	assert!(expected_body.ends_with(&format!("code_verifier={}", verifier.expose())));

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", FORM_CONTENT_TYPE)
				.body(expected_body.as_str());
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-success\",\"id_token\":\"id-success\",\"refresh_token\":\"refresh-success\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"scope\":\"email openid profile\"}",
			);
		})
		.await;

	harness.host.land_on(callback_url(&[("code", "code-123"), ("state", &state)]));

	let response = client.handle_redirect_callback().await.expect("Callback should be handled.");

	mock.assert_async().await;

	let token = match response {
		AuthResponse::Token(token) => token,
		other => panic!("Unexpected callback outcome: {other:?}."),
	};

	assert!(!token.is_error(), "Unexpected exchange error: {token:?}.");
	assert_eq!(token.access_token.as_ref().map(|secret| secret.expose()), Some("access-success"));
	assert_eq!(token.expires_in, Some(3_600));
	assert_eq!(token.correlation_id, cached.state_object.as_ref().map(|s| s.correlation_id.clone()));
	assert_eq!(
		token
			.state_object
			.as_ref()
			.and_then(|state| state.meta.as_ref())
			.and_then(|meta| meta.get("returnTo"))
			.map(String::as_str),
		Some("/inbox")
	);
	assert_session_cleared(&harness);

	let record = client
		.cached_token_record()
		.expect("Token record read should succeed.")
		.expect("Token record should be persisted.");

	assert_eq!(record.authority, "https://idp.example.com/common");
	assert_eq!(record.access_token.as_ref().map(|secret| secret.expose()), Some("access-success"));
	assert_eq!(record.id_token.as_ref().map(|secret| secret.expose()), Some("id-success"));
	assert_eq!(record.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-success"));

	let expires_at = record.expires_at.expect("Expiry should be derived from expires_in.");

	assert_eq!(expires_at - record.issued_at, Duration::seconds(3_600));
	assert_eq!(
		harness.durable.get("ip/authority").expect("Authority read should succeed.").as_deref(),
		Some("https://idp.example.com/common")
	);
}

#[tokio::test]
async fn invalid_grant_passes_through_without_a_token_record() {
	let server = MockServer::start_async().await;
	let (client, harness) =
		build_reqwest_test_client(build_descriptor(&server.url("/token")), START_PAGE);
	let state = start_sign_in(&client);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"Code already redeemed.\",\"error_codes\":[54005],\"trace_id\":\"trace-1\"}",
			);
		})
		.await;
	let response = client
		.handle_redirect_callback_url(&callback_url(&[("code", "stale"), ("state", &state)]))
		.await
		.expect("Callback should be handled.");

	mock.assert_async().await;

	let token = response.token().expect("The exchange should have run.");

	assert_eq!(token.error.as_deref(), Some("invalid_grant"));
	assert_eq!(token.error_description.as_deref(), Some("Code already redeemed."));
	assert_eq!(token.error_codes.as_deref(), Some("54005"));
	assert_eq!(token.trace_id.as_deref(), Some("trace-1"));
	assert_eq!(token.access_token, None);
	assert_eq!(token.id_token, None);
	assert_eq!(token.refresh_token, None);
	assert_session_cleared(&harness);
	assert!(harness.durable.is_empty());
}

#[tokio::test]
async fn server_errors_without_body_become_request_failed() {
	let server = MockServer::start_async().await;
	let (client, harness) =
		build_reqwest_test_client(build_descriptor(&server.url("/token")), START_PAGE);
	let state = start_sign_in(&client);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(503);
		})
		.await;
	let response = client
		.handle_redirect_callback_url(&callback_url(&[("code", "code-1"), ("state", &state)]))
		.await
		.expect("Callback should be handled.");

	mock.assert_async().await;

	let token = response.token().expect("The exchange should have run.");

	assert_eq!(token.error.as_deref(), Some(REQUEST_FAILED));
	assert_eq!(token.error_description.as_deref(), Some("Service Unavailable"));
	assert_eq!(token.error_codes.as_deref(), Some("503"));
	assert!(token.timestamp.as_deref().is_some_and(|stamp| stamp.ends_with(" UTC")));
	assert_session_cleared(&harness);
	assert!(harness.durable.is_empty());
}

#[tokio::test]
async fn unreachable_token_endpoint_becomes_request_error() {
	let (client, harness) =
		build_reqwest_test_client(build_descriptor("http://127.0.0.1:9/token"), START_PAGE);
	let state = start_sign_in(&client);
	let response = client
		.handle_redirect_callback_url(&callback_url(&[("code", "code-1"), ("state", &state)]))
		.await
		.expect("Transport failures should not raise.");

	assert_eq!(response.error(), Some(REQUEST_ERROR));
	assert_eq!(
		response.token().and_then(|token| token.error_codes.as_deref()),
		Some("connect")
	);
	assert_session_cleared(&harness);
	assert!(harness.durable.is_empty());
}

#[tokio::test]
async fn state_mismatch_is_rejected_before_any_exchange() {
	let server = MockServer::start_async().await;
	let (client, harness) =
		build_reqwest_test_client(build_descriptor(&server.url("/token")), START_PAGE);

	start_sign_in(&client);

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200);
		})
		.await;
	let response = client
		.handle_redirect_callback_url(&callback_url(&[("code", "code-1"), ("state", "forged")]))
		.await
		.expect("Callback should be handled.");

	mock.assert_calls_async(0).await;

	match response {
		AuthResponse::Rejected(rejected) => {
			assert_eq!(rejected.error.as_deref(), Some(INVALID_STATE));
			assert_eq!(rejected.error_description.as_deref(), Some("State mismatch"));
		},
		other => panic!("Unexpected callback outcome: {other:?}."),
	}

	assert_session_cleared(&harness);
}

#[tokio::test]
async fn replayed_callback_finds_no_cached_request() {
	let server = MockServer::start_async().await;
	let (client, harness) =
		build_reqwest_test_client(build_descriptor(&server.url("/token")), START_PAGE);
	let state = start_sign_in(&client);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"once\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let callback = callback_url(&[("code", "code-1"), ("state", &state)]);
	let first = client.handle_redirect_callback_url(&callback).await.expect("First callback.");

	assert_eq!(first.error(), None);

	let replay = client.handle_redirect_callback_url(&callback).await.expect("Replayed callback.");

	mock.assert_calls_async(1).await;

	match replay {
		AuthResponse::Rejected(rejected) => {
			assert_eq!(rejected.error.as_deref(), Some(INVALID_STATE));
			assert_eq!(rejected.error_description.as_deref(), Some("Scope not present in cache"));
			assert_eq!(rejected.correlation_id, None);
		},
		other => panic!("Unexpected replay outcome: {other:?}."),
	}

	assert_session_cleared(&harness);
}

#[tokio::test]
async fn provider_errors_on_the_callback_are_returned_as_is() {
	let (client, harness) =
		build_reqwest_test_client(build_descriptor("https://idp.example.com/token"), START_PAGE);
	let state = start_sign_in(&client);
	let response = client
		.handle_redirect_callback_url(&callback_url(&[
			("error", "access_denied"),
			("error_description", "The user cancelled."),
			("state", &state),
		]))
		.await
		.expect("Callback should be handled.");

	match response {
		AuthResponse::Rejected(rejected) => {
			assert_eq!(rejected.error.as_deref(), Some("access_denied"));
			assert_eq!(rejected.error_description.as_deref(), Some("The user cancelled."));
			assert!(rejected.correlation_id.is_some());
		},
		other => panic!("Unexpected callback outcome: {other:?}."),
	}

	assert_session_cleared(&harness);
}

#[tokio::test]
async fn unreadable_session_record_is_cleared_before_raising() {
	let inner = MemoryStore::default();
	let session = Arc::new(UnreadableKeyStore {
		inner: inner.clone(),
		failing_suffix: "pkce-codes",
		failing: AtomicBool::new(false),
	});
	let client: ReqwestTestClient = RedirectClient::with_http_client(
		build_descriptor("https://idp.example.com/token"),
		ClientOptions::default().with_debug_do_not_redirect_on_signin(true),
		session.clone(),
		Arc::new(MemoryStore::default()),
		Arc::new(StaticHost::browser(Url::parse(START_PAGE).expect("Start page should parse."))),
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
	);

	client.get_auth_code(None).expect("Redirect should be prepared.");

	assert_eq!(inner.len(), 3);

	session.failing.store(true, Ordering::SeqCst);

	let err = client
		.handle_redirect_callback_url(&callback_url(&[("code", "a"), ("state", "b")]))
		.await
		.expect_err("The unreadable record should raise.");

	assert!(matches!(err, Error::Storage(StoreError::Backend { .. })));
	assert!(inner.is_empty(), "In-flight record must not survive: {:?}.", inner.keys());
}
