//! Walks one sign-in round trip against a mock provider: the redirect leg persists state
//! and PKCE before "navigating", and the callback leg validates and exchanges the code.

// std
use std::sync::Arc;
// crates.io
use color_eyre::{Result, eyre::eyre};
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_redirect::{
	auth::{ProviderId, ScopeSet},
	config::ClientOptions,
	flows::{AuthCodeRequest, AuthResponse, RedirectClient},
	host::StaticHost,
	provider::ProviderDescriptor,
	store::{KeyValueStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"id_token\":\"demo-id\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let descriptor = ProviderDescriptor::builder(ProviderId::new("demo-provider")?)
		.authority(Url::parse(&server.url("/"))?)
		.authorization_endpoint(Url::parse(&server.url("/authorize"))?)
		.token_endpoint(Url::parse(&server.url("/token"))?)
		.client_id("demo-client")
		.redirect_uri(Url::parse("http://localhost:3000/callback")?)
		.build()?;
	let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
	let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
	let host = Arc::new(StaticHost::browser(Url::parse("http://localhost:3000/inbox")?));
	let client = RedirectClient::new(
		descriptor,
		ClientOptions::default(),
		session,
		durable,
		host.clone(),
	);
	let request = AuthCodeRequest::new(ScopeSet::new(["mail.read"])?)
		.with_state_meta("returnTo", "/inbox");
	let redirect = client.get_auth_code(Some(request))?;

	println!("Navigated to {}.", redirect.url);

	let state = redirect
		.url
		.query_pairs()
		.find(|(name, _)| name == "state")
		.map(|(_, value)| value.into_owned())
		.ok_or_else(|| eyre!("authorization URL carries no state"))?;
	let mut callback = Url::parse("http://localhost:3000/callback")?;

	callback.query_pairs_mut().append_pair("code", "demo-code").append_pair("state", &state);
	host.land_on(callback);

	match client.handle_redirect_callback().await? {
		AuthResponse::Token(token) if !token.is_error() => {
			println!(
				"Signed in; access token expires in {} seconds.",
				token.expires_in.unwrap_or_default()
			);
		},
		AuthResponse::Token(token) => println!("Exchange failed: {:?}.", token.error),
		AuthResponse::Rejected(rejected) => println!("Callback rejected: {:?}.", rejected.error),
	}

	if let Some(record) = client.cached_token_record()? {
		println!("Cached record for {} expires at {:?}.", record.authority, record.expires_at);
	}

	token_mock.assert_async().await;

	Ok(())
}
