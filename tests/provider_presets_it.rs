#![cfg(feature = "reqwest")]

// self
use oauth2_redirect::{
	_preludet::*,
	auth::ScopeSet,
	config::{ClientOptions, ProviderSettings},
	error::ConfigError,
	flows::{AuthCodeRequest, RedirectClient, build_token_request_form},
	host::StaticHost,
	provider::{self, ProviderDescriptor, ProviderDescriptorError},
	store::MemoryStore,
};

const FACEBOOK_SETTINGS: &str = r#"{
	"authority": "https://www.facebook.com",
	"client_id": "fb-client",
	"redirect_uri": "https://app.example.com/auth/fb",
	"authorization_endpoint": "https://www.facebook.com/v19.0/dialog/oauth",
	"token_endpoint": "https://graph.facebook.com/v19.0/oauth/access_token"
}"#;

fn prepared_url(descriptor: ProviderDescriptor) -> HashMap<String, String> {
	let client = RedirectClient::new(
		descriptor,
		ClientOptions::default().with_debug_do_not_redirect_on_signin(true),
		Arc::new(MemoryStore::default()),
		Arc::new(MemoryStore::default()),
		Arc::new(StaticHost::browser(
			Url::parse("https://app.example.com/").expect("Page should parse."),
		)),
	);
	let request =
		AuthCodeRequest::new(ScopeSet::new(["email"]).expect("Scope set should be valid."));
	let redirect = client.get_auth_code(Some(request)).expect("Redirect should be prepared.");

	redirect.url.query_pairs().into_owned().collect()
}

fn form_pairs(body: &str) -> HashMap<String, String> {
	url::form_urlencoded::parse(body.as_bytes()).into_owned().collect()
}

#[test]
fn microsoft_consumers_sends_query_mode_and_full_token_form() {
	let descriptor = provider::microsoft_consumers(
		"msa-client",
		Url::parse("https://app.example.com/auth/msa").expect("Redirect should parse."),
	)
	.expect("Microsoft preset should build.");
	let params = prepared_url(descriptor.clone());

	assert_eq!(params.get("response_mode").map(String::as_str), Some("query"));
	assert_eq!(params.get("scope").map(String::as_str), Some("email openid profile"));
	assert_eq!(params.get("client_id").map(String::as_str), Some("msa-client"));
	assert_eq!(
		descriptor.endpoints.end_session.as_ref().map(Url::as_str),
		Some("https://login.microsoftonline.com/consumers/oauth2/v2.0/logout")
	);

	let scopes = ScopeSet::new(["email", "openid", "profile"]).expect("Scope set should be valid.");
	let form = form_pairs(&build_token_request_form(&descriptor, "code-1", &scopes, "verifier-1"));

	assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
	assert_eq!(form.get("scope").map(String::as_str), Some("email openid profile"));
	assert_eq!(form.get("code_verifier").map(String::as_str), Some("verifier-1"));
	assert_eq!(
		form.get("redirect_uri").map(String::as_str),
		Some("https://app.example.com/auth/msa")
	);
}

#[test]
fn facebook_omits_response_mode_scope_and_grant_type() {
	let settings = ProviderSettings::from_json(FACEBOOK_SETTINGS).expect("Settings should parse.");
	let descriptor = provider::facebook(settings).expect("Facebook preset should build.");
	let params = prepared_url(descriptor.clone());

	assert!(!params.contains_key("response_mode"));
	assert_eq!(params.get("scope").map(String::as_str), Some("email openid public_profile"));

	let form = form_pairs(&build_token_request_form(
		&descriptor,
		"code-1",
		&descriptor.default_scopes,
		"verifier-1",
	));

	assert!(!form.contains_key("grant_type"));
	assert!(!form.contains_key("scope"));
	assert_eq!(form.get("client_id").map(String::as_str), Some("fb-client"));
	assert_eq!(form.get("code").map(String::as_str), Some("code-1"));
}

#[test]
fn presets_reject_insecure_endpoints() {
	let mut settings =
		ProviderSettings::from_json(FACEBOOK_SETTINGS).expect("Settings should parse.");

	settings.token_endpoint =
		Url::parse("http://graph.facebook.com/oauth/access_token").expect("URL should parse.");

	let err = provider::facebook(settings).expect_err("Plain HTTP token endpoints must fail.");

	assert!(matches!(
		err,
		ConfigError::InvalidDescriptor(ProviderDescriptorError::InsecureEndpoint {
			endpoint: "token",
			..
		})
	));
}

#[test]
fn settings_errors_name_the_offending_field() {
	let err = ProviderSettings::from_json(
		r#"{"authority":"https://idp.example.com","client_id":"c","redirect_uri":"not a url"}"#,
	)
	.expect_err("Invalid redirect URI must be rejected.");

	assert!(
		matches!(&err, ConfigError::Document { path, .. } if path == "redirect_uri"),
		"Unexpected error: {err:?}."
	);

	let vars = HashMap::from([
		("FB_AUTHORITY", "https://www.facebook.com"),
		("FB_CLIENT_ID", "fb-client"),
		("FB_REDIRECT_URI", "https://app.example.com/auth/fb"),
		("FB_AUTHORIZATION_ENDPOINT", "https://www.facebook.com/v19.0/dialog/oauth"),
	]);
	let err = ProviderSettings::from_lookup("FB", |name| vars.get(name).map(|v| (*v).to_owned()))
		.expect_err("Missing token endpoint must be reported.");

	assert!(
		matches!(&err, ConfigError::MissingSetting { name } if name == "FB_TOKEN_ENDPOINT"),
		"Unexpected error: {err:?}."
	);
}

#[test]
fn sign_out_settings_are_carried_and_validated() {
	let mut settings =
		ProviderSettings::from_json(FACEBOOK_SETTINGS).expect("Settings should parse.");

	settings.post_logout_redirect_uri =
		Some(Url::parse("https://app.example.com/signed-out").expect("URL should parse."));

	let descriptor = provider::facebook(settings.clone()).expect("Facebook preset should build.");

	assert_eq!(
		descriptor.post_logout_redirect_uri.as_ref().map(Url::as_str),
		Some("https://app.example.com/signed-out")
	);
	assert_eq!(descriptor.endpoints.end_session, None);

	settings.end_session_endpoint =
		Some(Url::parse("http://www.facebook.com/logout.php").expect("URL should parse."));

	let err = provider::facebook(settings).expect_err("Plain HTTP end-session endpoints must fail.");

	assert!(matches!(
		err,
		ConfigError::InvalidDescriptor(ProviderDescriptorError::InsecureEndpoint {
			endpoint: "end_session",
			..
		})
	));
}
