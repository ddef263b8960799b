//! Authorization URL construction and the sign-in navigation.

// self
use crate::{
	_prelude::*,
	auth::CorrelationId,
	flows::{
		RedirectClient,
		auth_code_pkce::{
			AuthCodeRequest, InteractionType, PreparedAuthCodeRequest, generate_pkce_params,
			initialize_auth_code_request,
		},
		common,
	},
	host,
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
};

/// Result of [`RedirectClient::get_auth_code`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthCodeRedirect {
	/// Authorization URL the host was sent to.
	pub url: Url,
	/// Correlation identifier of the attempt.
	pub correlation_id: CorrelationId,
	/// `false` when navigation was suppressed by
	/// [`ClientOptions::debug_do_not_redirect_on_signin`](crate::config::ClientOptions).
	pub navigated: bool,
}

/// Serializes the authorization URL for a prepared request.
///
/// Parameters are appended in a fixed order (`client_id`, `response_type`, `redirect_uri`,
/// `scope`, `response_mode`, `state`, `code_challenge`, `code_challenge_method`) and each
/// value is percent-encoded on its own, so the output is reproducible for a given input.
/// `scope` is omitted when empty and `response_mode` when the provider declares none.
pub fn get_auth_code_url(descriptor: &ProviderDescriptor, prepared: &PreparedAuthCodeRequest) -> Url {
	let PreparedAuthCodeRequest { request, pkce_codes } = prepared;
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", &descriptor.client_id);
	pairs.append_pair("response_type", request.response_type.as_str());
	pairs.append_pair("redirect_uri", descriptor.redirect_uri.as_str());

	if let Some(scope) = common::format_scope(&request.scopes, descriptor.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope);
	}
	if let Some(mode) = request.response_mode {
		pairs.append_pair("response_mode", mode.as_str());
	}

	pairs.append_pair("state", request.state());
	pairs.append_pair("code_challenge", &pkce_codes.code_challenge);
	pairs.append_pair("code_challenge_method", pkce_codes.code_challenge_method.as_str());

	drop(pairs);

	url
}

impl<C, M> RedirectClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts an interactive sign-in by navigating the host to the authorization endpoint.
	///
	/// Preflight failures are raised before anything is persisted. Once preflight passes,
	/// the request record is written to the session store before navigation; any later
	/// failure clears that record and is then raised unchanged.
	pub fn get_auth_code(&self, request: Option<AuthCodeRequest>) -> Result<AuthCodeRedirect> {
		let _guard = FlowSpan::new(FlowKind::Redirect, "get_auth_code").entered();

		obs::record_flow_outcome(FlowKind::Redirect, FlowOutcome::Attempt);

		if let Err(e) = host::preflight(self.host.as_ref(), &self.options.popup_name_prefix) {
			tracing::warn!(error = %e, "Sign-in preflight rejected the host environment.");
			obs::record_flow_outcome(FlowKind::Redirect, FlowOutcome::Failure);

			return Err(e.into());
		}

		match self.start_redirect(request.unwrap_or_default()) {
			Ok(redirect) => {
				tracing::info!(
					correlation_id = %redirect.correlation_id,
					navigated = redirect.navigated,
					"Sign-in redirect started."
				);
				obs::record_flow_outcome(FlowKind::Redirect, FlowOutcome::Success);

				Ok(redirect)
			},
			Err(e) => {
				tracing::error!(error = %e, "Sign-in redirect failed; clearing in-flight request.");

				if let Err(clear_error) = self.session.clear() {
					tracing::error!(
						error = %clear_error,
						"Failed to clear in-flight request after a failed sign-in."
					);
				}

				obs::record_flow_outcome(FlowKind::Redirect, FlowOutcome::Failure);

				Err(e)
			},
		}
	}

	fn start_redirect(&self, request: AuthCodeRequest) -> Result<AuthCodeRedirect> {
		let initialized = initialize_auth_code_request(
			&self.descriptor,
			self.host.as_ref(),
			self.random.as_ref(),
			request,
			InteractionType::Redirect,
		)?;
		let prepared = generate_pkce_params(initialized, self.random.as_ref())?;

		self.session.write(
			&prepared.request.scopes,
			&prepared.request.state_object,
			&prepared.pkce_codes,
		)?;

		let url = get_auth_code_url(&self.descriptor, &prepared);
		let navigated = if self.options.debug_do_not_redirect_on_signin {
			tracing::debug!(%url, "Navigation suppressed by debug option.");

			false
		} else {
			self.host.navigate(&url)?;

			true
		};

		Ok(AuthCodeRedirect { url, correlation_id: prepared.request.correlation_id, navigated })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{ProviderId, ScopeSet, TokenSecret},
		flows::auth_code_pkce::{
			InitializedAuthCodeRequest, PkceCodes, ResponseType, build_state,
		},
		provider::{ProviderQuirks, ResponseMode},
	};

	fn descriptor(quirks: ProviderQuirks) -> ProviderDescriptor {
		ProviderDescriptor::builder(ProviderId::new("idp").expect("Provider id should be valid."))
			.authority(Url::parse("https://idp.example.com").expect("Authority should parse."))
			.authorization_endpoint(
				Url::parse("https://idp.example.com/authorize").expect("Endpoint should parse."),
			)
			.token_endpoint(Url::parse("https://idp.example.com/token").expect("Endpoint should parse."))
			.client_id("client 123")
			.redirect_uri(Url::parse("https://app.example.com/cb").expect("Redirect should parse."))
			.quirks(quirks)
			.build()
			.expect("Descriptor fixture should build.")
	}

	fn prepared(scopes: ScopeSet, response_mode: Option<ResponseMode>) -> PreparedAuthCodeRequest {
		let correlation_id = CorrelationId::new("corr-1").expect("Correlation should be valid.");
		let mut state_object =
			build_state(correlation_id.clone(), InteractionType::Redirect, None, None)
				.expect("State should encode.");

		state_object.encoded_state = Some("c3RhdGU=|a b".into());

		PreparedAuthCodeRequest {
			request: InitializedAuthCodeRequest {
				scopes,
				response_type: ResponseType::Code,
				response_mode,
				state_object,
				nonce: "nonce".into(),
				correlation_id,
			},
			pkce_codes: PkceCodes::from_verifier(TokenSecret::new(
				"dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
			)),
		}
	}

	#[test]
	fn url_is_ordered_and_encoded_per_component() {
		let scopes = ScopeSet::new(["openid", "profile"]).expect("Scopes should be valid.");
		let url = get_auth_code_url(
			&descriptor(ProviderQuirks::default()),
			&prepared(scopes, Some(ResponseMode::Query)),
		);

		assert_eq!(
			url.as_str(),
			"https://idp.example.com/authorize?client_id=client+123&response_type=code\
			 &redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&scope=openid+profile\
			 &response_mode=query&state=c3RhdGU%3D%7Ca+b\
			 &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM\
			 &code_challenge_method=S256"
		);
	}

	#[test]
	fn empty_scope_and_missing_mode_are_omitted() {
		let quirks = ProviderQuirks { scope_delimiter: ',', ..Default::default() };
		let url = get_auth_code_url(&descriptor(quirks), &prepared(ScopeSet::default(), None));
		let names = url.query_pairs().map(|(name, _)| name.into_owned()).collect::<Vec<_>>();

		assert_eq!(
			names,
			[
				"client_id",
				"response_type",
				"redirect_uri",
				"state",
				"code_challenge",
				"code_challenge_method"
			]
		);

		let scopes = ScopeSet::new(["email", "openid"]).expect("Scopes should be valid.");
		let url = get_auth_code_url(&descriptor(quirks), &prepared(scopes, None));

		assert!(url.as_str().contains("&scope=email%2Copenid&"));
	}
}
