//! PKCE verifier/challenge generation (RFC 7636, `S256` only).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	crypto::SecureRandom,
	error::CryptoError,
};

/// Number of random bytes behind each verifier (43 characters once encoded).
pub const PKCE_VERIFIER_BYTES: usize = 32;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	#[default]
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}
impl Display for PkceCodeChallengeMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Verifier/challenge pair for one authorization attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PkceCodes {
	/// Secret verifier sent on the token request.
	pub code_verifier: TokenSecret,
	/// Challenge sent on the authorization URL.
	pub code_challenge: String,
	/// Method used to derive the challenge.
	pub code_challenge_method: PkceCodeChallengeMethod,
}
impl PkceCodes {
	/// Rebuilds the pair from a known verifier.
	pub fn from_verifier(verifier: TokenSecret) -> Self {
		let code_challenge = derive_challenge(verifier.expose());

		Self {
			code_verifier: verifier,
			code_challenge,
			code_challenge_method: PkceCodeChallengeMethod::S256,
		}
	}
}

/// Generates a verifier from [`PKCE_VERIFIER_BYTES`] secure random bytes.
///
/// There is no fallback: a failing source aborts the attempt.
pub fn generate_verifier(random: &dyn SecureRandom) -> Result<TokenSecret, CryptoError> {
	let mut bytes = [0_u8; PKCE_VERIFIER_BYTES];

	random.fill(&mut bytes)?;

	Ok(TokenSecret::new(URL_SAFE_NO_PAD.encode(bytes)))
}

/// URL-safe, unpadded base64 of the verifier's SHA-256 digest.
pub fn derive_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}

/// Generates a fresh [`PkceCodes`] pair.
pub fn generate_pkce_codes(random: &dyn SecureRandom) -> Result<PkceCodes, CryptoError> {
	Ok(PkceCodes::from_verifier(generate_verifier(random)?))
}

/// Checks caller-supplied challenge parameters.
pub fn validate_code_challenge_params(
	code_challenge: Option<&str>,
	code_challenge_method: Option<&str>,
) -> Result<PkceCodeChallengeMethod, CryptoError> {
	let (Some(challenge), Some(method)) = (code_challenge, code_challenge_method) else {
		return Err(CryptoError::MissingCodeChallenge);
	};

	if challenge.is_empty() || method.is_empty() {
		return Err(CryptoError::MissingCodeChallenge);
	}
	if method != PkceCodeChallengeMethod::S256.as_str() {
		return Err(CryptoError::UnsupportedChallengeMethod { method: method.to_owned() });
	}

	Ok(PkceCodeChallengeMethod::S256)
}
