//! Strongly typed identifiers carried through the redirect round trip.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (correlation, provider).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (correlation, provider).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (correlation, provider).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { CorrelationId, "Identifier correlating one authorization attempt across page loads.", "Correlation" }
def_id! { ProviderId, "Identifier for an identity provider descriptor.", "Provider" }
impl CorrelationId {
	/// Wraps a generated GUID; hyphenated UUIDs always satisfy identifier validation.
	pub fn from_guid(guid: uuid::Uuid) -> Self {
		Self(guid.hyphenated().to_string())
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		crypto::{self, OsRandom},
		flows::auth_code_pkce::{InteractionType, StateObject, build_state, decode_state},
	};

	#[test]
	fn generated_correlation_survives_the_state_round_trip() {
		let guid = crypto::generate_guid(&OsRandom).expect("OS randomness should be available.");
		let correlation = CorrelationId::from_guid(guid);
		let state = build_state(correlation.clone(), InteractionType::Redirect, None, None)
			.expect("State should encode.");
		let encoded = state.encoded_state.as_deref().expect("State should carry its encoding.");
		let decoded = decode_state(encoded).expect("State should decode.");

		assert_eq!(decoded.correlation_id, correlation);
		assert_eq!(uuid::Uuid::parse_str(&decoded.correlation_id), Ok(guid));
	}

	#[test]
	fn cached_state_with_invalid_correlation_is_rejected() {
		let rejected = serde_json::from_str::<StateObject>(
			r#"{"correlationId":"two words","interactionType":"redirect"}"#,
		);

		assert!(rejected.is_err(), "Whitespace in a cached correlation id must not decode.");
		assert_eq!(
			CorrelationId::new(""),
			Err(IdentifierError::Empty { kind: "Correlation" })
		);
		assert_eq!(
			CorrelationId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { kind: "Correlation", max: IDENTIFIER_MAX_LEN })
		);
	}

	#[test]
	fn log_output_names_the_identifier_kind() {
		let correlation = CorrelationId::from_guid(uuid::Uuid::nil());

		assert_eq!(correlation.to_string(), "00000000-0000-0000-0000-000000000000");
		assert_eq!(format!("{correlation:?}"), "Correlation(00000000-0000-0000-0000-000000000000)");
		assert_eq!(
			format!("{:?}", ProviderId::new("facebook").expect("Provider id should be valid.")),
			"Provider(facebook)"
		);
	}
}
