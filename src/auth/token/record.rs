//! Durable token record written after a successful code exchange.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// The relative expiry cannot be represented as an instant.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

/// Token material persisted in durable storage for the active session.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
	/// Authority that issued the tokens.
	pub authority: String,
	/// ID token, when the provider returned one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<TokenSecret>,
	/// Access token, when the provider returned one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Refresh token, when the provider returned one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Instant the exchange completed.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// `issued_at + expires_in`; absent when the provider omitted `expires_in`.
	#[serde(default, rename = "expiresAtUtc", with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Returns a builder for the provided authority.
	pub fn builder(authority: impl Into<String>) -> TokenRecordBuilder {
		TokenRecordBuilder::new(authority.into())
	}

	/// Returns `true` once `instant` reaches the expiry; records without one never expire.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the record is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("authority", &self.authority)
			.field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	authority: String,
	id_token: Option<TokenSecret>,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_in: Option<u64>,
}
impl TokenRecordBuilder {
	fn new(authority: String) -> Self {
		Self {
			authority,
			id_token: None,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			expires_in: None,
		}
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets the relative lifetime in seconds reported by the provider.
	pub fn expires_in(mut self, seconds: Option<u64>) -> Self {
		self.expires_in = seconds;

		self
	}

	/// Provides the ID token value.
	pub fn id_token(mut self, token: Option<TokenSecret>) -> Self {
		self.id_token = token;

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: Option<TokenSecret>) -> Self {
		self.access_token = token;

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: Option<TokenSecret>) -> Self {
		self.refresh_token = token;

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match self.expires_in {
			Some(seconds) => {
				let seconds =
					i64::try_from(seconds).map_err(|_| TokenRecordBuilderError::ExpiresInOutOfRange)?;

				Some(
					issued_at
						.checked_add(Duration::seconds(seconds))
						.ok_or(TokenRecordBuilderError::ExpiresInOutOfRange)?,
				)
			},
			None => None,
		};

		Ok(TokenRecord {
			authority: self.authority,
			id_token: self.id_token,
			access_token: self.access_token,
			refresh_token: self.refresh_token,
			issued_at,
			expires_at,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn builder_handles_relative_expiry() {
		let record = TokenRecord::builder("https://login.example.com/consumers")
			.access_token(Some(TokenSecret::new("secret")))
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Some(1_800))
			.build()
			.expect("Token record builder should support relative expiry calculations.");

		assert_eq!(record.expires_at, Some(macros::datetime!(2025-01-01 00:30 UTC)));
		assert!(!record.is_expired_at(macros::datetime!(2025-01-01 00:29 UTC)));
		assert!(record.is_expired_at(macros::datetime!(2025-01-01 00:30 UTC)));
	}

	#[test]
	fn builder_rejects_unrepresentable_expiry() {
		let err = TokenRecord::builder("https://login.example.com")
			.expires_in(Some(u64::MAX))
			.build()
			.expect_err("Overflowing expires_in must be rejected.");

		assert_eq!(err, TokenRecordBuilderError::ExpiresInOutOfRange);
	}

	#[test]
	fn records_without_expiry_never_expire() {
		let record = TokenRecord::builder("https://login.example.com")
			.id_token(Some(TokenSecret::new("id")))
			.build()
			.expect("Record without expiry should build.");

		assert!(!record.is_expired());
	}

	#[test]
	fn serialized_record_uses_camel_case_and_redacted_debug() {
		let record = TokenRecord::builder("https://login.example.com")
			.access_token(Some(TokenSecret::new("access-value")))
			.refresh_token(Some(TokenSecret::new("refresh-value")))
			.issued_at(macros::datetime!(2025-11-10 12:00 UTC))
			.expires_in(Some(3_600))
			.build()
			.expect("Record fixture should build.");
		let json = serde_json::to_value(&record).expect("Record should serialize.");

		assert_eq!(json["accessToken"], "access-value");
		assert_eq!(json["expiresAtUtc"], "2025-11-10T13:00:00Z");
		assert!(json.get("idToken").is_none());

		let debug = format!("{record:?}");

		assert!(!debug.contains("access-value"));
		assert!(!debug.contains("refresh-value"));
	}
}
