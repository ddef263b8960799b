//! Random sources and GUID generation.
//!
//! PKCE verifiers must come from a [`SecureRandom`] and fail hard when it is unavailable.
//! Nonces and correlation identifiers use the same source but may degrade to a seeded
//! non-cryptographic generator, which is logged as a warning.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use rand::{RngCore, SeedableRng, TryRngCore, rngs::{OsRng, SmallRng}};
use uuid::{Builder, Uuid};
// self
use crate::{_prelude::*, error::CryptoError};

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cryptographically secure byte source.
pub trait SecureRandom
where
	Self: Send + Sync,
{
	/// Fills `dest` with secure random bytes or reports why it cannot.
	fn fill(&self, dest: &mut [u8]) -> Result<(), CryptoError>;
}

/// Operating-system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;
impl SecureRandom for OsRandom {
	fn fill(&self, dest: &mut [u8]) -> Result<(), CryptoError> {
		OsRng
			.try_fill_bytes(dest)
			.map_err(|e| CryptoError::RandomUnavailable { message: e.to_string() })
	}
}

/// Generates an RFC 4122 version 4 GUID from the secure source.
pub fn generate_guid(random: &dyn SecureRandom) -> Result<Uuid, CryptoError> {
	let mut bytes = [0_u8; 16];

	random.fill(&mut bytes)?;

	Ok(Builder::from_random_bytes(bytes).into_uuid())
}

/// Generates a GUID, degrading to a non-cryptographic generator when the secure source
/// fails.
///
/// Only use this for values whose secrecy is not load-bearing (nonces, correlation ids).
pub fn generate_guid_or_fallback(random: &dyn SecureRandom, purpose: &'static str) -> Uuid {
	match generate_guid(random) {
		Ok(guid) => guid,
		Err(e) => {
			tracing::warn!(
				purpose,
				error = %e,
				"Secure random source unavailable; using non-cryptographic fallback."
			);

			fallback_guid()
		},
	}
}

fn fallback_guid() -> Uuid {
	let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos() as u64;
	let counter = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
	let mut rng = SmallRng::seed_from_u64(nanos ^ counter.rotate_left(32));
	let mut bytes = [0_u8; 16];

	rng.fill_bytes(&mut bytes);

	Builder::from_random_bytes(bytes).into_uuid()
}
