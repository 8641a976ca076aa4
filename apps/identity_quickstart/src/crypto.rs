//! The cryptographic capabilities handed to the agent.
//!
//! Nothing in this crate reaches for a global random number generator. Instead
//! a [`CryptoProvider`] is passed in explicitly, which lets tests swap in a
//! deterministic one.

use std::sync::{Mutex, PoisonError};

use did_simple::crypto::{
	ed25519::SigningKey,
	rand_core::{OsRng, RngCore as _},
};
use rand_chacha::{rand_core::SeedableRng as _, ChaCha20Rng};

pub trait CryptoProvider: std::fmt::Debug + Send + Sync + 'static {
	/// Generates a fresh ed25519 key.
	fn generate_signing_key(&self) -> SigningKey;

	/// Fills `dest` with cryptographically secure random bytes.
	fn fill_random(&self, dest: &mut [u8]);
}

/// Uses the operating system's random number generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsCrypto;

impl CryptoProvider for OsCrypto {
	fn generate_signing_key(&self) -> SigningKey {
		SigningKey::random()
	}

	fn fill_random(&self, dest: &mut [u8]) {
		OsRng.fill_bytes(dest)
	}
}

/// Derives all randomness from a fixed seed. Two providers with the same seed
/// produce the same sequence of keys, which is only useful for tests and
/// reproducible demos. Never use this for real identities.
#[derive(Debug)]
pub struct SeededCrypto(Mutex<ChaCha20Rng>);

impl SeededCrypto {
	pub fn new(seed: [u8; 32]) -> Self {
		Self(Mutex::new(ChaCha20Rng::from_seed(seed)))
	}
}

impl CryptoProvider for SeededCrypto {
	fn generate_signing_key(&self) -> SigningKey {
		let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
		SigningKey::random_from_rng(&mut *rng)
	}

	fn fill_random(&self, dest: &mut [u8]) {
		self.0
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.fill_bytes(dest)
	}
}
