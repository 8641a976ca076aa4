//! ed25519 keys, as used by `did:key` identifiers starting with `z6Mk`.

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::pkcs8::{EncodePrivateKey as _, KeypairBytes};

use crate::key_algos::StaticKeyAlgo as _;

/// An ed25519 public key.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

impl VerifyingKey {
	pub const LEN: usize = Self::key_len();

	/// Instantiates `VerifyingKey` from some bytes. Performs all necessary
	/// validation that the key is valid and of sufficient strength.
	///
	/// Note that we will reject any keys that are too weak (aka low order).
	pub fn try_from_bytes(bytes: &[u8; Self::LEN]) -> Result<Self, TryFromBytesError> {
		let compressed_edwards = CompressedEdwardsY(bytes.to_owned());
		let Some(edwards) = compressed_edwards.decompress() else {
			return Err(TryFromBytesError::NotOnCurve);
		};
		let key = ed25519_dalek::VerifyingKey::from(edwards);
		if key.is_weak() {
			return Err(TryFromBytesError::WeakKey);
		}
		Ok(Self(key))
	}

	pub fn as_bytes(&self) -> &[u8; Self::LEN] {
		self.0.as_bytes()
	}

	/// The underlying key from [`ed25519_dalek`], for operations this crate
	/// doesn't wrap.
	pub fn into_inner(self) -> ed25519_dalek::VerifyingKey {
		self.0
	}

	// TODO: Turn this into inline const when that feature stabilizes
	const fn key_len() -> usize {
		let len = crate::key_algos::Ed25519::PUB_KEY_LEN;
		assert!(len == ed25519_dalek::PUBLIC_KEY_LENGTH);
		len
	}
}

/// An ed25519 private key. Whoever holds this controls the corresponding DID.
#[derive(Clone)]
pub struct SigningKey(ed25519_dalek::SigningKey);

impl SigningKey {
	pub const LEN: usize = ed25519_dalek::SECRET_KEY_LENGTH;

	pub fn from_bytes(bytes: &[u8; Self::LEN]) -> Self {
		Self(ed25519_dalek::SigningKey::from_bytes(bytes))
	}

	/// Generates a new key using the operating system's random number generator.
	#[cfg(feature = "random")]
	pub fn random() -> Self {
		Self::random_from_rng(&mut rand_core::OsRng)
	}

	/// Generates a new key from `rng`. Useful when the source of randomness
	/// must be controlled, for example to get reproducible keys in tests.
	#[cfg(feature = "random")]
	pub fn random_from_rng<R: rand_core::CryptoRngCore + ?Sized>(rng: &mut R) -> Self {
		Self(ed25519_dalek::SigningKey::generate(rng))
	}

	pub fn verifying_key(&self) -> VerifyingKey {
		VerifyingKey(self.0.verifying_key())
	}

	/// Encodes the private key as an unencrypted PKCS#8 v1 document in DER form.
	/// This is the format JOSE libraries accept for EdDSA signing keys.
	///
	/// Only the private key is encoded, the public key field of v2 is left out.
	pub fn to_pkcs8_der(&self) -> Result<Vec<u8>, Pkcs8Error> {
		let keypair = KeypairBytes {
			secret_key: self.0.to_bytes(),
			public_key: None,
		};
		let doc = keypair.to_pkcs8_der()?;
		Ok(doc.as_bytes().to_vec())
	}

	pub fn into_inner(self) -> ed25519_dalek::SigningKey {
		self.0
	}
}

impl std::fmt::Debug for SigningKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("SigningKey")
			.field(&self.verifying_key())
			.finish_non_exhaustive()
	}
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum TryFromBytesError {
	#[error(
		"the provided bytes was not the y coordinate of a valid point on the curve"
	)]
	NotOnCurve,
	#[error("public key has a low order and is too weak, which would allow the key to generate signatures that work for almost any message. To prevent this, we reject weak keys.")]
	WeakKey,
}

/// Errors which may occur while encoding a private key.
#[derive(thiserror::Error, Debug)]
#[error("failed to encode private key as pkcs8")]
pub struct Pkcs8Error(#[from] ed25519_dalek::pkcs8::Error);
