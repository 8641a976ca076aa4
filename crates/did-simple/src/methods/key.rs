//! An implementation of the [did:key] method.
//!
//! [did:key]: https://w3c-ccg.github.io/did-method-key/

use std::{fmt::Display, str::FromStr};

use crate::{
	key_algos::KeyAlgo,
	uri::{DidMethod, DidUri},
	url::DidUrl,
	utf8bytes::Utf8Bytes,
	varint::{decode_varint_prefix, DecodeError},
	Did,
};

/// An implementation of the `did:key` method. See the [module](self) docs for more
/// info.
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub struct DidKey {
	/// The string representation of the DID.
	s: Utf8Bytes,
	/// The decoded multibase portion of the DID.
	decoded: Vec<u8>,
	/// The algorithm named by the multicodec prefix of `decoded`.
	key_algo: KeyAlgo,
	/// Index into `decoded` where the public key starts.
	pub_key_start: usize,
}

impl DidKey {
	pub const PREFIX: &'static str = "did:key:";

	/// Gets the buffer representing the did:key uri as a str.
	pub fn as_str(&self) -> &str {
		self.s.as_str()
	}

	/// Gets the buffer representing the did:key uri as a byte slice.
	pub fn as_slice(&self) -> &[u8] {
		self.s.as_slice()
	}

	/// Gets the buffer representing the did:key uri as a reference counted slice
	/// that is guaranteed to be utf8.
	pub fn as_utf8_bytes(&self) -> &Utf8Bytes {
		&self.s
	}

	/// The multibase encoded portion of the DID, i.e. everything after
	/// [`Self::PREFIX`].
	pub fn multibase(&self) -> &str {
		&self.as_str()[Self::PREFIX.len()..]
	}

	pub fn key_algo(&self) -> KeyAlgo {
		self.key_algo
	}

	/// The raw bytes of the public key, without the multicodec prefix.
	pub fn pub_key_bytes(&self) -> &[u8] {
		&self.decoded[self.pub_key_start..]
	}

	/// The url of the DID's one and only verification method. For did:key, the
	/// fragment is the same as the multibase encoded key.
	pub fn key_id(&self) -> DidUrl {
		DidUrl::with_fragment(&self.uri(), self.multibase())
			.expect("a did:key multibase is always a valid fragment")
	}

	/// Creates the DID for an ed25519 public key.
	#[cfg(feature = "ed25519")]
	pub fn from_pub_key(key: &crate::crypto::ed25519::VerifyingKey) -> Self {
		let key_algo = KeyAlgo::Ed25519;
		let mut decoded = key_algo.multicodec_prefix().as_slice().to_vec();
		let pub_key_start = decoded.len();
		decoded.extend_from_slice(key.as_bytes());

		let encoded = bs58::encode(&decoded)
			.with_alphabet(bs58::Alphabet::BITCOIN)
			.into_string();
		let s = Utf8Bytes::from(format!("{}z{encoded}", Self::PREFIX));

		Self {
			s,
			decoded,
			key_algo,
			pub_key_start,
		}
	}

	/// Gets the ed25519 public key this DID was derived from.
	#[cfg(feature = "ed25519")]
	pub fn pub_key(
		&self,
	) -> Result<crate::crypto::ed25519::VerifyingKey, PubKeyError> {
		use crate::crypto::ed25519::VerifyingKey;

		if self.key_algo != KeyAlgo::Ed25519 {
			return Err(PubKeyError::UnsupportedAlgo(self.key_algo));
		}
		let bytes: &[u8; VerifyingKey::LEN] = self
			.pub_key_bytes()
			.try_into()
			.expect("length is checked when the DidKey is constructed");
		Ok(VerifyingKey::try_from_bytes(bytes)?)
	}
}

fn decode_multibase(
	s: &Utf8Bytes,
	out_buf: &mut Vec<u8>,
) -> Result<(), MultibaseDecodeError> {
	out_buf.clear();
	// did:key only uses base58-btc, so its not actually any arbitrary multibase.
	let multibase_part = &s.as_slice()[DidKey::PREFIX.len()..];
	// the first character should always be 'z'
	let base = multibase_part[0];
	if base != b'z' {
		return Err(MultibaseDecodeError::WrongBase(base));
	}
	bs58::decode(&multibase_part[1..])
		.with_alphabet(bs58::Alphabet::BITCOIN)
		.onto(out_buf)?;
	Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum MultibaseDecodeError {
	#[error(
		"Expected \"base58-btc\" encoding which should be identified in multibase as ascii 'z' (0x7a) but got {0:x}"
	)]
	WrongBase(u8),
	#[error(transparent)]
	Bs58(#[from] bs58::decode::Error),
}

impl TryFrom<DidUri> for DidKey {
	type Error = FromUriError;

	fn try_from(value: DidUri) -> Result<Self, Self::Error> {
		let m = value.method();
		if m != DidMethod::Key {
			return Err(FromUriError::WrongMethod(m));
		}
		debug_assert_eq!(
			value.as_slice().len() - value.method_specific_id().as_slice().len(),
			Self::PREFIX.len(),
			"sanity check that prefix has expected length"
		);

		let s = value.into_inner();
		let mut decoded = Vec::new();
		decode_multibase(&s, &mut decoded)?;

		let (multicodec, pub_key) = decode_varint_prefix(&decoded)?;
		let key_algo = KeyAlgo::from_multicodec_value(multicodec)
			.ok_or(FromUriError::UnknownMulticodec(multicodec))?;
		if pub_key.len() != key_algo.pub_key_len() {
			return Err(FromUriError::WrongKeyLength {
				expected: key_algo.pub_key_len(),
				got: pub_key.len(),
			});
		}
		let pub_key_start = decoded.len() - pub_key.len();

		Ok(Self {
			s,
			decoded,
			key_algo,
			pub_key_start,
		})
	}
}

impl FromStr for DidKey {
	type Err = FromStrError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let uri = DidUri::from_str(s)?;
		Ok(Self::try_from(uri)?)
	}
}

impl Did for DidKey {
	fn uri(&self) -> DidUri {
		DidUri::from_validated(DidMethod::Key, self.s.clone(), Self::PREFIX.len())
	}
}

#[derive(thiserror::Error, Debug)]
pub enum FromUriError {
	#[error("Expected \"key\" method but got {0:?}")]
	WrongMethod(DidMethod),
	#[error(transparent)]
	MultibaseDecode(#[from] MultibaseDecodeError),
	#[error("the multicodec prefix was not a valid varint")]
	Varint(#[from] DecodeError),
	#[error("multicodec {0:#x} is not a supported key type")]
	UnknownMulticodec(u16),
	#[error("expected a public key of length {expected} but got length {got}")]
	WrongKeyLength { expected: usize, got: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum FromStrError {
	#[error(transparent)]
	Uri(#[from] crate::uri::ParseError),
	#[error(transparent)]
	Key(#[from] FromUriError),
}

#[derive(thiserror::Error, Debug)]
pub enum PubKeyError {
	#[error("{0:?} keys are not supported")]
	UnsupportedAlgo(KeyAlgo),
	#[cfg(feature = "ed25519")]
	#[error(transparent)]
	Ed25519(#[from] crate::crypto::ed25519::TryFromBytesError),
}

impl Display for DidKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}
