//! Conversions from `did-simple` keys into the JOSE key types used for
//! DID documents and for signing and verifying JWTs.

use std::collections::BTreeSet;

use base64::{prelude::BASE64_URL_SAFE_NO_PAD, Engine as _};
use did_simple::crypto::ed25519;
use jose_jwk::Jwk;
use jsonwebtoken::{DecodingKey, EncodingKey};

/// Creates a JWK from a ed25519 verifying key.
pub fn ed25519_pub_jwk(pub_key: ed25519::VerifyingKey) -> Jwk {
	Jwk {
		key: jose_jwk::Okp {
			crv: jose_jwk::OkpCurves::Ed25519,
			x: pub_key.into_inner().as_bytes().as_slice().to_owned().into(),
			d: None,
		}
		.into(),
		prm: jose_jwk::Parameters {
			ops: Some(BTreeSet::from([jose_jwk::Operations::Verify])),
			..Default::default()
		},
	}
}

/// Key for checking `EdDSA` JWT signatures.
pub fn ed25519_decoding_key(
	pub_key: &ed25519::VerifyingKey,
) -> jsonwebtoken::errors::Result<DecodingKey> {
	DecodingKey::from_ed_components(&BASE64_URL_SAFE_NO_PAD.encode(pub_key.as_bytes()))
}

/// Key for producing `EdDSA` JWT signatures.
pub fn ed25519_encoding_key(
	signing_key: &ed25519::SigningKey,
) -> Result<EncodingKey, ed25519::Pkcs8Error> {
	let der = signing_key.to_pkcs8_der()?;
	Ok(EncodingKey::from_ed_der(&der))
}
