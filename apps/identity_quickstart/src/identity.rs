//! Bearer DIDs, and resolution of `did:key` identifiers into DID documents.

use did_simple::{
	crypto::ed25519::{SigningKey, VerifyingKey},
	methods::key::{DidKey, FromUriError, PubKeyError},
	url::DidUrl,
};
use serde::{Deserialize, Serialize};

use crate::{crypto::CryptoProvider, jwk::ed25519_pub_jwk};

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";
const JWS_2020_TYPE: &str = "JsonWebKey2020";

/// A DID along with the private key that controls it. Holding one of these
/// grants the ability to sign as the DID.
#[derive(Clone, derive_more::Debug)]
pub struct BearerDid {
	did: DidKey,
	#[debug(skip)]
	signing_key: SigningKey,
}

impl BearerDid {
	/// Creates a brand new identity.
	pub fn generate(crypto: &dyn CryptoProvider) -> Self {
		Self::from_signing_key(crypto.generate_signing_key())
	}

	pub fn from_signing_key(signing_key: SigningKey) -> Self {
		let did = DidKey::from_pub_key(&signing_key.verifying_key());
		Self { did, signing_key }
	}

	pub fn did(&self) -> &DidKey {
		&self.did
	}

	/// The verification method used when signing, e.g. as a JWT `kid`.
	pub fn key_id(&self) -> DidUrl {
		self.did.key_id()
	}

	pub fn signing_key(&self) -> &SigningKey {
		&self.signing_key
	}

	pub fn document(&self) -> DidDocument {
		DidDocument::for_key(&self.did, self.signing_key.verifying_key())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
	#[serde(rename = "@context")]
	pub context: Vec<String>,
	pub id: String,
	pub verification_method: Vec<VerificationMethod>,
	pub authentication: Vec<String>,
	pub assertion_method: Vec<String>,
}

impl DidDocument {
	fn for_key(did: &DidKey, pub_key: VerifyingKey) -> Self {
		let key_id = did.key_id().to_string();
		Self {
			context: vec![DID_CONTEXT.to_owned(), JWS_2020_CONTEXT.to_owned()],
			id: did.to_string(),
			verification_method: vec![VerificationMethod {
				id: key_id.clone(),
				kind: JWS_2020_TYPE.to_owned(),
				controller: did.to_string(),
				public_key_jwk: ed25519_pub_jwk(pub_key),
			}],
			authentication: vec![key_id.clone()],
			assertion_method: vec![key_id],
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub controller: String,
	pub public_key_jwk: jose_jwk::Jwk,
}

/// Resolves a `did:key` into its DID document. This never touches the
/// network, the document is derived entirely from the key.
pub fn resolve(did: &DidKey) -> Result<DidDocument, ResolveError> {
	let pub_key = did.pub_key()?;
	Ok(DidDocument::for_key(did, pub_key))
}

/// Resolves a DID url such as a JWT `kid` to the public key it refers to.
pub fn resolve_key(url: &DidUrl) -> Result<VerifyingKey, ResolveError> {
	let did = DidKey::try_from(url.did())?;
	if let Some(fragment) = url.fragment() {
		if fragment != did.multibase() {
			return Err(ResolveError::UnknownVerificationMethod(url.to_string()));
		}
	}
	Ok(did.pub_key()?)
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
	#[error("not a valid did:key")]
	Did(#[from] FromUriError),
	#[error("the did:key does not contain a usable public key")]
	PubKey(#[from] PubKeyError),
	#[error("{0} does not name a verification method of its DID")]
	UnknownVerificationMethod(String),
}
