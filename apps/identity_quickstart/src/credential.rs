//! [W3C Verifiable Credentials][vc] secured as JWTs.
//!
//! A credential is created in memory from a set of claims, signed by a
//! [`BearerDid`] into a compact `EdDSA` JWT, and can later be parsed back out of
//! that JWT. [`VerifiableCredential::verify`] additionally checks the signature
//! against the issuer's `did:key`.
//!
//! [vc]: https://www.w3.org/TR/vc-data-model/

use std::{collections::HashSet, str::FromStr as _};

use chrono::{DateTime, SubsecRound as _, Utc};
use did_simple::url::DidUrl;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
	identity::{resolve_key, BearerDid, ResolveError},
	jwk::{ed25519_decoding_key, ed25519_encoding_key},
	UuidProvider,
};

pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const BASE_TYPE: &str = "VerifiableCredential";

/// Claims about the subject, keyed by claim name.
pub type Claims = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
	/// The specific type of the credential, added after [`BASE_TYPE`].
	pub credential_type: String,
	pub issuer: String,
	/// The id of the credential subject, usually a DID.
	pub subject: String,
	pub data: Claims,
	/// Defaults to now.
	pub issuance_date: Option<DateTime<Utc>>,
	pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcDataModel {
	#[serde(rename = "@context")]
	pub context: Vec<String>,
	#[serde(rename = "type")]
	pub types: Vec<String>,
	pub id: String,
	pub issuer: String,
	pub issuance_date: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiration_date: Option<DateTime<Utc>>,
	pub credential_subject: CredentialSubject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
	pub id: String,
	#[serde(flatten)]
	pub claims: Claims,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
	pub vc_data_model: VcDataModel,
}

/// The payload of a VC-JWT.
#[derive(Debug, Serialize, Deserialize)]
struct VcJwtClaims {
	iss: String,
	sub: String,
	jti: String,
	nbf: i64,
	iat: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	exp: Option<i64>,
	vc: VcDataModel,
}

/// The only part of the payload needed to parse without verifying.
#[derive(Debug, Deserialize)]
struct LenientVcJwtClaims {
	vc: Option<VcDataModel>,
}

impl VerifiableCredential {
	pub fn create(
		options: CreateOptions,
		uuids: &UuidProvider,
	) -> Result<Self, CreateError> {
		let CreateOptions {
			credential_type,
			issuer,
			subject,
			data,
			issuance_date,
			expiration_date,
		} = options;

		if credential_type.trim().is_empty() {
			return Err(CreateError::EmptyType);
		}
		if issuer.trim().is_empty() {
			return Err(CreateError::EmptyIssuer);
		}
		if subject.trim().is_empty() {
			return Err(CreateError::EmptySubject);
		}
		if data.contains_key("id") {
			return Err(CreateError::ReservedClaim("id"));
		}
		// JWT timestamps only have second precision.
		let issuance_date = issuance_date.unwrap_or_else(Utc::now).trunc_subsecs(0);
		let expiration_date = expiration_date.map(|date| date.trunc_subsecs(0));
		if let Some(expiration_date) = expiration_date {
			if expiration_date <= issuance_date {
				return Err(CreateError::ExpiresBeforeIssued);
			}
		}

		let mut types = vec![BASE_TYPE.to_owned()];
		if credential_type != BASE_TYPE {
			types.push(credential_type);
		}

		Ok(Self {
			vc_data_model: VcDataModel {
				context: vec![BASE_CONTEXT.to_owned()],
				types,
				id: uuids.next_urn(),
				issuer,
				issuance_date,
				expiration_date,
				credential_subject: CredentialSubject {
					id: subject,
					claims: data,
				},
			},
		})
	}

	pub fn id(&self) -> &str {
		&self.vc_data_model.id
	}

	/// The most specific type of the credential.
	pub fn credential_type(&self) -> &str {
		self.vc_data_model
			.types
			.last()
			.map_or(BASE_TYPE, String::as_str)
	}

	pub fn issuer(&self) -> &str {
		&self.vc_data_model.issuer
	}

	pub fn subject(&self) -> &str {
		&self.vc_data_model.credential_subject.id
	}

	pub fn claims(&self) -> &Claims {
		&self.vc_data_model.credential_subject.claims
	}

	pub fn issuance_date(&self) -> DateTime<Utc> {
		self.vc_data_model.issuance_date
	}

	pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
		self.vc_data_model.expiration_date
	}

	/// Signs the credential as a JWT, using the bearer's key. The bearer must be
	/// the credential's issuer.
	pub fn sign(&self, bearer: &BearerDid) -> Result<String, SignError> {
		if self.issuer() != bearer.did().as_str() {
			return Err(SignError::IssuerMismatch {
				issuer: self.issuer().to_owned(),
				signer: bearer.did().to_string(),
			});
		}
		let issued_at = self.issuance_date().timestamp();
		let claims = VcJwtClaims {
			iss: self.issuer().to_owned(),
			sub: self.subject().to_owned(),
			jti: self.id().to_owned(),
			nbf: issued_at,
			iat: issued_at,
			exp: self.expiration_date().map(|date| date.timestamp()),
			vc: self.vc_data_model.clone(),
		};
		let mut header = Header::new(Algorithm::EdDSA);
		header.kid = Some(bearer.key_id().to_string());

		let key = ed25519_encoding_key(bearer.signing_key())?;
		Ok(jsonwebtoken::encode(&header, &claims, &key)?)
	}

	/// Reads a credential out of a VC-JWT. This does *not* check the signature,
	/// use [`Self::verify`] for that.
	pub fn parse_jwt(jwt: &str) -> Result<Self, ParseError> {
		let header = jsonwebtoken::decode_header(jwt).map_err(ParseError::Malformed)?;
		if header.alg != Algorithm::EdDSA {
			return Err(ParseError::UnsupportedAlgorithm(header.alg));
		}

		let mut validation = Validation::new(Algorithm::EdDSA);
		validation.insecure_disable_signature_validation();
		validation.required_spec_claims = HashSet::new();
		validation.validate_exp = false;
		validation.validate_aud = false;
		let claims = jsonwebtoken::decode::<LenientVcJwtClaims>(
			jwt,
			&DecodingKey::from_secret(&[]),
			&validation,
		)
		.map_err(ParseError::Malformed)?
		.claims;

		let vc_data_model = claims.vc.ok_or(ParseError::MissingVcClaim)?;
		Ok(Self { vc_data_model })
	}

	/// Parses a VC-JWT and checks its signature against the `did:key` named in
	/// the header, along with its validity period.
	pub fn verify(jwt: &str) -> Result<Self, VerifyError> {
		let header = jsonwebtoken::decode_header(jwt)
			.map_err(|err| VerifyError::Parse(ParseError::Malformed(err)))?;
		if header.alg != Algorithm::EdDSA {
			return Err(ParseError::UnsupportedAlgorithm(header.alg).into());
		}
		let kid = header.kid.ok_or(VerifyError::MissingKeyId)?;
		let kid = DidUrl::from_str(&kid).map_err(|_| VerifyError::InvalidKeyId(kid))?;
		let pub_key = resolve_key(&kid)?;
		let decoding_key =
			ed25519_decoding_key(&pub_key).map_err(VerifyError::Signature)?;

		let mut validation = Validation::new(Algorithm::EdDSA);
		validation.required_spec_claims =
			HashSet::from(["iss", "sub", "nbf"].map(String::from));
		validation.validate_nbf = true;
		validation.validate_aud = false;
		let claims = jsonwebtoken::decode::<VcJwtClaims>(jwt, &decoding_key, &validation)
			.map_err(VerifyError::Signature)?
			.claims;

		let signer = kid.did();
		if claims.iss != signer.as_str() || claims.vc.issuer != claims.iss {
			return Err(VerifyError::IssuerMismatch {
				issuer: claims.vc.issuer,
				signer: signer.to_string(),
			});
		}
		if claims.sub != claims.vc.credential_subject.id {
			return Err(VerifyError::SubjectMismatch);
		}
		Ok(Self {
			vc_data_model: claims.vc,
		})
	}
}

#[derive(thiserror::Error, Debug)]
pub enum CreateError {
	#[error("credential type must not be empty")]
	EmptyType,
	#[error("credential issuer must not be empty")]
	EmptyIssuer,
	#[error("credential subject must not be empty")]
	EmptySubject,
	#[error("the claim {0:?} is reserved")]
	ReservedClaim(&'static str),
	#[error("the expiration date must be after the issuance date")]
	ExpiresBeforeIssued,
}

#[derive(thiserror::Error, Debug)]
pub enum SignError {
	#[error("credential issuer {issuer} is not the signer {signer}")]
	IssuerMismatch { issuer: String, signer: String },
	#[error("failed to prepare signing key")]
	Key(#[from] did_simple::crypto::ed25519::Pkcs8Error),
	#[error("failed to encode jwt")]
	Encode(#[from] jsonwebtoken::errors::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
	#[error("not a well formed VC-JWT")]
	Malformed(#[source] jsonwebtoken::errors::Error),
	#[error("expected EdDSA, but the jwt uses {0:?}")]
	UnsupportedAlgorithm(Algorithm),
	#[error("the jwt has no `vc` claim")]
	MissingVcClaim,
}

#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error("the jwt header has no `kid`")]
	MissingKeyId,
	#[error("the jwt `kid` {0:?} is not a DID url")]
	InvalidKeyId(String),
	#[error("failed to resolve the signing key")]
	Resolve(#[from] ResolveError),
	#[error("the signature or validity period did not check out")]
	Signature(#[source] jsonwebtoken::errors::Error),
	#[error("credential issuer {issuer} is not the signer {signer}")]
	IssuerMismatch { issuer: String, signer: String },
	#[error("the jwt `sub` does not match the credential subject")]
	SubjectMismatch,
}

#[cfg(test)]
mod test {
	use base64::{prelude::BASE64_URL_SAFE_NO_PAD, Engine as _};
	use chrono::{Duration, TimeZone as _};
	use serde_json::json;
	use uuid::Uuid;

	use super::*;
	use crate::crypto::SeededCrypto;

	const TYPE: &str = "Web5QuickstartCompletionCredential";

	fn alice() -> BearerDid {
		BearerDid::generate(&SeededCrypto::new([42; 32]))
	}

	fn claims(value: Value) -> Claims {
		let Value::Object(map) = value else {
			panic!("expected a json object");
		};
		map
	}

	fn options(bearer: &BearerDid, data: Claims) -> CreateOptions {
		CreateOptions {
			credential_type: TYPE.to_owned(),
			issuer: bearer.did().to_string(),
			subject: bearer.did().to_string(),
			data,
			..Default::default()
		}
	}

	fn decode_part(jwt: &str, idx: usize) -> Value {
		let part = jwt.split('.').nth(idx).unwrap();
		serde_json::from_slice(&BASE64_URL_SAFE_NO_PAD.decode(part).unwrap()).unwrap()
	}

	#[test]
	fn test_create() -> eyre::Result<()> {
		let bearer = alice();
		let uuid = Uuid::from_u128(7);
		let issued = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
		let vc = VerifiableCredential::create(
			CreateOptions {
				issuance_date: Some(issued + Duration::milliseconds(250)),
				..options(&bearer, claims(json!({"name": "Alice Smith"})))
			},
			&UuidProvider::new_from_sequence(vec![uuid]),
		)?;

		assert_eq!(vc.id(), uuid.urn().to_string());
		assert_eq!(vc.credential_type(), TYPE);
		assert_eq!(vc.issuer(), bearer.did().as_str());
		assert_eq!(vc.subject(), bearer.did().as_str());
		assert_eq!(vc.issuance_date(), issued, "should truncate to seconds");

		let json = serde_json::to_value(&vc)?;
		let model = &json["vcDataModel"];
		assert_eq!(model["@context"], json!([BASE_CONTEXT]));
		assert_eq!(model["type"], json!([BASE_TYPE, TYPE]));
		assert_eq!(model["issuanceDate"], "2024-06-01T12:30:00Z");
		assert_eq!(model["credentialSubject"]["name"], "Alice Smith");
		assert_eq!(model["credentialSubject"]["id"], bearer.did().as_str());
		assert!(model.get("expirationDate").is_none());
		Ok(())
	}

	#[test]
	fn test_create_rejects_malformed() {
		let bearer = alice();
		let uuids = UuidProvider::default();
		let create = |options| VerifiableCredential::create(options, &uuids);

		let base = options(&bearer, Claims::new());
		assert!(matches!(
			create(CreateOptions {
				credential_type: " ".to_owned(),
				..base.clone()
			}),
			Err(CreateError::EmptyType)
		));
		assert!(matches!(
			create(CreateOptions {
				issuer: String::new(),
				..base.clone()
			}),
			Err(CreateError::EmptyIssuer)
		));
		assert!(matches!(
			create(CreateOptions {
				subject: String::new(),
				..base.clone()
			}),
			Err(CreateError::EmptySubject)
		));
		assert!(matches!(
			create(options(&bearer, claims(json!({"id": "did:key:other"})))),
			Err(CreateError::ReservedClaim("id"))
		));
		let now = Utc::now();
		assert!(matches!(
			create(CreateOptions {
				issuance_date: Some(now),
				expiration_date: Some(now - Duration::days(1)),
				..base
			}),
			Err(CreateError::ExpiresBeforeIssued)
		));
	}

	#[test]
	fn test_sign_then_parse_round_trips() -> eyre::Result<()> {
		let bearer = alice();
		let data = claims(json!({
			"name": "Alice Smith",
			"expertiseLevel": "Beginner",
			"nested": {"list": [1, 2, 3]},
		}));
		let vc = VerifiableCredential::create(
			options(&bearer, data.clone()),
			&UuidProvider::default(),
		)?;
		let jwt = vc.sign(&bearer)?;
		assert_eq!(jwt.split('.').count(), 3);

		let parsed = VerifiableCredential::parse_jwt(&jwt)?;
		assert_eq!(parsed, vc);
		assert_eq!(parsed.issuer(), vc.issuer());
		assert_eq!(parsed.subject(), vc.subject());
		assert_eq!(parsed.credential_type(), TYPE);
		assert_eq!(parsed.claims(), &data);
		Ok(())
	}

	#[test]
	fn test_empty_claims_still_sign_and_parse() -> eyre::Result<()> {
		let bearer = alice();
		let vc = VerifiableCredential::create(
			options(&bearer, Claims::new()),
			&UuidProvider::default(),
		)?;
		let jwt = vc.sign(&bearer)?;
		assert!(!jwt.is_empty());
		let parsed = VerifiableCredential::verify(&jwt)?;
		assert!(parsed.claims().is_empty());
		assert_eq!(parsed.subject(), bearer.did().as_str());
		Ok(())
	}

	#[test]
	fn test_jwt_layout() -> eyre::Result<()> {
		let bearer = alice();
		let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let expires = issued + Duration::days(365);
		let vc = VerifiableCredential::create(
			CreateOptions {
				issuance_date: Some(issued),
				expiration_date: Some(expires),
				..options(&bearer, Claims::new())
			},
			&UuidProvider::default(),
		)?;
		let jwt = vc.sign(&bearer)?;

		let header = decode_part(&jwt, 0);
		assert_eq!(header["alg"], "EdDSA");
		assert_eq!(header["typ"], "JWT");
		assert_eq!(header["kid"], bearer.key_id().as_str());

		let payload = decode_part(&jwt, 1);
		assert_eq!(payload["iss"], bearer.did().as_str());
		assert_eq!(payload["sub"], bearer.did().as_str());
		assert_eq!(payload["jti"], vc.id());
		assert_eq!(payload["nbf"], issued.timestamp());
		assert_eq!(payload["iat"], issued.timestamp());
		assert_eq!(payload["exp"], expires.timestamp());
		assert_eq!(payload["vc"]["expirationDate"], "2024-12-31T00:00:00Z");
		Ok(())
	}

	#[test]
	fn test_sign_requires_issuer() -> eyre::Result<()> {
		let bearer = alice();
		let other = BearerDid::generate(&SeededCrypto::new([1; 32]));
		let vc = VerifiableCredential::create(
			options(&bearer, Claims::new()),
			&UuidProvider::default(),
		)?;
		assert!(matches!(
			vc.sign(&other),
			Err(SignError::IssuerMismatch { .. })
		));
		Ok(())
	}

	#[test]
	fn test_parse_rejects_garbage() {
		assert!(matches!(
			VerifiableCredential::parse_jwt("not a jwt"),
			Err(ParseError::Malformed(_))
		));

		// A well formed, but unsigned, jwt without a `vc` claim.
		let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"EdDSA","typ":"JWT"}"#);
		let payload = BASE64_URL_SAFE_NO_PAD.encode(r#"{"iss":"did:key:z"}"#);
		let jwt = format!("{header}.{payload}.c2ln");
		assert!(matches!(
			VerifiableCredential::parse_jwt(&jwt),
			Err(ParseError::MissingVcClaim)
		));

		let header = BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
		let jwt = format!("{header}.{payload}.c2ln");
		assert!(matches!(
			VerifiableCredential::parse_jwt(&jwt),
			Err(ParseError::UnsupportedAlgorithm(Algorithm::HS256))
		));
	}

	#[test]
	fn test_verify_detects_tampering() -> eyre::Result<()> {
		let bearer = alice();
		let vc = VerifiableCredential::create(
			options(&bearer, claims(json!({"expertiseLevel": "Beginner"}))),
			&UuidProvider::default(),
		)?;
		let jwt = vc.sign(&bearer)?;
		assert_eq!(VerifiableCredential::verify(&jwt)?, vc);

		let mut payload = decode_part(&jwt, 1);
		payload["vc"]["credentialSubject"]["expertiseLevel"] = json!("Expert");
		let forged_payload = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?);
		let parts: Vec<&str> = jwt.split('.').collect();
		let forged = format!("{}.{forged_payload}.{}", parts[0], parts[2]);

		// Parsing alone doesn't notice, verifying does.
		let parsed = VerifiableCredential::parse_jwt(&forged)?;
		assert_eq!(parsed.claims()["expertiseLevel"], "Expert");
		assert!(matches!(
			VerifiableCredential::verify(&forged),
			Err(VerifyError::Signature(_))
		));
		Ok(())
	}

	#[test]
	fn test_verify_rejects_foreign_kid() -> eyre::Result<()> {
		let bearer = alice();
		let vc = VerifiableCredential::create(
			options(&bearer, Claims::new()),
			&UuidProvider::default(),
		)?;
		let jwt = vc.sign(&bearer)?;

		// Swap in another DID's key id, keeping the original signature.
		let other = BearerDid::generate(&SeededCrypto::new([9; 32]));
		let mut header = decode_part(&jwt, 0);
		header["kid"] = json!(other.key_id().as_str());
		let header = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
		let rest = jwt.split_once('.').unwrap().1;
		let forged = format!("{header}.{rest}");
		assert!(matches!(
			VerifiableCredential::verify(&forged),
			Err(VerifyError::Signature(_))
		));
		Ok(())
	}
}
