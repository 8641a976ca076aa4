//! The quickstart itself: connect, issue a credential to yourself, store it,
//! and read it back.
//!
//! The steps run strictly in order. The first failure aborts the run and is
//! reported as a [`QuickstartError`], which says which [`Stage`] failed. Nothing
//! is rolled back, an identity created before the failure is kept.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use did_simple::methods::key::DidKey;
use serde_json::Value;
use tracing::info;

use crate::{
	agent::{Agent, ConnectError, ConnectOptions, IdentityError, Session},
	credential::{
		Claims, CreateError, CreateOptions, ParseError, SignError, VerifiableCredential,
		VerifyError,
	},
	crypto::CryptoProvider,
	dwn::{Dwn, DwnError, Record, RecordsCreateRequest},
	identity::BearerDid,
	UuidProvider,
};

pub const DEFAULT_PASSWORD: &str = "your-secure-password";
pub const DEFAULT_CREDENTIAL_TYPE: &str = "Web5QuickstartCompletionCredential";
pub const VC_JWT_DATA_FORMAT: &str = "application/vc+jwt";

/// The operations the quickstart needs from an identity SDK.
#[async_trait]
pub trait Web5Api: Send + Sync {
	type Session: Send + Sync;
	type Record: Send + Sync;

	/// Connects, creating a new identity. Returns the session and the DID of
	/// the new identity.
	async fn connect(&self, password: &str) -> Result<(Self::Session, DidKey), ConnectError>;

	async fn identity_get(
		&self,
		session: &Self::Session,
		did: &DidKey,
	) -> Result<BearerDid, IdentityError>;

	fn create_credential(
		&self,
		options: CreateOptions,
	) -> Result<VerifiableCredential, CreateError>;

	fn sign_credential(
		&self,
		credential: &VerifiableCredential,
		bearer: &BearerDid,
	) -> Result<String, SignError>;

	async fn records_create(
		&self,
		session: &Self::Session,
		request: RecordsCreateRequest,
	) -> Result<Self::Record, DwnError>;

	async fn record_text(&self, record: &Self::Record) -> Result<String, DwnError>;

	fn parse_credential(&self, jwt: &str) -> Result<VerifiableCredential, ParseError>;

	fn verify_credential(&self, jwt: &str) -> Result<VerifiableCredential, VerifyError>;
}

/// [`Web5Api`] backed by this crate's agent, credentials and local DWN.
#[derive(Debug)]
pub struct LocalWeb5 {
	agent: Agent,
	uuids: UuidProvider,
}

impl LocalWeb5 {
	pub fn new(crypto: Arc<dyn CryptoProvider>, dwn: Dwn) -> Self {
		Self {
			agent: Agent::new(crypto, dwn),
			uuids: UuidProvider::default(),
		}
	}
}

#[async_trait]
impl Web5Api for LocalWeb5 {
	type Session = Session;
	type Record = Record;

	async fn connect(&self, password: &str) -> Result<(Session, DidKey), ConnectError> {
		let session = self.agent.connect(ConnectOptions::new(password)).await?;
		let did = session.did().clone();
		Ok((session, did))
	}

	async fn identity_get(
		&self,
		session: &Session,
		did: &DidKey,
	) -> Result<BearerDid, IdentityError> {
		session.identity_get(did)
	}

	fn create_credential(
		&self,
		options: CreateOptions,
	) -> Result<VerifiableCredential, CreateError> {
		VerifiableCredential::create(options, &self.uuids)
	}

	fn sign_credential(
		&self,
		credential: &VerifiableCredential,
		bearer: &BearerDid,
	) -> Result<String, SignError> {
		credential.sign(bearer)
	}

	async fn records_create(
		&self,
		session: &Session,
		request: RecordsCreateRequest,
	) -> Result<Record, DwnError> {
		session.records().create(request).await
	}

	async fn record_text(&self, record: &Record) -> Result<String, DwnError> {
		record.data_text().await
	}

	fn parse_credential(&self, jwt: &str) -> Result<VerifiableCredential, ParseError> {
		VerifiableCredential::parse_jwt(jwt)
	}

	fn verify_credential(&self, jwt: &str) -> Result<VerifiableCredential, VerifyError> {
		VerifiableCredential::verify(jwt)
	}
}

#[derive(Clone, derive_more::Debug)]
pub struct QuickstartConfig {
	#[debug(skip)]
	pub password: String,
	pub credential_type: String,
	pub claims: Claims,
	pub schema: String,
	pub data_format: String,
	pub published: bool,
	/// Also check the signature of the token that was read back.
	pub verify: bool,
}

impl QuickstartConfig {
	/// The quickstart's usual credential: Alice Smith completed it today, as a
	/// beginner.
	pub fn new(password: impl Into<String>) -> Self {
		let mut claims = Claims::new();
		claims.insert("name".to_owned(), Value::from("Alice Smith"));
		claims.insert(
			"completionDate".to_owned(),
			Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
		);
		claims.insert("expertiseLevel".to_owned(), Value::from("Beginner"));
		Self {
			password: password.into(),
			credential_type: DEFAULT_CREDENTIAL_TYPE.to_owned(),
			claims,
			schema: DEFAULT_CREDENTIAL_TYPE.to_owned(),
			data_format: VC_JWT_DATA_FORMAT.to_owned(),
			published: true,
			verify: false,
		}
	}

	/// Sets the credential type, and the record schema along with it.
	pub fn with_credential_type(mut self, credential_type: impl Into<String>) -> Self {
		self.credential_type = credential_type.into();
		self.schema = self.credential_type.clone();
		self
	}

	pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.claims.insert(name.into(), value.into());
		self
	}
}

impl Default for QuickstartConfig {
	fn default() -> Self {
		Self::new(DEFAULT_PASSWORD)
	}
}

/// Everything produced along the way.
#[derive(Debug)]
pub struct QuickstartOutcome {
	pub did: DidKey,
	pub bearer_did: BearerDid,
	pub credential: VerifiableCredential,
	pub signed_jwt: String,
	pub read_jwt: String,
	pub parsed: VerifiableCredential,
	/// Whether the read back token's signature was checked.
	pub verified: bool,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum Stage {
	Connect,
	GetIdentity,
	CreateCredential,
	SignCredential,
	StoreRecord,
	ReadRecord,
	ParseCredential,
	VerifyCredential,
}

impl Stage {
	/// In the order they run.
	pub const ALL: [Self; 8] = [
		Self::Connect,
		Self::GetIdentity,
		Self::CreateCredential,
		Self::SignCredential,
		Self::StoreRecord,
		Self::ReadRecord,
		Self::ParseCredential,
		Self::VerifyCredential,
	];
}

#[derive(thiserror::Error, Debug)]
pub enum QuickstartError {
	#[error("failed to connect")]
	Connect(#[source] ConnectError),
	#[error("failed to get bearer DID")]
	GetIdentity(#[source] IdentityError),
	#[error("failed to create credential")]
	CreateCredential(#[source] CreateError),
	#[error("failed to sign credential")]
	SignCredential(#[source] SignError),
	#[error("failed to store credential in DWN")]
	StoreRecord(#[source] DwnError),
	#[error("failed to read credential from DWN")]
	ReadRecord(#[source] DwnError),
	#[error("failed to parse credential")]
	ParseCredential(#[source] ParseError),
	#[error("failed to verify credential")]
	VerifyCredential(#[source] VerifyError),
}

impl QuickstartError {
	pub fn stage(&self) -> Stage {
		match self {
			Self::Connect(_) => Stage::Connect,
			Self::GetIdentity(_) => Stage::GetIdentity,
			Self::CreateCredential(_) => Stage::CreateCredential,
			Self::SignCredential(_) => Stage::SignCredential,
			Self::StoreRecord(_) => Stage::StoreRecord,
			Self::ReadRecord(_) => Stage::ReadRecord,
			Self::ParseCredential(_) => Stage::ParseCredential,
			Self::VerifyCredential(_) => Stage::VerifyCredential,
		}
	}
}

/// Runs the quickstart once, logging the result of every step.
#[tracing::instrument(skip_all)]
pub async fn run<A: Web5Api + ?Sized>(
	api: &A,
	config: QuickstartConfig,
) -> Result<QuickstartOutcome, QuickstartError> {
	let QuickstartConfig {
		password,
		credential_type,
		claims,
		schema,
		data_format,
		published,
		verify,
	} = config;

	let (session, did) = api
		.connect(&password)
		.await
		.map_err(QuickstartError::Connect)?;
	info!("Created DID: {did}");

	let bearer_did = api
		.identity_get(&session, &did)
		.await
		.map_err(QuickstartError::GetIdentity)?;
	info!("Bearer DID: {}", bearer_did.did());

	let credential = api
		.create_credential(CreateOptions {
			credential_type,
			issuer: did.to_string(),
			subject: did.to_string(),
			data: claims,
			..Default::default()
		})
		.map_err(QuickstartError::CreateCredential)?;
	info!("Created VC: {}", pretty(&credential));

	let signed_jwt = api
		.sign_credential(&credential, &bearer_did)
		.map_err(QuickstartError::SignCredential)?;
	info!("Signed VC (JWT): {signed_jwt}");

	let record = api
		.records_create(
			&session,
			RecordsCreateRequest {
				data: signed_jwt.clone().into_bytes(),
				schema,
				data_format,
				published,
			},
		)
		.await
		.map_err(QuickstartError::StoreRecord)?;
	info!("Stored VC in DWN");

	let read_jwt = api
		.record_text(&record)
		.await
		.map_err(QuickstartError::ReadRecord)?;
	info!("Read VC from DWN: {read_jwt}");

	let parsed = api
		.parse_credential(&read_jwt)
		.map_err(QuickstartError::ParseCredential)?;
	info!("Parsed VC: {}", pretty(&parsed));

	if verify {
		api.verify_credential(&read_jwt)
			.map_err(QuickstartError::VerifyCredential)?;
		info!("Verified VC signature of {}", parsed.issuer());
	}

	Ok(QuickstartOutcome {
		did,
		bearer_did,
		credential,
		signed_jwt,
		read_jwt,
		parsed,
		verified: verify,
	})
}

fn pretty(credential: &VerifiableCredential) -> String {
	serde_json::to_string_pretty(credential)
		.unwrap_or_else(|err| format!("<failed to serialize credential: {err}>"))
}
