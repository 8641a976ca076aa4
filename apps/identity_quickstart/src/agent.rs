//! The user agent: connects with a password, and hands out sessions bound to
//! a freshly created identity.

use std::sync::Arc;

use did_simple::methods::key::DidKey;
use tracing::{debug, info};

use crate::{
	crypto::CryptoProvider,
	dwn::{Dwn, DwnError, Records},
	identity::BearerDid,
	vault::{IdentityVault, VaultError},
};

#[derive(Clone, derive_more::Debug)]
pub struct ConnectOptions {
	/// Protects the identity vault.
	#[debug(skip)]
	pub password: String,
}

impl ConnectOptions {
	pub fn new(password: impl Into<String>) -> Self {
		Self {
			password: password.into(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Agent {
	crypto: Arc<dyn CryptoProvider>,
	dwn: Dwn,
}

impl Agent {
	pub fn new(crypto: Arc<dyn CryptoProvider>, dwn: Dwn) -> Self {
		Self { crypto, dwn }
	}

	pub fn crypto(&self) -> &dyn CryptoProvider {
		self.crypto.as_ref()
	}

	/// Initializes a new identity vault, and creates a new identity in it.
	///
	/// Every call creates a distinct identity, even with the same password.
	#[tracing::instrument(skip_all)]
	pub async fn connect(&self, options: ConnectOptions) -> Result<Session, ConnectError> {
		self.dwn.ping().await.map_err(ConnectError::Unavailable)?;

		let vault = IdentityVault::initialize(&options.password, self.crypto());
		let identity = BearerDid::generate(self.crypto());
		let did = identity.did().clone();
		vault.insert(identity)?;
		debug!(%did, "stored new identity in vault");
		info!("connected");

		Ok(Session {
			did,
			vault: Arc::new(vault),
			dwn: self.dwn.clone(),
		})
	}
}

/// A connected session, bound to a single DID.
#[derive(Debug, Clone)]
pub struct Session {
	did: DidKey,
	vault: Arc<IdentityVault>,
	dwn: Dwn,
}

impl Session {
	/// The DID this session was connected as.
	pub fn did(&self) -> &DidKey {
		&self.did
	}

	pub fn vault(&self) -> &IdentityVault {
		&self.vault
	}

	/// Looks up the full identity, including its signing key.
	pub fn identity_get(&self, did: &DidKey) -> Result<BearerDid, IdentityError> {
		self.vault
			.get(did)?
			.ok_or_else(|| IdentityError::Unknown(did.to_string()))
	}

	/// The records of the connected DID.
	pub fn records(&self) -> Records {
		self.dwn.records(self.did.clone())
	}
}

#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
	#[error("the record store is not available")]
	Unavailable(#[source] DwnError),
	#[error(transparent)]
	Vault(#[from] VaultError),
}

#[derive(thiserror::Error, Debug)]
pub enum IdentityError {
	#[error("no identity {0} in the vault")]
	Unknown(String),
	#[error(transparent)]
	Vault(#[from] VaultError),
}
