//! A password-gated store of the identities an agent controls.

use std::{
	collections::BTreeMap,
	sync::{
		atomic::{AtomicBool, Ordering},
		PoisonError, RwLock,
	},
};

use did_simple::methods::key::DidKey;
use sha2::{Digest as _, Sha256};
use tracing::debug;

use crate::{crypto::CryptoProvider, identity::BearerDid};

const SALT_LEN: usize = 16;

/// Holds [`BearerDid`]s behind a password.
///
/// The password is never stored, only a salted digest of it. There are no
/// strength requirements, any password (including the empty one) is accepted
/// when the vault is initialized.
#[derive(derive_more::Debug)]
pub struct IdentityVault {
	#[debug(skip)]
	salt: [u8; SALT_LEN],
	#[debug(skip)]
	verifier: [u8; 32],
	locked: AtomicBool,
	#[debug(skip)]
	identities: RwLock<BTreeMap<String, BearerDid>>,
}

impl IdentityVault {
	/// Creates an empty, unlocked vault.
	pub fn initialize(password: &str, crypto: &dyn CryptoProvider) -> Self {
		let mut salt = [0; SALT_LEN];
		crypto.fill_random(&mut salt);
		Self {
			salt,
			verifier: digest(&salt, password),
			locked: AtomicBool::new(false),
			identities: RwLock::default(),
		}
	}

	pub fn is_locked(&self) -> bool {
		self.locked.load(Ordering::SeqCst)
	}

	pub fn lock(&self) {
		debug!("locking identity vault");
		self.locked.store(true, Ordering::SeqCst);
	}

	pub fn unlock(&self, password: &str) -> Result<(), VaultError> {
		if digest(&self.salt, password) != self.verifier {
			return Err(VaultError::InvalidPassword);
		}
		debug!("unlocked identity vault");
		self.locked.store(false, Ordering::SeqCst);
		Ok(())
	}

	pub fn insert(&self, identity: BearerDid) -> Result<(), VaultError> {
		self.ensure_unlocked()?;
		self.identities
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(identity.did().to_string(), identity);
		Ok(())
	}

	/// Looks up the identity for `did`, if the vault holds it.
	pub fn get(&self, did: &DidKey) -> Result<Option<BearerDid>, VaultError> {
		self.ensure_unlocked()?;
		Ok(self
			.identities
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(did.as_str())
			.cloned())
	}

	/// The DIDs of every identity in the vault, in lexicographic order.
	pub fn list(&self) -> Result<Vec<DidKey>, VaultError> {
		self.ensure_unlocked()?;
		Ok(self
			.identities
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.values()
			.map(|identity| identity.did().clone())
			.collect())
	}

	fn ensure_unlocked(&self) -> Result<(), VaultError> {
		if self.is_locked() {
			return Err(VaultError::Locked);
		}
		Ok(())
	}
}

fn digest(salt: &[u8], password: &str) -> [u8; 32] {
	Sha256::new()
		.chain_update(salt)
		.chain_update(password.as_bytes())
		.finalize()
		.into()
}

#[derive(thiserror::Error, Debug, Eq, PartialEq)]
pub enum VaultError {
	#[error("the identity vault is locked")]
	Locked,
	#[error("the password did not match the one the vault was initialized with")]
	InvalidPassword,
}
