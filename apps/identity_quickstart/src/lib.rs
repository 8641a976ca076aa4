//! Create a decentralized identifier, issue a verifiable credential to it,
//! store the credential in a decentralized web node, and read it back.
//!
//! [`workflow::run`] drives the whole thing through the [`workflow::Web5Api`]
//! trait. [`workflow::LocalWeb5`] implements that trait on top of the rest of
//! this crate: `did:key` identities held in a password protected
//! [`vault::IdentityVault`], VC-JWTs, and a SQLite backed [`dwn::Dwn`].

pub mod agent;
pub mod credential;
pub mod crypto;
pub mod dwn;
pub mod identity;
pub mod jwk;
pub mod vault;
pub mod workflow;

mod uuid;

pub use crate::dwn::MigratedDbPool;
pub use crate::uuid::UuidProvider;
