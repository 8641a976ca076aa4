//! A Decentralized Identifier (aka [DID][spec]), is a globally unique
//! identifier that provides a general purpose way of looking up public keys
//! associated with the globally unique identifier.
//!
//! This means that unlike a UUID, someone can prove that they own a DID, and
//! you can sign messages using DIDs! This makes DIDs strictly more useful
//! than traditional UUIDs as account identifiers and are very useful for
//! issuing credentials about yourself or others.
//!
//! Unlike traditional centralized accounts, services that use DIDs give users
//! custody over their account identity. Authentication of users can happen
//! without the need for a centralized service or database. Instead, whoever
//! holds the private keys associated with a DID will be able to authenticate as
//! the account owner.
//!
//! Only the [did:key] method is supported, and only for ed25519 keys.
//!
//! # Example
//!
//! ```
//! # #[cfg(all(feature = "ed25519", feature = "random"))]
//! # {
//! use did_simple::crypto::ed25519::SigningKey;
//! use did_simple::methods::key::DidKey;
//!
//! let signing_key = SigningKey::random();
//! let did = DidKey::from_pub_key(&signing_key.verifying_key());
//! assert!(did.as_str().starts_with("did:key:z6Mk"));
//! assert_eq!(did.pub_key().unwrap(), signing_key.verifying_key());
//! # }
//! ```
//!
//! [spec]: https://www.w3.org/TR/did-core/
//! [did:key]: https://w3c-ccg.github.io/did-method-key/

#![cfg_attr(not(feature = "allow-unsafe"), forbid(unsafe_code))]

use std::str::FromStr;

pub mod crypto;
pub mod key_algos;
pub mod methods;
pub mod uri;
pub mod url;
pub mod utf8bytes;

mod varint;

pub trait Did: FromStr {
	fn uri(&self) -> self::uri::DidUri;
}
