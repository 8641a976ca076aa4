use std::{fmt::Display, str::FromStr};

use crate::{
	uri::{parse_did_prefix, DidMethod, DidUri, ParseError},
	utf8bytes::Utf8Bytes,
};

/// Helper type to access data in the method-specific-id of a [`DidUrl`].
pub struct MethodSpecificId<'a>(&'a DidUrl);

impl MethodSpecificId<'_> {
	pub fn as_str(&self) -> &str {
		&(self.0.as_str()[self.0.method_specific_id.clone()])
	}

	pub fn as_slice(&self) -> &[u8] {
		&(self.0.s.as_slice()[self.0.method_specific_id.clone()])
	}
}

/// A Decentralized Identifier, including any path, query or fragment, as a url.
///
/// The most common use is to point at a particular key of a DID, for example
/// `did:key:z6Mk...#z6Mk...`.
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub struct DidUrl {
	method: DidMethod,
	/// The string representation of the DID.
	s: Utf8Bytes,
	/// The substring for method-specific-id. This is a range index into `s`.
	method_specific_id: std::ops::Range<usize>,
	/// The substring after the `#`, if any. This is a range index into `s`.
	fragment: Option<std::ops::RangeFrom<usize>>,
}

impl DidUrl {
	/// Gets the buffer representing the url as a str.
	pub fn as_str(&self) -> &str {
		self.s.as_str()
	}

	/// Gets the buffer representing the url as a byte slice.
	pub fn as_slice(&self) -> &[u8] {
		self.s.as_slice()
	}

	/// Gets the buffer representing the url as a reference counted slice that
	/// is guaranteed to be utf8.
	pub fn as_utf8_bytes(&self) -> &Utf8Bytes {
		&self.s
	}

	/// The method of the did.
	pub fn method(&self) -> DidMethod {
		self.method
	}

	/// Method-specific identity info.
	pub fn method_specific_id(&self) -> MethodSpecificId {
		MethodSpecificId(self)
	}

	/// The part after the `#`, if present.
	pub fn fragment(&self) -> Option<&str> {
		self.fragment.clone().map(|range| &self.as_str()[range])
	}

	/// The bare DID that this url is relative to. This is zero-copy.
	pub fn did(&self) -> DidUri {
		let mut s = self.s.clone();
		let _rest = s.split_off(self.method_specific_id.end);
		DidUri::from_validated(self.method, s, self.method_specific_id.start)
	}

	/// Creates the url `{did}#{fragment}`.
	pub fn with_fragment(did: &DidUri, fragment: &str) -> Result<Self, ParseError> {
		Self::try_from(format!("{did}#{fragment}"))
	}
}

fn parse(s: Utf8Bytes) -> Result<DidUrl, ParseError> {
	let (method, start_idx, end_idx) = parse_did_prefix(s.as_str())?;
	let fragment = s.as_str()[end_idx..]
		.find('#')
		.map(|pos| (end_idx + pos + 1..));

	Ok(DidUrl {
		method,
		s,
		method_specific_id: (start_idx..end_idx),
		fragment,
	})
}

impl FromStr for DidUrl {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(Utf8Bytes::from(s.to_owned()))
	}
}

impl TryFrom<String> for DidUrl {
	type Error = ParseError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		parse(Utf8Bytes::from(s))
	}
}

impl From<DidUri> for DidUrl {
	fn from(value: DidUri) -> Self {
		let start = value.method_specific_id().as_str().len();
		let end = value.as_str().len();
		Self {
			method: value.method(),
			s: value.into_inner(),
			method_specific_id: (end - start..end),
			fragment: None,
		}
	}
}

impl Display for DidUrl {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}
