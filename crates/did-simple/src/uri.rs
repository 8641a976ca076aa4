use std::{fmt::Display, str::FromStr};

use bytes::Bytes;

use crate::utf8bytes::Utf8Bytes;

#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone)]
pub enum DidMethod {
	Key,
}

impl DidMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Key => "key",
		}
	}
}

impl FromStr for DidMethod {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"key" => Self::Key,
			"" => return Err(ParseError::MissingMethod),
			_ => return Err(ParseError::UnknownMethod),
		})
	}
}

impl Display for DidMethod {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

/// Helper type to access data in the method-specific-id of a [`DidUri`].
pub struct MethodSpecificId<'a>(&'a DidUri);

impl MethodSpecificId<'_> {
	pub fn as_str(&self) -> &str {
		&(self.0.as_str()[self.0.method_specific_id.clone()])
	}

	pub fn as_slice(&self) -> &[u8] {
		&(self.0.s.as_slice()[self.0.method_specific_id.clone()])
	}

	pub fn utf8_bytes(&self) -> Utf8Bytes {
		self.0.s.clone().split_off(self.0.method_specific_id.start)
	}
}

/// A bare Decentralized Identifier, without any path, query or fragment.
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub struct DidUri {
	method: DidMethod,
	/// The string representation of the DID.
	s: Utf8Bytes,
	/// The substring for method-specific-id. This is a range index into `s`.
	method_specific_id: std::ops::RangeFrom<usize>,
}

impl DidUri {
	/// Gets the buffer representing the uri as a str.
	pub fn as_str(&self) -> &str {
		self.s.as_str()
	}

	/// Gets the buffer representing the uri as a byte slice.
	pub fn as_slice(&self) -> &[u8] {
		self.s.as_slice()
	}

	/// Gets the buffer representing the uri as a byte slice that is guaranteed to be utf8.
	pub fn utf8_bytes(&self) -> &Utf8Bytes {
		&self.s
	}

	/// Gets the buffer representing the uri as bytes.
	pub fn bytes(&self) -> &Bytes {
		self.s.bytes()
	}

	/// The method of the did.
	pub fn method(&self) -> DidMethod {
		self.method
	}

	/// Method-specific identity info.
	pub fn method_specific_id(&self) -> MethodSpecificId {
		MethodSpecificId(self)
	}

	pub fn into_inner(self) -> Utf8Bytes {
		self.s
	}

	/// Builds a `DidUri` from a buffer that was already validated by
	/// [`parse_did_prefix`], and contains nothing after the DID.
	pub(crate) fn from_validated(method: DidMethod, s: Utf8Bytes, msid_start: usize) -> Self {
		Self {
			method,
			s,
			method_specific_id: (msid_start..),
		}
	}
}

/// Characters that end the DID portion of a DID url.
pub(crate) const DID_TERMINATORS: &[char] = &['/', '?', '#'];

/// Parses the `did:method:method-specific-id` part at the start of `s`.
///
/// Returns the method, the start index of the method specific id, and the
/// end index of the DID portion.
pub(crate) fn parse_did_prefix(s: &str) -> Result<(DidMethod, usize, usize), ParseError> {
	let (method, remaining) = s
		.strip_prefix("did:")
		.ok_or(ParseError::InvalidScheme)?
		.split_once(':')
		.ok_or(ParseError::MissingMethod)?;
	let method = DidMethod::from_str(method)?;
	let start_idx = s.len() - remaining.len();
	let end_idx = remaining
		.find(DID_TERMINATORS)
		.map_or(s.len(), |pos| start_idx + pos);
	if start_idx == end_idx {
		return Err(ParseError::MissingMethodSpecificId);
	}

	Ok((method, start_idx, end_idx))
}

fn parse(s: Utf8Bytes) -> Result<DidUri, ParseError> {
	let (method, start_idx, end_idx) = parse_did_prefix(s.as_str())?;
	if end_idx != s.as_str().len() {
		return Err(ParseError::NotBareDid);
	}

	Ok(DidUri::from_validated(method, s, start_idx))
}

impl FromStr for DidUri {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(Utf8Bytes::from(s.to_owned()))
	}
}

impl TryFrom<String> for DidUri {
	type Error = ParseError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		parse(Utf8Bytes::from(s))
	}
}

impl Display for DidUri {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Debug, thiserror::Error, Eq, PartialEq, Clone, Copy)]
pub enum ParseError {
	#[error("expected the did: scheme")]
	InvalidScheme,
	#[error("expected did:method, but method was not present")]
	MissingMethod,
	#[error("encountered unknown did:method")]
	UnknownMethod,
	#[error("expected a method-specific-id after did:method:")]
	MissingMethodSpecificId,
	#[error("expected a bare did, but found a path, query or fragment")]
	NotBareDid,
}

#[cfg(test)]
mod test {
	use super::*;
	use eyre::{Result, WrapErr};

	#[test]
	fn test_parse() -> Result<()> {
		let test_cases = [DidUri {
			method: DidMethod::Key,
			s: String::from("did:key:123456").into(),
			method_specific_id: (8..),
		}];
		for expected in test_cases {
			let s = expected.s.as_str().to_owned();
			let from_str = DidUri::from_str(&s).wrap_err("failed to from_str")?;
			let try_from = DidUri::try_from(s).wrap_err("failed to try_from")?;
			assert_eq!(from_str, try_from);
			assert_eq!(from_str, expected);
			assert_eq!(from_str.method_specific_id().as_str(), "123456");
			assert_eq!(from_str.to_string(), "did:key:123456");
		}
		Ok(())
	}

	#[test]
	fn test_parse_errors() {
		let cases = [
			("key:123456", ParseError::InvalidScheme),
			("did:key", ParseError::MissingMethod),
			("did::123", ParseError::MissingMethod),
			("did:web:example.com", ParseError::UnknownMethod),
			("did:key:", ParseError::MissingMethodSpecificId),
			("did:key:#frag", ParseError::MissingMethodSpecificId),
			("did:key:123#frag", ParseError::NotBareDid),
			("did:key:123/path", ParseError::NotBareDid),
		];
		for (input, expected) in cases {
			assert_eq!(DidUri::from_str(input), Err(expected), "input: {input}");
			assert_eq!(
				DidUri::try_from(input.to_owned()),
				Err(expected),
				"input: {input}"
			);
		}
	}
}
