use std::fmt::Display;

use bytes::Bytes;

/// Wrapper around [`Bytes`] which is guaranteed to be UTF-8.
/// Like `Bytes`, it is cheaply cloneable and facilitates zero-copy.
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub struct Utf8Bytes(Bytes);

impl Utf8Bytes {
	pub fn as_str(&self) -> &str {
		// All constructors check or guarantee utf8.
		std::str::from_utf8(self.0.as_ref()).expect("infallible")
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_slice(&self) -> &[u8] {
		self.0.as_ref()
	}

	pub fn bytes(&self) -> &Bytes {
		&self.0
	}

	pub fn into_inner(self) -> Bytes {
		self.0
	}

	/// Same as [`Bytes::split_off()`], but panics if slicing doesn't result in valid utf8.
	///
	/// Afterwards `self` contains elements `[0, at)`, and the returned `Utf8Bytes`
	/// contains elements `[at, len)`.
	pub fn split_off(&mut self, at: usize) -> Self {
		assert!(
			self.as_str().is_char_boundary(at),
			"slicing would have created invalid UTF-8!"
		);
		Self(self.0.split_off(at))
	}
}

impl AsRef<[u8]> for Utf8Bytes {
	fn as_ref(&self) -> &[u8] {
		self.0.as_ref()
	}
}

impl PartialEq<str> for Utf8Bytes {
	fn eq(&self, other: &str) -> bool {
		self.as_slice() == other.as_bytes()
	}
}

impl From<Utf8Bytes> for String {
	fn from(value: Utf8Bytes) -> Self {
		value.as_str().to_owned()
	}
}

impl From<String> for Utf8Bytes {
	/// This is zero-copy, and skips UTF-8 checks.
	fn from(value: String) -> Self {
		Self(Bytes::from(value))
	}
}

impl From<&'static str> for Utf8Bytes {
	/// This is zero-copy, and skips UTF-8 checks.
	fn from(value: &'static str) -> Self {
		Self(Bytes::from_static(value.as_bytes()))
	}
}

impl TryFrom<Bytes> for Utf8Bytes {
	type Error = std::str::Utf8Error;

	/// This is zero-copy, and performs UTF-8 checks.
	fn try_from(value: Bytes) -> Result<Self, Self::Error> {
		let _s = std::str::from_utf8(value.as_ref())?;
		Ok(Self(value))
	}
}

impl Display for Utf8Bytes {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}
