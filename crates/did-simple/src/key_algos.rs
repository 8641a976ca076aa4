use crate::varint::{encode_varint, VarintEncoding};

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum KeyAlgo {
	Ed25519,
}

impl KeyAlgo {
	pub fn pub_key_len(&self) -> usize {
		match self {
			Self::Ed25519 => Ed25519::PUB_KEY_LEN,
		}
	}

	/// The [multicodec] value of the public key type.
	///
	/// [multicodec]: https://github.com/multiformats/multicodec/blob/master/table.csv
	pub fn multicodec_value(&self) -> u16 {
		match self {
			Self::Ed25519 => Ed25519::MULTICODEC_VALUE,
		}
	}

	/// Looks up the algorithm from its multicodec value, if we support it.
	pub fn from_multicodec_value(value: u16) -> Option<Self> {
		if value == Ed25519::MULTICODEC_VALUE {
			Some(Self::Ed25519)
		} else {
			None
		}
	}

	pub(crate) fn multicodec_prefix(&self) -> VarintEncoding {
		encode_varint(self.multicodec_value())
	}
}

// ---- internal code ----

/// A key algorithm that is known statically, at compile time.
pub(crate) trait StaticKeyAlgo {
	const PUB_KEY_LEN: usize;
	const MULTICODEC_VALUE: u16;
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct Ed25519;

impl StaticKeyAlgo for Ed25519 {
	const PUB_KEY_LEN: usize = 32;
	const MULTICODEC_VALUE: u16 = 0xED;
}

impl PartialEq<Ed25519> for KeyAlgo {
	fn eq(&self, _other: &Ed25519) -> bool {
		*self == KeyAlgo::Ed25519
	}
}
