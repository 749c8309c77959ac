//! Core byte-string aliases used throughout the derivation core.

use alloy_primitives::Bytes;

/// A 32-byte hash. Used for L1/L2 block hashes, ethscription IDs, and
/// transaction hashes alike.
pub type Hash32 = alloy_primitives::B256;

/// A 20-byte Ethereum address.
pub type Address20 = alloy_primitives::Address;

/// Arbitrary byte content (transaction calldata, log data, content URIs).
///
/// A thin wrapper over [`Bytes`] so `Display` always renders the canonical
/// lowercase `0x`-prefixed form the rest of the pipeline expects, regardless
/// of how the bytes were constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ByteString(pub Bytes);

impl ByteString {
    /// Wraps a byte vector.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the underlying bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Bytes> for ByteString {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl core::fmt::Display for ByteString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_0x_prefixed() {
        let bs = ByteString::from(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(bs.to_string(), "0xdeadbeef");
    }
}
