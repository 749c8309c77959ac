//! Error types for the extractor and attributes builder.

/// Errors raised while decoding a previously encoded attributes calldata
/// payload (used by tests and by any component that reads the L2 chain
/// back). Encoding itself cannot fail: every input field is a
/// fixed-width integer or hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributesCalldataError {
    /// The calldata is not exactly 164 bytes long.
    #[error("invalid attributes calldata length: expected 164, got {0}")]
    InvalidLength(usize),
    /// The 4-byte selector does not match `setL1BlockValuesEcotone()`.
    #[error("invalid attributes calldata selector: {0:02x?}")]
    InvalidSelector([u8; 4]),
}
