//! Error types returned by the [`crate::EngineClient`].

/// Errors that can occur while driving the Engine API.
///
/// This is a leaf error type: the driver wraps it into its own severity
/// taxonomy (`NotReady` / `Transient` / `ProtocolFatal`), it does not
/// classify itself. A `Transient` engine hiccup (connection refused, a
/// `SYNCING` status while the client warms up) looks identical at this layer
/// to a genuine protocol violation; only the driver, with retry-count
/// context, can tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The HTTP transport to the execution client failed.
    #[error("transport error calling {method}: {source}")]
    Transport {
        /// The Engine API method being called.
        method: &'static str,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The JSON-RPC signing key could not be loaded.
    #[error("invalid jwt secret: {0}")]
    InvalidJwtSecret(String),
    /// The JSON-RPC envelope carried an `error` object.
    #[error("engine returned rpc error {code} calling {method}: {message}")]
    JsonRpc {
        /// The Engine API method being called.
        method: &'static str,
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// The response body could not be deserialized into the expected shape.
    #[error("malformed response from {method}: {source}")]
    MalformedResponse {
        /// The Engine API method being called.
        method: &'static str,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// `engine_forkchoiceUpdated` returned a payload build request but no
    /// `payload_id`.
    #[error("forkchoiceUpdated requested a payload build but returned no payload_id")]
    MissingPayloadId,
    /// `engine_getPayload` returned a payload with no transactions or an
    /// empty block hash.
    #[error("getPayload returned an empty payload")]
    EmptyPayload,
    /// `engine_forkchoiceUpdated` or `engine_newPayload` returned a status
    /// other than `VALID` when `VALID` was required.
    #[error("engine returned non-VALID status {status} calling {method}: {validation_error:?}")]
    InvalidStatus {
        /// The Engine API method being called.
        method: &'static str,
        /// The payload status string (`INVALID`, `SYNCING`, `ACCEPTED`, ...).
        status: String,
        /// The validation error message, if the client provided one.
        validation_error: Option<String>,
    },
    /// `engine_newPayload` returned `VALID` but `latestValidHash` did not
    /// equal the block hash that was submitted (spec §4.B).
    #[error(
        "engine {method} returned VALID but latestValidHash {observed:?} != submitted block hash {expected}"
    )]
    LatestValidHashMismatch {
        /// The Engine API method being called.
        method: &'static str,
        /// The block hash that was submitted.
        expected: alloy_primitives::B256,
        /// The `latestValidHash` the engine actually returned, if any.
        observed: Option<alloy_primitives::B256>,
    },
}

impl EngineError {
    /// `true` for statuses that indicate the execution client is still
    /// warming up rather than rejecting the payload outright.
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::InvalidStatus { status, .. } if status == "SYNCING")
    }
}
