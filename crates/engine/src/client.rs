//! A minimal Engine API client, driven by the Proposer component of the
//! driver (spec §4.E).

use alloy_primitives::B256;
use alloy_rpc_types_engine::{
    Claims, ExecutionPayloadEnvelopeV2, ExecutionPayloadEnvelopeV3, ExecutionPayloadFieldV2,
    ExecutionPayloadV1, ForkchoiceState, ForkchoiceUpdated, JwtSecret, PayloadId, PayloadStatus,
    PayloadStatusEnum,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::{attributes::PayloadAttributes, errors::EngineError};

/// A block built by the execution client, carrying the full payload
/// `new_payload` needs to forward for validation (spec §4.E step 3-4) along
/// with the identifying fields the driver's head tracker and filler
/// scheduler read directly.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltBlock {
    /// The new block's hash.
    pub block_hash: B256,
    /// The new block's parent hash.
    pub parent_hash: B256,
    /// The new block's number.
    pub number: u64,
    /// The new block's timestamp.
    pub timestamp: u64,
    /// The payload, ready to hand back to `engine_newPayload`.
    payload: BuiltPayload,
}

/// The version-tagged payload body backing a [`BuiltBlock`].
#[derive(Debug, Clone, PartialEq)]
enum BuiltPayload {
    V2(alloy_rpc_types_engine::ExecutionPayloadV2),
    V3(alloy_rpc_types_engine::ExecutionPayloadV3),
}

impl BuiltBlock {
    /// Builds a [`BuiltBlock`] directly from its identifying fields, for
    /// tests that need a `BuiltBlock` without a live execution client (the
    /// Proposer's own tests, and any fake [`crate::EngineClient`]-like test
    /// double in `ethscript-driver`). The inner payload is a minimal V2
    /// shell; nothing reads it directly except `new_payload`'s serialization,
    /// which a fake engine under test never exercises.
    pub fn for_test(block_hash: B256, parent_hash: B256, number: u64, timestamp: u64) -> Self {
        Self::from_v1(ExecutionPayloadV1 {
            parent_hash,
            fee_recipient: Default::default(),
            state_root: Default::default(),
            receipts_root: Default::default(),
            logs_bloom: Default::default(),
            prev_randao: Default::default(),
            block_number: number,
            gas_limit: 0,
            gas_used: 0,
            timestamp,
            extra_data: Default::default(),
            base_fee_per_gas: Default::default(),
            block_hash,
            transactions: Vec::new(),
        })
    }

    fn from_v1(inner: ExecutionPayloadV1) -> Self {
        Self {
            block_hash: inner.block_hash,
            parent_hash: inner.parent_hash,
            number: inner.block_number,
            timestamp: inner.timestamp,
            payload: BuiltPayload::V2(alloy_rpc_types_engine::ExecutionPayloadV2 {
                payload_inner: inner,
                withdrawals: Vec::new(),
            }),
        }
    }

    fn from_v2(inner: alloy_rpc_types_engine::ExecutionPayloadV2) -> Self {
        Self {
            block_hash: inner.payload_inner.block_hash,
            parent_hash: inner.payload_inner.parent_hash,
            number: inner.payload_inner.block_number,
            timestamp: inner.payload_inner.timestamp,
            payload: BuiltPayload::V2(inner),
        }
    }

    fn from_v3(inner: alloy_rpc_types_engine::ExecutionPayloadV3) -> Self {
        Self {
            block_hash: inner.payload_inner.payload_inner.block_hash,
            parent_hash: inner.payload_inner.payload_inner.parent_hash,
            number: inner.payload_inner.payload_inner.block_number,
            timestamp: inner.payload_inner.payload_inner.timestamp,
            payload: BuiltPayload::V3(inner),
        }
    }
}

/// A client for the subset of the Engine API this core drives: forkchoice
/// updates, payload retrieval, and payload validation.
///
/// JSON-RPC requests are authenticated with a fresh JWT bearer token per
/// call, since the Engine API's `iat` claim is only valid for a short
/// window and a cached token would eventually be rejected.
#[derive(Debug)]
pub struct EngineClient {
    http: reqwest::Client,
    url: reqwest::Url,
    jwt_secret: JwtSecret,
}

impl EngineClient {
    /// Creates a new client targeting the given authenticated Engine API
    /// endpoint, signing requests with `jwt_secret`.
    pub fn new(url: reqwest::Url, jwt_secret: JwtSecret) -> Self {
        Self { http: reqwest::Client::new(), url, jwt_secret }
    }

    /// Loads the JWT secret from its canonical hex encoding (a 32-byte key,
    /// optionally `0x`-prefixed) and builds a client from it.
    pub fn new_with_hex_secret(url: reqwest::Url, hex_secret: &str) -> Result<Self, EngineError> {
        let jwt_secret = JwtSecret::from_hex(hex_secret)
            .map_err(|e| EngineError::InvalidJwtSecret(e.to_string()))?;
        Ok(Self::new(url, jwt_secret))
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<R, EngineError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the unix epoch")
            .as_secs();
        let claims = Claims { iat, exp: Some(iat + 60) };
        let token = self
            .jwt_secret
            .encode(&claims)
            .map_err(|e| EngineError::InvalidJwtSecret(e.to_string()))?;

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(self.url.clone())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|source| EngineError::Transport { method, source })?;

        let body: Value = response
            .error_for_status()
            .map_err(|source| EngineError::Transport { method, source })?
            .json()
            .await
            .map_err(|source| EngineError::Transport { method, source })?;

        if let Some(error) = body.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("<no message>")
                .to_string();
            return Err(EngineError::JsonRpc { method, code, message });
        }

        let result = body.get("result").cloned().unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|source| EngineError::MalformedResponse {
            method,
            source,
        })
    }

    fn check_status(method: &'static str, status: &PayloadStatus) -> Result<(), EngineError> {
        match &status.status {
            PayloadStatusEnum::Valid => Ok(()),
            PayloadStatusEnum::Syncing => {
                warn!(target: "engine", method, "execution client reported SYNCING");
                Err(EngineError::InvalidStatus {
                    method,
                    status: "SYNCING".to_string(),
                    validation_error: None,
                })
            }
            PayloadStatusEnum::Accepted => Err(EngineError::InvalidStatus {
                method,
                status: "ACCEPTED".to_string(),
                validation_error: None,
            }),
            PayloadStatusEnum::Invalid { validation_error } => Err(EngineError::InvalidStatus {
                method,
                status: "INVALID".to_string(),
                validation_error: Some(validation_error.clone()),
            }),
        }
    }

    /// Sends `engine_forkchoiceUpdatedV2` or `V3`, selecting the version by
    /// whether `attributes` carries a beacon block root. Returns the
    /// `payload_id` when `attributes` was provided and accepted.
    pub async fn forkchoice_updated(
        &self,
        state: ForkchoiceState,
        attributes: Option<PayloadAttributes>,
    ) -> Result<Option<PayloadId>, EngineError> {
        let is_v3 = attributes.as_ref().is_some_and(PayloadAttributes::is_v3);
        let method = if is_v3 { "engine_forkchoiceUpdatedV3" } else { "engine_forkchoiceUpdatedV2" };

        let updated: ForkchoiceUpdated = self.call(method, (state, attributes)).await?;
        Self::check_status(method, &updated.payload_status)?;

        if let Some(payload_id) = updated.payload_id {
            debug!(target: "engine", %payload_id, "forkchoice update requested payload build");
            return Ok(Some(payload_id));
        }
        Ok(None)
    }

    /// Sends `engine_getPayloadV2` or `V3` for `payload_id`, returning the
    /// built block, empty-payload checked (spec §4.E step 3: "The payload's
    /// `transactions` must be non-empty ... Empty -> fatal").
    pub async fn get_payload(
        &self,
        payload_id: PayloadId,
        use_v3: bool,
    ) -> Result<BuiltBlock, EngineError> {
        let built = if use_v3 {
            let envelope: ExecutionPayloadEnvelopeV3 =
                self.call("engine_getPayloadV3", (payload_id,)).await?;
            if envelope.execution_payload.payload_inner.payload_inner.transactions.is_empty() {
                return Err(EngineError::EmptyPayload);
            }
            BuiltBlock::from_v3(envelope.execution_payload)
        } else {
            let envelope: ExecutionPayloadEnvelopeV2 =
                self.call("engine_getPayloadV2", (payload_id,)).await?;
            let inner = match envelope.execution_payload {
                ExecutionPayloadFieldV2::V1(payload) => return Ok(BuiltBlock::from_v1(payload)),
                ExecutionPayloadFieldV2::V2(payload) => payload,
            };
            if inner.payload_inner.transactions.is_empty() {
                return Err(EngineError::EmptyPayload);
            }
            BuiltBlock::from_v2(inner)
        };
        Ok(built)
    }

    /// Sends `engine_newPayloadV2` or `V3` to validate `built`, requiring
    /// `VALID` and a `latestValidHash` equal to the submitted block hash
    /// (spec §4.B: "Any status other than `VALID`, or any `latestValidHash`
    /// not equal to the submitted `blockHash`, is fatal for the current
    /// step.").
    pub async fn new_payload(
        &self,
        built: &BuiltBlock,
        parent_beacon_block_root: B256,
    ) -> Result<(), EngineError> {
        let (method, status): (&'static str, PayloadStatus) = match &built.payload {
            BuiltPayload::V3(payload) => {
                let method = "engine_newPayloadV3";
                let versioned_hashes: Vec<B256> = Vec::new();
                let status = self
                    .call(method, (payload.clone(), versioned_hashes, parent_beacon_block_root))
                    .await?;
                (method, status)
            }
            BuiltPayload::V2(payload) => {
                let method = "engine_newPayloadV2";
                let status = self.call(method, (payload.clone(),)).await?;
                (method, status)
            }
        };
        Self::check_status(method, &status)?;
        match status.latest_valid_hash {
            Some(hash) if hash == built.block_hash => Ok(()),
            other => Err(EngineError::LatestValidHashMismatch {
                method,
                expected: built.block_hash,
                observed: other,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_secret_must_be_valid() {
        let url = reqwest::Url::parse("http://localhost:8551").unwrap();
        assert!(EngineClient::new_with_hex_secret(url.clone(), "not-hex").is_err());
        assert!(EngineClient::new_with_hex_secret(url, &"ab".repeat(32)).is_ok());
    }

    #[test]
    fn valid_status_passes_check() {
        let status = PayloadStatus {
            status: PayloadStatusEnum::Valid,
            latest_valid_hash: Some(alloy_primitives::B256::ZERO),
        };
        assert!(EngineClient::check_status("engine_newPayloadV3", &status).is_ok());
    }

    #[test]
    fn invalid_status_is_rejected_with_reason() {
        let status = PayloadStatus {
            status: PayloadStatusEnum::Invalid { validation_error: "bad block".to_string() },
            latest_valid_hash: None,
        };
        let err = EngineClient::check_status("engine_newPayloadV3", &status).unwrap_err();
        match err {
            EngineError::InvalidStatus { status, validation_error, .. } => {
                assert_eq!(status, "INVALID");
                assert_eq!(validation_error.as_deref(), Some("bad block"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn syncing_status_is_transient_from_the_callers_perspective() {
        let status =
            PayloadStatus { status: PayloadStatusEnum::Syncing, latest_valid_hash: None };
        let err = EngineClient::check_status("engine_forkchoiceUpdatedV3", &status).unwrap_err();
        assert!(err.is_syncing());
    }
}
