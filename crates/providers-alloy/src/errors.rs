//! Errors surfaced by the L1 RPC Client.

use alloy_primitives::BlockNumber;

/// Errors raised while fetching L1 chain data over JSON-RPC.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The underlying HTTP transport failed, timed out, or the node
    /// returned a JSON-RPC error. Retried internally up to the configured
    /// backoff budget before being surfaced.
    #[error("transport error calling {method} for block {block}: {source}")]
    Transport {
        /// The JSON-RPC method being called.
        method: &'static str,
        /// The block number or tag the call concerned.
        block: BlockNumber,
        /// The underlying transport error.
        #[source]
        source: alloy_transport::RpcError<alloy_transport::TransportErrorKind>,
    },

    /// `eth_getBlockByNumber` returned a block whose `transactions` field
    /// was not the hydrated (full-transaction) form this client always
    /// requests. Indicates a non-conformant RPC endpoint.
    #[error("block {0} response omitted full transaction objects")]
    NotHydrated(BlockNumber),
}
