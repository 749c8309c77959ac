//! Ethscription operations emitted by the extractor.

use crate::hash::{Address20, ByteString, Hash32};
use serde::{Deserialize, Serialize};

/// Whether an operation was read from transaction calldata or from an event
/// log. Carried through so downstream consumers (and the test suite, for
/// P2/P3) can assert precedence rules without re-deriving them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpSource {
    /// Decoded from `L1Tx::input`.
    Input,
    /// Decoded from a log emitted during the transaction.
    Event,
}

/// A single ethscription operation extracted from one L1 transaction.
///
/// Ordering within a block is by `(l1_tx_index, log_index)` ascending (spec
/// invariant I4); that ordering is a property of the sequence the extractor
/// returns, not of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EthscriptionOp {
    /// A new ethscription, created either by embedding a data URI in
    /// calldata (ESIP-0) or by emitting a `CreateEthscription` event
    /// (ESIP-3).
    Create {
        /// The L1 transaction that created it.
        l1_tx_hash: Hash32,
        /// The address that authored the content.
        creator: Address20,
        /// The address that receives ownership.
        initial_owner: Address20,
        /// The normalized `data:` URI content.
        content_uri: ByteString,
        /// Where this create was read from.
        source: OpSource,
        /// Whether the content URI carried an `;rule=esip6` parameter.
        esip6: bool,
    },
    /// A transfer of one ethscription, by calldata (ESIP-0 single-transfer)
    /// or by event (ESIP-1/ESIP-2).
    TransferSingle {
        /// The L1 transaction that performed the transfer.
        l1_tx_hash: Hash32,
        /// The current owner, as of the transfer.
        from: Address20,
        /// The new owner.
        to: Address20,
        /// The ethscription being transferred.
        ethscription_id: Hash32,
        /// Where this transfer was read from.
        source: OpSource,
        /// ESIP-2: the previous owner the transfer is conditioned on.
        required_previous_owner: Option<Address20>,
    },
    /// A transfer of several ethscriptions in one transaction (ESIP-5).
    /// Input-only: there is no event-log equivalent.
    TransferMulti {
        /// The L1 transaction that performed the transfer.
        l1_tx_hash: Hash32,
        /// The current owner.
        from: Address20,
        /// The new owner.
        to: Address20,
        /// The ethscriptions being transferred, in calldata order.
        ethscription_ids: Vec<Hash32>,
    },
}

impl EthscriptionOp {
    /// Returns the L1 transaction hash this operation was extracted from.
    pub const fn l1_tx_hash(&self) -> Hash32 {
        match self {
            Self::Create { l1_tx_hash, .. } => *l1_tx_hash,
            Self::TransferSingle { l1_tx_hash, .. } => *l1_tx_hash,
            Self::TransferMulti { l1_tx_hash, .. } => *l1_tx_hash,
        }
    }

    /// Returns `true` if this is a [`EthscriptionOp::Create`].
    pub const fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }
}
