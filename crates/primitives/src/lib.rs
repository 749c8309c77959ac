//! Data model shared by every crate in the ethscriptions derivation core.
//!
//! This crate holds plain data: L1 block/transaction/receipt/log shapes, the
//! [`EthscriptionOp`] variants produced by the extractor, and the L2 block /
//! attributes / deposit types consumed by the driver and engine client. No
//! I/O, no derivation logic.

pub mod hash;
pub use hash::{Address20, ByteString, Hash32};

pub mod l1;
pub use l1::{L1Block, L1Tx, Log, Receipt};

pub mod ops;
pub use ops::{EthscriptionOp, OpSource};

pub mod l2;
pub use l2::{DepositSourceDomain, L1Attributes, L2Block, L2DepositTx};
