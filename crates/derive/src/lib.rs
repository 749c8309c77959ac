//! The consensus-critical half of the derivation core (spec §4.C, §4.D):
//! the Ethscription Extractor and the Attributes Transaction Builder.
//!
//! Both are pure functions of their inputs -- no I/O, no clock, no
//! randomness (spec P1) -- so they live in one crate with no dependency on
//! the engine client or any RPC transport.

pub mod attributes;
pub use attributes::{decode_calldata, encode_calldata, ATTRIBUTES_CALLDATA_LEN};

pub mod errors;
pub use errors::AttributesCalldataError;

pub mod extractor;
pub use extractor::{extract, EsipConfig};
