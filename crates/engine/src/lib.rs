//! A minimal Engine API client for the ethscriptions L1->L2 derivation core.
//!
//! Speaks the subset of the Engine API the Proposer component needs: forkchoice
//! updates (with optional payload attributes), payload retrieval, and payload
//! validation. Authenticates every request with a fresh JWT bearer token,
//! generated from a shared secret per the Engine API auth spec.

pub mod attributes;
pub use attributes::PayloadAttributes;

pub mod client;
pub use client::{BuiltBlock, EngineClient};

pub mod errors;
pub use errors::EngineError;
