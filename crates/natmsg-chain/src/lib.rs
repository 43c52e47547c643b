//! # Natural Message Chain
//!
//! Two-hop trust chain verification: an online (leaf) key certified
//! by an offline root key, with the root identity pinned by an
//! out-of-band fingerprint.
//!
//! The verifier is a pure state machine over already-retrieved byte
//! buffers; see [`ChainVerifier`]. Every rejection carries a distinct
//! [`RejectReason`] naming the hop that failed.

pub mod error;
pub mod verifier;

pub use error::ChainError;
pub use verifier::{ChainConfig, ChainState, ChainVerifier, RejectReason, TrustChain, Verdict};
