//! Signable payload construction.
//!
//! A signature is never computed over raw input directly; it is
//! computed over the canonical bytes of a fixed-shape record:
//!
//! ```text
//! (data (flags raw) (hash <algorithm> <raw-bytes>))
//! ```
//!
//! The provider hashes the raw-flagged data internally, so producer
//! and verifier sign and check byte-identical payloads by
//! construction.

use crate::crypto::HashAlgorithm;
use crate::error::PayloadError;
use crate::record::PublicRecord;
use crate::sexp::{self, Sexp};

/// Default cap on bytes accepted into a payload.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Per-call payload limits. Oversized input is rejected, never
/// truncated into a different signed message.
#[derive(Debug, Clone)]
pub struct PayloadLimits {
    pub max_data_len: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            max_data_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

/// The exact byte sequence a signature is computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignablePayload {
    sexp: Sexp,
}

impl SignablePayload {
    /// Payload over raw message bytes.
    pub fn for_data(
        data: &[u8],
        algorithm: HashAlgorithm,
        limits: &PayloadLimits,
    ) -> Result<Self, PayloadError> {
        if data.len() > limits.max_data_len {
            return Err(PayloadError::PayloadTooLarge {
                len: data.len(),
                max: limits.max_data_len,
            });
        }
        Ok(Self {
            sexp: Sexp::list(vec![
                Sexp::atom("data"),
                Sexp::pair("flags", "raw"),
                Sexp::list(vec![
                    Sexp::atom("hash"),
                    Sexp::atom(algorithm.name()),
                    Sexp::atom(data.to_vec()),
                ]),
            ]),
        })
    }

    /// Payload over a public record's canonical serialization, used
    /// when a root key certifies an online key.
    pub fn for_certification(
        record: &PublicRecord,
        algorithm: HashAlgorithm,
        limits: &PayloadLimits,
    ) -> Result<Self, PayloadError> {
        Self::for_data(&record.serialize(), algorithm, limits)
    }

    /// The bytes handed to the signature provider.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        sexp::serialize(&self.sexp)
    }

    pub fn sexp(&self) -> &Sexp {
        &self.sexp
    }
}
