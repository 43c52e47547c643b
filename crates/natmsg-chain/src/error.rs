//! Error types for chain verification.
//!
//! A [`ChainError`] means a check could not be evaluated at all;
//! rejection of a well-formed chain is a verdict, not an error
//! (see [`crate::verifier::RejectReason`]).

use natmsg_core::{CryptoError, PayloadError, RecordError};
use thiserror::Error;

/// Structural failures of chain inputs.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("record is missing its public-key subrecord")]
    MissingPublicKey,

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Record(#[from] RecordError),
}
