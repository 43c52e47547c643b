//! Error types for the key service.

use natmsg_chain::ChainError;
use natmsg_core::{BundleError, CodecError, CryptoError, MetadataError, PayloadError, RecordError};
use thiserror::Error;

/// Errors that can occur during key service operations.
#[derive(Debug, Error)]
pub enum NatmsgError {
    /// Record text could not be parsed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Owner metadata was invalid.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// A key bundle could not be assembled.
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// A record had the wrong shape.
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// The signature provider failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A payload exceeded its configured ceiling.
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Chain inputs were structurally unusable.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
}

/// Result type for key service operations.
pub type Result<T> = std::result::Result<T, NatmsgError>;
