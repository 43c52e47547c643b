//! Error types for the Natural Message core.

use thiserror::Error;

/// Errors from the canonical record codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed record: {detail} at offset {position}")]
    MalformedRecord { detail: String, position: usize },

    #[error("input length {len} exceeds configured maximum {max}")]
    BufferExceeded { len: usize, max: usize },

    #[error("non-ASCII byte 0x{byte:02x} at offset {position}")]
    NonAsciiRejected { byte: u8, position: usize },
}

impl CodecError {
    pub(crate) fn malformed(detail: impl Into<String>, position: usize) -> Self {
        CodecError::MalformedRecord {
            detail: detail.into(),
            position,
        }
    }
}

/// Errors from the signature provider.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("malformed key material: {0}")]
    MalformedKey(String),

    #[error("malformed signature record: {0}")]
    MalformedSignature(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("key function does not permit signing")]
    NotASigningKey,
}

/// Errors from owner metadata validation.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("expire date must be exactly 8 ASCII digits, got {0:?}")]
    InvalidDate(String),

    #[error("unknown key function code {0:?}")]
    UnknownKeyFunction(String),
}

/// Errors from record construction and inspection.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("not a NaturalMessage key record")]
    NotAKeyRecord,

    #[error("record has no Owner-Info section")]
    MissingOwnerInfo,

    #[error("record has no {0} subrecord")]
    MissingKeyMaterial(&'static str),

    #[error("invalid expire date in record: {0}")]
    InvalidExpireDate(#[from] MetadataError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from key bundle assembly.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("incomplete metadata: {0} must be set before bundling")]
    IncompleteMetadata(&'static str),

    #[error("malformed provider key pair: {0}")]
    MalformedKeyPair(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Errors from signable payload construction.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload length {len} exceeds configured maximum {max}")]
    PayloadTooLarge { len: usize, max: usize },
}
