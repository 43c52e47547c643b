//! # Natural Message Core
//!
//! Pure primitives for Natural Message credentials: canonical
//! S-expression records, owner metadata, key bundles, and signable
//! payloads.
//!
//! This crate contains no I/O, no prompting, no persistence. It is
//! pure computation over byte buffers and in-memory records.
//!
//! ## Key Types
//!
//! - [`Sexp`] - The canonical record value (atom or list)
//! - [`PublicRecord`] / [`PrivateRecord`] - A key-pair half bundled
//!   with owner metadata
//! - [`SignablePayload`] - The exact bytes a signature covers
//! - [`SignatureProvider`] - The external cryptography capability
//!
//! ## Canonicalization
//!
//! All records are encoded with a deterministic serializer. See the
//! [`sexp`] module.

pub mod crypto;
pub mod error;
pub mod metadata;
pub mod payload;
pub mod record;
pub mod secret;
pub mod sexp;

pub use crypto::{
    DalekProvider, Digest, HashAlgorithm, KeyAlgorithm, RawKeyPair, SignatureProvider,
};
pub use error::{BundleError, CodecError, CryptoError, MetadataError, PayloadError, RecordError};
pub use metadata::{CreateTime, DateYmd, KeyFunction, MetadataBuilder, OwnerMetadata};
pub use payload::{PayloadLimits, SignablePayload, DEFAULT_MAX_PAYLOAD_LEN};
pub use record::{build_bundle, KeyBundle, PrivateRecord, PublicRecord, KEY_RECORD_TAG};
pub use secret::{SecretBytes, SecretSexp};
pub use sexp::{parse, serialize, ParseLimits, Sexp, DEFAULT_MAX_INPUT_LEN};
