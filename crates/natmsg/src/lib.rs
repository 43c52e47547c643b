//! # Natural Message
//!
//! The unified API for Natural Message credentials: canonical key
//! records, detached signatures, and two-hop trust chain
//! verification against a pinned offline root.
//!
//! ## Overview
//!
//! A server identity holds one offline root signing key and a set of
//! short-lived online keys (one for encryption, one for signing).
//! The root certifies each online key by signing its public record;
//! relying parties verify a message in two hops and pin the root by
//! comparing its record fingerprint against an out-of-band value.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use natmsg::{KeyService, TrustChain};
//! use natmsg::core::{DalekProvider, DateYmd, OwnerMetadata};
//!
//! fn example() -> natmsg::Result<()> {
//!     let service = KeyService::new(DalekProvider::new());
//!
//!     // Issue keys.
//!     let entry = OwnerMetadata::builder("server1").build();
//!     let root = service.create_offline_key(&entry)?;
//!     let online = service.create_online_keys(&entry, DateYmd::parse("20301231")?)?;
//!
//!     // Certify the online signing key and pin the root.
//!     let cert = service.certify_key(&online.signing.public_record, &root.private_record)?;
//!     let pin = service.fingerprint(&root.public_record);
//!
//!     // Sign and verify a message end to end.
//!     let signature = service.sign_detached(b"hello", &online.signing.private_record)?;
//!     let verdict = service.verify_chain(
//!         &TrustChain {
//!             message: b"hello",
//!             leaf_signature: &signature,
//!             leaf_record: &online.signing.public_record,
//!             certification_signature: &cert,
//!             root_record: &root.public_record,
//!             root_fingerprint: &pin,
//!         },
//!         &DateYmd::parse("20260801")?,
//!     )?;
//!     assert!(verdict.is_valid());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `natmsg::core` - Records, metadata, payloads, the provider
//! - `natmsg::chain` - The chain verifier

pub mod error;
pub mod service;

// Re-export component crates
pub use natmsg_chain as chain;
pub use natmsg_core as core;

// Re-export main types for convenience
pub use error::{NatmsgError, Result};
pub use service::{KeyService, KeyServiceConfig, OnlineKeySet};

// Re-export commonly used component types
pub use natmsg_chain::{ChainVerifier, RejectReason, TrustChain, Verdict};
pub use natmsg_core::{
    DalekProvider, DateYmd, Digest, HashAlgorithm, KeyBundle, KeyFunction, OwnerMetadata,
    PrivateRecord, PublicRecord, Sexp, SignatureProvider,
};
