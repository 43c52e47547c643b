//! Deterministic chain vectors for cross-implementation checks.
//!
//! Every implementation of the record format must derive identical
//! records, signatures, and fingerprints from the same seeds and
//! message. Vectors carry all derived values so an independent
//! implementation can diff against them field by field.

use serde::{Deserialize, Serialize};

use crate::fixtures::ChainFixture;

/// A single chain vector. Seeds, message, and fingerprint are hex;
/// records and signatures are canonical record text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub root_seed: String,
    pub leaf_seed: String,
    pub message: String,

    // Derived outputs
    pub root_record: String,
    pub leaf_record: String,
    pub leaf_signature: String,
    pub certification: String,
    pub fingerprint: String,
}

/// Derive a vector from inputs.
pub fn generate_vector(
    name: &str,
    description: &str,
    root_seed: [u8; 32],
    leaf_seed: [u8; 32],
    message: &[u8],
) -> ChainVector {
    let fixture = ChainFixture::with_seeds(root_seed, leaf_seed);
    let leaf_signature = fixture.sign(message);

    ChainVector {
        name: name.to_string(),
        description: description.to_string(),
        root_seed: hex::encode(root_seed),
        leaf_seed: hex::encode(leaf_seed),
        message: hex::encode(message),
        root_record: String::from_utf8_lossy(&fixture.root.public_record.serialize()).into_owned(),
        leaf_record: String::from_utf8_lossy(&fixture.leaf.public_record.serialize()).into_owned(),
        leaf_signature: leaf_signature.to_string(),
        certification: fixture.certification.to_string(),
        fingerprint: fixture.pin.to_hex(),
    }
}

/// The standard vector set.
pub fn standard_vectors() -> Vec<ChainVector> {
    vec![
        generate_vector(
            "hello",
            "minimal message signed by the online key",
            [0x01; 32],
            [0x02; 32],
            b"hello",
        ),
        generate_vector(
            "empty-message",
            "zero-length message",
            [0x01; 32],
            [0x02; 32],
            b"",
        ),
        generate_vector(
            "binary-message",
            "message with the full byte range",
            [0xaa; 32],
            [0xbb; 32],
            &[0x00, 0x01, 0x7f, 0x80, 0xfe, 0xff],
        ),
    ]
}
