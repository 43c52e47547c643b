//! # Natural Message Testkit
//!
//! Fixtures, proptest generators, and deterministic chain vectors
//! for testing Natural Message credential implementations.
//!
//! - [`fixtures::ChainFixture`] - a complete deployed identity
//!   (root, certified online key, fingerprint pin)
//! - [`generators`] - proptest strategies for records and metadata
//! - [`vectors`] - reproducible cross-implementation vectors

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{ChainFixture, FIXTURE_CREATE_TIME, FIXTURE_EXPIRE, FIXTURE_TODAY};
pub use vectors::{generate_vector, standard_vectors, ChainVector};
