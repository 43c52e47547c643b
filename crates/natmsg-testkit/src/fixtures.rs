//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a complete deployment
//! with an offline root, a certified online signing key, and the
//! root's fingerprint pin.

use natmsg::core::{
    build_bundle, CreateTime, DalekProvider, DateYmd, Digest, KeyAlgorithm, KeyBundle,
    KeyFunction, OwnerMetadata, Sexp,
};
use natmsg::{KeyService, TrustChain, Verdict};

/// Fixed creation time so fixture records are byte-reproducible.
pub const FIXTURE_CREATE_TIME: i64 = 1736870400;

/// Expire date given to fixture leaf keys.
pub const FIXTURE_EXPIRE: &str = "20301231";

/// Date safely inside the fixture validity window.
pub const FIXTURE_TODAY: &str = "20260801";

/// A deployed identity: root, certified online signing key, pin.
pub struct ChainFixture {
    pub service: KeyService<DalekProvider>,
    pub root: KeyBundle,
    pub leaf: KeyBundle,
    pub certification: Sexp,
    pub pin: Digest,
}

impl ChainFixture {
    /// Fixture with random keys.
    pub fn new() -> Self {
        let service = KeyService::new(DalekProvider::new());
        let entry = OwnerMetadata::builder("fixture server")
            .comment("testkit")
            .build();
        let root = service
            .create_offline_key(&entry)
            .expect("offline keygen failed");
        let online = service
            .create_online_keys(&entry, DateYmd::parse(FIXTURE_EXPIRE).expect("fixture date"))
            .expect("online keygen failed");
        Self::assemble(service, root, online.signing)
    }

    /// Deterministic fixture: same seeds, same records, same bytes.
    pub fn with_seeds(root_seed: [u8; 32], leaf_seed: [u8; 32]) -> Self {
        let service = KeyService::new(DalekProvider::new());
        let created_at = CreateTime::from_unix_seconds(FIXTURE_CREATE_TIME);

        let root_keypair = DalekProvider::keypair_from_seed(KeyAlgorithm::Ed25519, &root_seed);
        let root_entry = OwnerMetadata::builder("fixture server OFFLINE SIGNING KEY")
            .comment("testkit")
            .key_function(KeyFunction::Sign)
            .build();
        let root =
            build_bundle(&root_keypair, &root_entry, created_at.clone()).expect("root bundle");

        let leaf_keypair = DalekProvider::keypair_from_seed(KeyAlgorithm::Ed25519, &leaf_seed);
        let leaf_entry = OwnerMetadata::builder("fixture server ONLINE SIGNING KEY")
            .comment("testkit")
            .key_function(KeyFunction::Sign)
            .expire_date(DateYmd::parse(FIXTURE_EXPIRE).expect("fixture date"))
            .build();
        let leaf = build_bundle(&leaf_keypair, &leaf_entry, created_at).expect("leaf bundle");

        Self::assemble(service, root, leaf)
    }

    fn assemble(service: KeyService<DalekProvider>, root: KeyBundle, leaf: KeyBundle) -> Self {
        let certification = service
            .certify_key(&leaf.public_record, &root.private_record)
            .expect("certification failed");
        let pin = service.fingerprint(&root.public_record);
        Self {
            service,
            root,
            leaf,
            certification,
            pin,
        }
    }

    /// Sign a message with the online key.
    pub fn sign(&self, message: &[u8]) -> Sexp {
        self.service
            .sign_detached(message, &self.leaf.private_record)
            .expect("signing failed")
    }

    /// Assemble chain inputs for a signed message.
    pub fn chain<'a>(&'a self, message: &'a [u8], leaf_signature: &'a Sexp) -> TrustChain<'a> {
        TrustChain {
            message,
            leaf_signature,
            leaf_record: &self.leaf.public_record,
            certification_signature: &self.certification,
            root_record: &self.root.public_record,
            root_fingerprint: &self.pin,
        }
    }

    /// Sign and verify in one step, at the fixture's reference date.
    pub fn verify_signed(&self, message: &[u8]) -> Verdict {
        let signature = self.sign(message);
        self.service
            .verify_chain(
                &self.chain(message, &signature),
                &DateYmd::parse(FIXTURE_TODAY).expect("fixture date"),
            )
            .expect("chain inputs should be structurally valid")
    }
}

impl Default for ChainFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_fixture_verifies() {
        let fixture = ChainFixture::new();
        assert!(fixture.verify_signed(b"hello").is_valid());
    }

    #[test]
    fn test_seeded_fixture_is_reproducible() {
        let a = ChainFixture::with_seeds([1; 32], [2; 32]);
        let b = ChainFixture::with_seeds([1; 32], [2; 32]);
        assert_eq!(
            a.root.public_record.serialize(),
            b.root.public_record.serialize()
        );
        assert_eq!(
            a.leaf.public_record.serialize(),
            b.leaf.public_record.serialize()
        );
        assert!(a.pin.ct_eq(&b.pin));
    }

    #[test]
    fn test_fixtures_with_different_seeds_differ() {
        let a = ChainFixture::with_seeds([1; 32], [2; 32]);
        let b = ChainFixture::with_seeds([3; 32], [2; 32]);
        assert!(!a.pin.ct_eq(&b.pin));
    }
}
