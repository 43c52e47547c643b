//! End-to-end trust chain scenarios through the key service.

use natmsg::core::{DalekProvider, DateYmd, OwnerMetadata};
use natmsg::{
    KeyService, KeyServiceConfig, NatmsgError, RejectReason, TrustChain, Verdict,
};
use natmsg_core::PayloadLimits;

struct Deployment {
    service: KeyService<DalekProvider>,
    root: natmsg::KeyBundle,
    online: natmsg::OnlineKeySet,
    certification: natmsg::Sexp,
    pin: natmsg::Digest,
}

fn deploy() -> Deployment {
    let service = KeyService::new(DalekProvider::new());
    let entry = OwnerMetadata::builder("server1")
        .comment("integration test server")
        .natural_message_id("NM-001")
        .ipv4("198.51.100.7")
        .build();

    let root = service.create_offline_key(&entry).unwrap();
    let online = service
        .create_online_keys(&entry, DateYmd::parse("20301231").unwrap())
        .unwrap();
    let certification = service
        .certify_key(&online.signing.public_record, &root.private_record)
        .unwrap();
    let pin = service.fingerprint(&root.public_record);

    Deployment {
        service,
        root,
        online,
        certification,
        pin,
    }
}

fn today() -> DateYmd {
    DateYmd::parse("20260801").unwrap()
}

#[test]
fn full_chain_accepts_signed_message() {
    let d = deploy();
    let signature = d
        .service
        .sign_detached(b"hello", &d.online.signing.private_record)
        .unwrap();

    let verdict = d
        .service
        .verify_chain(
            &TrustChain {
                message: b"hello",
                leaf_signature: &signature,
                leaf_record: &d.online.signing.public_record,
                certification_signature: &d.certification,
                root_record: &d.root.public_record,
                root_fingerprint: &d.pin,
            },
            &today(),
        )
        .unwrap();
    assert_eq!(verdict, Verdict::Valid);
}

#[test]
fn altered_message_is_rejected_at_the_leaf() {
    let d = deploy();
    let signature = d
        .service
        .sign_detached(b"hello", &d.online.signing.private_record)
        .unwrap();

    let verdict = d
        .service
        .verify_chain(
            &TrustChain {
                message: b"hellp",
                leaf_signature: &signature,
                leaf_record: &d.online.signing.public_record,
                certification_signature: &d.certification,
                root_record: &d.root.public_record,
                root_fingerprint: &d.pin,
            },
            &today(),
        )
        .unwrap();
    assert_eq!(verdict, Verdict::Rejected(RejectReason::LeafSignatureInvalid));
}

#[test]
fn stale_pin_rejects_a_rotated_root() {
    let d = deploy();
    // The server rotates its root but the relying party still pins
    // the old fingerprint.
    let entry = OwnerMetadata::builder("server1").build();
    let new_root = d.service.create_offline_key(&entry).unwrap();
    let new_certification = d
        .service
        .certify_key(&d.online.signing.public_record, &new_root.private_record)
        .unwrap();
    let signature = d
        .service
        .sign_detached(b"hello", &d.online.signing.private_record)
        .unwrap();

    let verdict = d
        .service
        .verify_chain(
            &TrustChain {
                message: b"hello",
                leaf_signature: &signature,
                leaf_record: &d.online.signing.public_record,
                certification_signature: &new_certification,
                root_record: &new_root.public_record,
                root_fingerprint: &d.pin,
            },
            &today(),
        )
        .unwrap();
    assert_eq!(verdict, Verdict::Rejected(RejectReason::FingerprintMismatch));
}

#[test]
fn uncertified_leaf_is_rejected_at_the_certification() {
    let d = deploy();
    // An online key the root never certified: reuse a certification
    // that was issued for a different leaf.
    let entry = OwnerMetadata::builder("server1").build();
    let rogue = d
        .service
        .create_online_keys(&entry, DateYmd::parse("20301231").unwrap())
        .unwrap();
    let signature = d
        .service
        .sign_detached(b"hello", &rogue.signing.private_record)
        .unwrap();

    let verdict = d
        .service
        .verify_chain(
            &TrustChain {
                message: b"hello",
                leaf_signature: &signature,
                leaf_record: &rogue.signing.public_record,
                certification_signature: &d.certification,
                root_record: &d.root.public_record,
                root_fingerprint: &d.pin,
            },
            &today(),
        )
        .unwrap();
    assert_eq!(
        verdict,
        Verdict::Rejected(RejectReason::CertificationSignatureInvalid)
    );
}

#[test]
fn expired_online_key_is_rejected() {
    let service = KeyService::new(DalekProvider::new());
    let entry = OwnerMetadata::builder("server1").build();
    let root = service.create_offline_key(&entry).unwrap();
    let online = service
        .create_online_keys(&entry, DateYmd::parse("20250101").unwrap())
        .unwrap();
    let certification = service
        .certify_key(&online.signing.public_record, &root.private_record)
        .unwrap();
    let pin = service.fingerprint(&root.public_record);
    let signature = service
        .sign_detached(b"hello", &online.signing.private_record)
        .unwrap();

    let verdict = service
        .verify_chain(
            &TrustChain {
                message: b"hello",
                leaf_signature: &signature,
                leaf_record: &online.signing.public_record,
                certification_signature: &certification,
                root_record: &root.public_record,
                root_fingerprint: &pin,
            },
            &today(),
        )
        .unwrap();
    assert_eq!(verdict, Verdict::Rejected(RejectReason::KeyExpired));
}

#[test]
fn oversized_message_is_rejected_before_signing() {
    let config = KeyServiceConfig {
        payload: PayloadLimits { max_data_len: 16 },
        ..KeyServiceConfig::default()
    };
    let service = KeyService::with_config(DalekProvider::new(), config);
    let entry = OwnerMetadata::builder("server1").build();
    let online = service
        .create_online_keys(&entry, DateYmd::parse("20301231").unwrap())
        .unwrap();

    let result = service.sign_detached(&[0x61; 17], &online.signing.private_record);
    assert!(matches!(result, Err(NatmsgError::Payload(_))));
}
