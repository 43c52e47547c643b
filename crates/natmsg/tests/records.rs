//! Caller-side persistence round trips.
//!
//! The service itself does no file I/O; these tests play the caller,
//! writing records, signatures, and the fingerprint pin to disk and
//! reading them back through the service's parsers.

use std::fs;

use anyhow::Result;
use natmsg::core::{DalekProvider, DateYmd, Digest, OwnerMetadata};
use natmsg::{KeyService, TrustChain, Verdict};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn records_survive_disk_roundtrip() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let service = KeyService::new(DalekProvider::new());
    let entry = OwnerMetadata::builder("server1")
        .comment("persistence test")
        .build();

    let root = service.create_offline_key(&entry)?;
    let online = service.create_online_keys(&entry, DateYmd::parse("20301231")?)?;
    let certification = service.certify_key(&online.signing.public_record, &root.private_record)?;
    let signature = service.sign_detached(b"hello", &online.signing.private_record)?;
    let pin = service.fingerprint(&root.public_record);

    // The caller persists everything; the pin travels as hex on a
    // separate channel.
    fs::write(dir.path().join("RootPUBSignKey.key"), root.public_record.serialize())?;
    fs::write(
        dir.path().join("OnlinePUBSignKey.key"),
        online.signing.public_record.serialize(),
    )?;
    fs::write(
        dir.path().join("OnlinePRVSignKey.key"),
        online.signing.private_record.serialize().as_slice(),
    )?;
    fs::write(dir.path().join("hello.sig"), natmsg::core::serialize(&signature))?;
    fs::write(dir.path().join("keysig.sig"), natmsg::core::serialize(&certification))?;
    fs::write(dir.path().join("fingerprint.txt"), pin.to_hex())?;

    // A fresh service instance reads it all back.
    let verifier = KeyService::new(DalekProvider::new());
    let root_record =
        verifier.parse_public_record(&fs::read(dir.path().join("RootPUBSignKey.key"))?)?;
    let leaf_record =
        verifier.parse_public_record(&fs::read(dir.path().join("OnlinePUBSignKey.key"))?)?;
    let leaf_private =
        verifier.parse_private_record(&fs::read(dir.path().join("OnlinePRVSignKey.key"))?)?;
    let leaf_signature = verifier.parse_signature(&fs::read(dir.path().join("hello.sig"))?)?;
    let certification = verifier.parse_signature(&fs::read(dir.path().join("keysig.sig"))?)?;
    let pin = Digest::from_hex(&fs::read_to_string(dir.path().join("fingerprint.txt"))?)?;

    assert_eq!(root_record, root.public_record);
    assert_eq!(leaf_record, online.signing.public_record);

    // The reloaded private key still signs.
    let fresh_signature = verifier.sign_detached(b"again", &leaf_private)?;
    assert!(verifier.verify_detached(b"again", &fresh_signature, &leaf_record)?);

    // And the reloaded chain still verifies end to end.
    let verdict = verifier.verify_chain(
        &TrustChain {
            message: b"hello",
            leaf_signature: &leaf_signature,
            leaf_record: &leaf_record,
            certification_signature: &certification,
            root_record: &root_record,
            root_fingerprint: &pin,
        },
        &DateYmd::parse("20260801")?,
    )?;
    assert_eq!(verdict, Verdict::Valid);
    Ok(())
}

#[test]
fn detached_signature_file_is_a_bare_record() -> Result<()> {
    init_tracing();
    let service = KeyService::new(DalekProvider::new());
    let entry = OwnerMetadata::builder("server1").build();
    let online = service.create_online_keys(&entry, DateYmd::parse("20301231")?)?;
    let signature = service.sign_detached(b"hello", &online.signing.private_record)?;

    let text = natmsg::core::serialize(&signature);
    assert!(text.starts_with(b"(sig-val "));

    let reparsed = service.parse_signature(&text)?;
    assert_eq!(reparsed, signature);
    Ok(())
}
