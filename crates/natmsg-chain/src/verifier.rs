//! The two-hop trust chain verifier.
//!
//! A chain binds a message to an offline root identity in two hops:
//! the message is signed by an online (leaf) key, the leaf's public
//! record is signed by the root key, and the root record itself is
//! authenticated by comparing its fingerprint against a pin obtained
//! out-of-band.
//!
//! Verification is an explicit state machine:
//!
//! ```text
//! Start → LeafSigChecked → RootIdentityPinned → CertSigChecked → Valid
//! ```
//!
//! Checks run in that fixed order and stop at the first failure, so
//! every rejection names the hop that failed. Verification is a pure
//! function of the chain inputs and the caller-supplied date:
//! identical inputs always produce the identical verdict.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use natmsg_core::{
    DateYmd, Digest, HashAlgorithm, KeyFunction, PayloadLimits, PublicRecord, Sexp,
    SignablePayload, SignatureProvider,
};

use crate::error::ChainError;

/// States of the verification machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainState {
    Start,
    /// The message signature verified under the leaf key.
    LeafSigChecked,
    /// The root record matched the out-of-band fingerprint pin.
    RootIdentityPinned,
    /// The leaf record's certification verified under the root key.
    CertSigChecked,
    /// All checks passed.
    Valid,
}

/// Why a chain was rejected. Each reason names exactly one failed
/// check; reasons are never collapsed into a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum RejectReason {
    #[error("message signature does not verify under the leaf key")]
    LeafSignatureInvalid,

    #[error("root record does not match the pinned fingerprint")]
    FingerprintMismatch,

    #[error("leaf certification does not verify under the root key")]
    CertificationSignatureInvalid,

    #[error("leaf record expired")]
    KeyExpired,

    #[error("root key is not a signing key")]
    WrongKeyFunction,
}

/// Outcome of a chain verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Valid,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Valid => None,
            Verdict::Rejected(reason) => Some(*reason),
        }
    }
}

/// The five inputs of a verification, all supplied by the caller
/// from already-retrieved byte buffers. The fingerprint pin must
/// come from a different channel than the root record it pins.
#[derive(Debug, Clone, Copy)]
pub struct TrustChain<'a> {
    /// The signed message bytes.
    pub message: &'a [u8],
    /// Detached signature over `message` by the leaf key.
    pub leaf_signature: &'a Sexp,
    /// The online key's public record.
    pub leaf_record: &'a PublicRecord,
    /// Detached signature over the serialized leaf record by the
    /// root key.
    pub certification_signature: &'a Sexp,
    /// The offline root key's public record.
    pub root_record: &'a PublicRecord,
    /// Out-of-band digest of the root record's canonical
    /// serialization.
    pub root_fingerprint: &'a Digest,
}

/// Configuration for a verifier.
#[derive(Debug, Clone, Default)]
pub struct ChainConfig {
    /// Digest algorithm for payloads and the fingerprint pin.
    pub algorithm: HashAlgorithm,
    /// Size ceiling for message and record payloads.
    pub payload: PayloadLimits,
}

/// Verifies trust chains against a signature provider.
pub struct ChainVerifier<P: SignatureProvider> {
    provider: P,
    config: ChainConfig,
}

impl<P: SignatureProvider> ChainVerifier<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, ChainConfig::default())
    }

    pub fn with_config(provider: P, config: ChainConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Run the machine to a verdict.
    ///
    /// `Err` means a check could not be evaluated (malformed input);
    /// `Ok(Rejected(_))` means a check ran and failed. No check is
    /// retried, and nothing after the first failure runs.
    pub fn verify(&self, chain: &TrustChain<'_>, today: &DateYmd) -> Result<Verdict, ChainError> {
        let mut state = ChainState::Start;
        loop {
            state = match self.step(state, chain, today)? {
                Step::Advance(next) => next,
                Step::Reject(reason) => return Ok(Verdict::Rejected(reason)),
            };
            if state == ChainState::Valid {
                return Ok(Verdict::Valid);
            }
        }
    }

    fn step(
        &self,
        state: ChainState,
        chain: &TrustChain<'_>,
        today: &DateYmd,
    ) -> Result<Step, ChainError> {
        match state {
            ChainState::Start => {
                let payload = SignablePayload::for_data(
                    chain.message,
                    self.config.algorithm,
                    &self.config.payload,
                )?;
                let leaf_key = chain
                    .leaf_record
                    .public_key()
                    .ok_or(ChainError::MissingPublicKey)?;
                if self
                    .provider
                    .verify(&payload, chain.leaf_signature, leaf_key)?
                {
                    Ok(Step::Advance(ChainState::LeafSigChecked))
                } else {
                    Ok(Step::Reject(RejectReason::LeafSignatureInvalid))
                }
            }

            ChainState::LeafSigChecked => {
                let fingerprint = chain
                    .root_record
                    .fingerprint(&self.provider, self.config.algorithm);
                if fingerprint.ct_eq(chain.root_fingerprint) {
                    Ok(Step::Advance(ChainState::RootIdentityPinned))
                } else {
                    Ok(Step::Reject(RejectReason::FingerprintMismatch))
                }
            }

            ChainState::RootIdentityPinned => {
                let payload = SignablePayload::for_certification(
                    chain.leaf_record,
                    self.config.algorithm,
                    &self.config.payload,
                )?;
                let root_key = chain
                    .root_record
                    .public_key()
                    .ok_or(ChainError::MissingPublicKey)?;
                if self
                    .provider
                    .verify(&payload, chain.certification_signature, root_key)?
                {
                    Ok(Step::Advance(ChainState::CertSigChecked))
                } else {
                    Ok(Step::Reject(RejectReason::CertificationSignatureInvalid))
                }
            }

            ChainState::CertSigChecked => {
                if chain.root_record.key_function() != Some(KeyFunction::Sign) {
                    return Ok(Step::Reject(RejectReason::WrongKeyFunction));
                }
                if let Some(expire) = chain.leaf_record.expire_date()? {
                    if expire.is_past(today) {
                        return Ok(Step::Reject(RejectReason::KeyExpired));
                    }
                }
                Ok(Step::Advance(ChainState::Valid))
            }

            ChainState::Valid => Ok(Step::Advance(ChainState::Valid)),
        }
    }
}

enum Step {
    Advance(ChainState),
    Reject(RejectReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use natmsg_core::{
        build_bundle, CreateTime, DalekProvider, KeyAlgorithm, KeyBundle, OwnerMetadata,
        ParseLimits,
    };

    struct Scenario {
        provider: DalekProvider,
        root: KeyBundle,
        leaf: KeyBundle,
        message: Vec<u8>,
        leaf_signature: Sexp,
        certification_signature: Sexp,
        pin: Digest,
    }

    fn make_bundle(seed: u8, name: &str, function: KeyFunction, expire: Option<&str>) -> KeyBundle {
        let keypair = DalekProvider::keypair_from_seed(KeyAlgorithm::Ed25519, &[seed; 32]);
        let mut builder = OwnerMetadata::builder(name)
            .comment("chain test")
            .key_function(function);
        if let Some(date) = expire {
            builder = builder.expire_date(DateYmd::parse(date).unwrap());
        }
        build_bundle(
            &keypair,
            &builder.build(),
            CreateTime::from_unix_seconds(1736870400),
        )
        .unwrap()
    }

    fn scenario_with(root_function: KeyFunction, leaf_expire: Option<&str>) -> Scenario {
        let provider = DalekProvider::new();
        let root = make_bundle(0x01, "root", root_function, None);
        let leaf = make_bundle(0x02, "leaf ONLINE SIGNING KEY", KeyFunction::Sign, leaf_expire);
        let limits = PayloadLimits::default();

        let message = b"hello".to_vec();
        let data_payload =
            SignablePayload::for_data(&message, HashAlgorithm::Sha384, &limits).unwrap();
        let leaf_signature = provider
            .sign(&data_payload, &leaf.private_record.private_key().unwrap())
            .unwrap();

        let cert_payload = SignablePayload::for_certification(
            &leaf.public_record,
            HashAlgorithm::Sha384,
            &limits,
        )
        .unwrap();
        let certification_signature = provider
            .sign(&cert_payload, &root.private_record.private_key().unwrap())
            .unwrap();

        let pin = root
            .public_record
            .fingerprint(&provider, HashAlgorithm::Sha384);

        Scenario {
            provider,
            root,
            leaf,
            message,
            leaf_signature,
            certification_signature,
            pin,
        }
    }

    fn scenario() -> Scenario {
        scenario_with(KeyFunction::Sign, Some("20301231"))
    }

    fn today() -> DateYmd {
        DateYmd::parse("20260801").unwrap()
    }

    impl Scenario {
        fn chain(&self) -> TrustChain<'_> {
            TrustChain {
                message: &self.message,
                leaf_signature: &self.leaf_signature,
                leaf_record: &self.leaf.public_record,
                certification_signature: &self.certification_signature,
                root_record: &self.root.public_record,
                root_fingerprint: &self.pin,
            }
        }

        fn verify(&self) -> Result<Verdict, ChainError> {
            ChainVerifier::new(self.provider.clone()).verify(&self.chain(), &today())
        }
    }

    #[test]
    fn test_intact_chain_is_valid() {
        assert_eq!(scenario().verify().unwrap(), Verdict::Valid);
    }

    #[test]
    fn test_tampered_message_rejects_leaf_signature() {
        let mut s = scenario();
        s.message = b"hellp".to_vec();
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::LeafSignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_leaf_signature_rejects() {
        let mut s = scenario();
        // Re-sign the message with the wrong (root) key.
        let payload = SignablePayload::for_data(
            &s.message,
            HashAlgorithm::Sha384,
            &PayloadLimits::default(),
        )
        .unwrap();
        s.leaf_signature = s
            .provider
            .sign(&payload, &s.root.private_record.private_key().unwrap())
            .unwrap();
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::LeafSignatureInvalid)
        );
    }

    #[test]
    fn test_flipped_signature_byte_rejects() {
        let mut s = scenario();
        // Flip one byte of the signature's r component.
        let (mut r, s_component) = {
            let eddsa = s.leaf_signature.find_token("eddsa").unwrap();
            (
                eddsa.value_of("r").unwrap().to_vec(),
                eddsa.value_of("s").unwrap().to_vec(),
            )
        };
        r[0] ^= 0x01;
        s.leaf_signature = Sexp::list(vec![
            Sexp::atom("sig-val"),
            Sexp::list(vec![
                Sexp::atom("eddsa"),
                Sexp::pair("r", r),
                Sexp::pair("s", s_component),
            ]),
        ]);
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::LeafSignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_leaf_record_rejects_certification() {
        let mut s = scenario();
        // Flip one metadata byte in the serialized leaf record. The
        // leaf key itself is untouched, so the message signature
        // still verifies and the failure lands on the certification.
        let text = String::from_utf8(s.leaf.public_record.serialize()).unwrap();
        let tampered = text.replace("chain test", "chain tesT");
        s.leaf.public_record =
            PublicRecord::parse(tampered.as_bytes(), &ParseLimits::default()).unwrap();
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::CertificationSignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_certification_signature_rejects() {
        let mut s = scenario();
        let payload = SignablePayload::for_certification(
            &s.leaf.public_record,
            HashAlgorithm::Sha384,
            &PayloadLimits::default(),
        )
        .unwrap();
        // Certification by the leaf itself instead of the root.
        s.certification_signature = s
            .provider
            .sign(&payload, &s.leaf.private_record.private_key().unwrap())
            .unwrap();
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::CertificationSignatureInvalid)
        );
    }

    #[test]
    fn test_substituted_root_rejects_fingerprint() {
        let mut s = scenario();
        // A different, internally consistent root. The pin still
        // names the original root, so the substitution is caught
        // before its certification is even examined.
        let impostor = make_bundle(0x03, "root", KeyFunction::Sign, None);
        let cert_payload = SignablePayload::for_certification(
            &s.leaf.public_record,
            HashAlgorithm::Sha384,
            &PayloadLimits::default(),
        )
        .unwrap();
        s.certification_signature = s
            .provider
            .sign(
                &cert_payload,
                &impostor.private_record.private_key().unwrap(),
            )
            .unwrap();
        s.root = impostor;
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::FingerprintMismatch)
        );
    }

    #[test]
    fn test_tampered_root_record_rejects_fingerprint() {
        let mut s = scenario();
        let text = String::from_utf8(s.root.public_record.serialize()).unwrap();
        let tampered = text.replace("(Name root)", "(Name rooT)");
        assert_ne!(text, tampered);
        s.root.public_record =
            PublicRecord::parse(tampered.as_bytes(), &ParseLimits::default()).unwrap();
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::FingerprintMismatch)
        );
    }

    #[test]
    fn test_expired_leaf_rejects_even_with_valid_signatures() {
        let s = scenario_with(KeyFunction::Sign, Some("20250101"));
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::KeyExpired)
        );
    }

    #[test]
    fn test_leaf_valid_through_expire_date() {
        let s = scenario_with(KeyFunction::Sign, Some("20260801"));
        assert_eq!(s.verify().unwrap(), Verdict::Valid);
    }

    #[test]
    fn test_leaf_without_expire_date_never_expires() {
        let s = scenario_with(KeyFunction::Sign, None);
        assert_eq!(s.verify().unwrap(), Verdict::Valid);
    }

    #[test]
    fn test_encryption_root_rejects_key_function() {
        let s = scenario_with(KeyFunction::Encrypt, Some("20301231"));
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::WrongKeyFunction)
        );
    }

    #[test]
    fn test_oversized_message_is_an_error_not_a_verdict() {
        let s = scenario();
        let config = ChainConfig {
            algorithm: HashAlgorithm::Sha384,
            payload: PayloadLimits { max_data_len: 2 },
        };
        let verifier = ChainVerifier::with_config(s.provider.clone(), config);
        let result = verifier.verify(&s.chain(), &today());
        assert!(matches!(result, Err(ChainError::Payload(_))));
    }

    #[test]
    fn test_malformed_leaf_expire_date_is_an_error() {
        let mut s = scenario();
        let text = String::from_utf8(s.leaf.public_record.serialize()).unwrap();
        let broken = text.replace("\"20301231\"", "\"203012xx\"");
        s.leaf.public_record =
            PublicRecord::parse(broken.as_bytes(), &ParseLimits::default()).unwrap();
        // Both signatures are now stale, so re-sign against the
        // broken record to reach the expiry check.
        let limits = PayloadLimits::default();
        let cert_payload = SignablePayload::for_certification(
            &s.leaf.public_record,
            HashAlgorithm::Sha384,
            &limits,
        )
        .unwrap();
        s.certification_signature = s
            .provider
            .sign(&cert_payload, &s.root.private_record.private_key().unwrap())
            .unwrap();
        let result = s.verify();
        assert!(matches!(result, Err(ChainError::Record(_))));
    }

    #[test]
    fn test_first_failure_wins() {
        // Expired leaf AND tampered message: the leaf signature
        // check runs first, so its reason is reported.
        let mut s = scenario_with(KeyFunction::Sign, Some("20250101"));
        s.message = b"hellp".to_vec();
        assert_eq!(
            s.verify().unwrap(),
            Verdict::Rejected(RejectReason::LeafSignatureInvalid)
        );
    }

    #[test]
    fn test_verification_is_deterministic() {
        let s = scenario();
        let first = s.verify().unwrap();
        let second = s.verify().unwrap();
        assert_eq!(first, second);
    }
}
