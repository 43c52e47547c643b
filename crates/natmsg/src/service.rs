//! The key service: unified API for issuing, signing, and verifying
//! Natural Message credentials.
//!
//! One service instance wraps a signature provider and a fixed
//! configuration. Operations mirror the command-line tools the
//! format originated with: key-set creation, detached signing,
//! detached verification, key certification, and full chain
//! verification. The service does no file I/O; callers move record
//! bytes in and out.

use tracing::{debug, info, warn};

use natmsg_chain::{ChainConfig, ChainVerifier, TrustChain, Verdict};
use natmsg_core::{
    build_bundle, CreateTime, DateYmd, Digest, HashAlgorithm, KeyAlgorithm, KeyBundle,
    KeyFunction, OwnerMetadata, ParseLimits, PayloadLimits, PrivateRecord, PublicRecord,
    RecordError, Sexp, SignablePayload, SignatureProvider,
};

use crate::error::Result;

/// Configuration for the key service.
#[derive(Debug, Clone, Default)]
pub struct KeyServiceConfig {
    /// Digest algorithm for payloads and fingerprints.
    pub algorithm: HashAlgorithm,
    /// Limits applied when parsing record text.
    pub parse: ParseLimits,
    /// Size ceiling for signable payloads.
    pub payload: PayloadLimits,
}

/// The two bundles of an online key set.
#[derive(Debug)]
pub struct OnlineKeySet {
    pub encryption: KeyBundle,
    pub signing: KeyBundle,
}

/// The main service struct.
pub struct KeyService<P: SignatureProvider> {
    provider: P,
    config: KeyServiceConfig,
}

impl<P: SignatureProvider> KeyService<P> {
    /// Create a service with default configuration.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, KeyServiceConfig::default())
    }

    pub fn with_config(provider: P, config: KeyServiceConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &KeyServiceConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    // ─────────────────────────────────────────────────────────────────────
    // Key issuance
    // ─────────────────────────────────────────────────────────────────────

    /// Generate the online key set for a server: one encryption key
    /// pair and one signing key pair, both expiring on `expire_date`.
    ///
    /// The owner entry's name is suffixed per key role; its key
    /// function and expire date are overridden.
    pub fn create_online_keys(
        &self,
        entry: &OwnerMetadata,
        expire_date: DateYmd,
    ) -> Result<OnlineKeySet> {
        let created_at = CreateTime::from_unix_seconds(now_epoch_seconds());

        let mut enc_entry = entry.clone();
        enc_entry.name.push_str(" ONLINE ENCRYPTION KEY");
        enc_entry.key_function = Some(KeyFunction::Encrypt);
        enc_entry.expire_date = Some(expire_date);
        let enc_keypair = self.provider.generate_keypair(KeyAlgorithm::X25519)?;
        let encryption = build_bundle(&enc_keypair, &enc_entry, created_at.clone())?;

        let mut sign_entry = entry.clone();
        sign_entry.name.push_str(" ONLINE SIGNING KEY");
        sign_entry.key_function = Some(KeyFunction::Sign);
        sign_entry.expire_date = Some(expire_date);
        let sign_keypair = self.provider.generate_keypair(KeyAlgorithm::Ed25519)?;
        let signing = build_bundle(&sign_keypair, &sign_entry, created_at)?;

        info!(owner = %entry.name, expire = %expire_date, "generated online key set");
        Ok(OnlineKeySet {
            encryption,
            signing,
        })
    }

    /// Generate the offline root signing key.
    ///
    /// The root never expires and carries no network or identity
    /// fields; it exists only to certify online keys.
    pub fn create_offline_key(&self, entry: &OwnerMetadata) -> Result<KeyBundle> {
        let created_at = CreateTime::from_unix_seconds(now_epoch_seconds());

        let mut root_entry = OwnerMetadata::builder(entry.name.clone())
            .comment(entry.comment.clone())
            .key_function(KeyFunction::Sign)
            .build();
        root_entry.name.push_str(" OFFLINE SIGNING KEY");

        let keypair = self.provider.generate_keypair(KeyAlgorithm::Ed25519)?;
        let bundle = build_bundle(&keypair, &root_entry, created_at)?;

        info!(owner = %entry.name, "generated offline signing key");
        Ok(bundle)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Detached signatures
    // ─────────────────────────────────────────────────────────────────────

    /// Sign raw message bytes, returning the detached signature
    /// record.
    pub fn sign_detached(&self, message: &[u8], key: &PrivateRecord) -> Result<Sexp> {
        let payload =
            SignablePayload::for_data(message, self.config.algorithm, &self.config.payload)?;
        let private_key = key
            .private_key()
            .ok_or(RecordError::MissingKeyMaterial("private-key"))?;
        let signature = self.provider.sign(&payload, &private_key)?;
        debug!(len = message.len(), "signed detached message");
        Ok(signature)
    }

    /// Check a detached signature over raw message bytes.
    pub fn verify_detached(
        &self,
        message: &[u8],
        signature: &Sexp,
        key: &PublicRecord,
    ) -> Result<bool> {
        let payload =
            SignablePayload::for_data(message, self.config.algorithm, &self.config.payload)?;
        let public_key = key
            .public_key()
            .ok_or(RecordError::MissingKeyMaterial("public-key"))?;
        Ok(self.provider.verify(&payload, signature, public_key)?)
    }

    /// Certify an online key: sign its public record with the
    /// offline root key.
    pub fn certify_key(&self, leaf: &PublicRecord, root_key: &PrivateRecord) -> Result<Sexp> {
        let payload =
            SignablePayload::for_certification(leaf, self.config.algorithm, &self.config.payload)?;
        let private_key = root_key
            .private_key()
            .ok_or(RecordError::MissingKeyMaterial("private-key"))?;
        let signature = self.provider.sign(&payload, &private_key)?;
        debug!("certified online key record");
        Ok(signature)
    }

    /// Digest of a record's canonical serialization, for out-of-band
    /// distribution as the root pin.
    pub fn fingerprint(&self, record: &PublicRecord) -> Digest {
        record.fingerprint(&self.provider, self.config.algorithm)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Chain verification
    // ─────────────────────────────────────────────────────────────────────

    /// Run the full two-hop verification against a pinned root.
    pub fn verify_chain(&self, chain: &TrustChain<'_>, today: &DateYmd) -> Result<Verdict> {
        let verifier = ChainVerifier::with_config(
            &self.provider,
            ChainConfig {
                algorithm: self.config.algorithm,
                payload: self.config.payload.clone(),
            },
        );
        let verdict = verifier.verify(chain, today)?;
        match verdict {
            Verdict::Valid => debug!("trust chain accepted"),
            Verdict::Rejected(reason) => warn!(%reason, "trust chain rejected"),
        }
        Ok(verdict)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Record parsing
    // ─────────────────────────────────────────────────────────────────────

    /// Parse a public record with the service's limits.
    pub fn parse_public_record(&self, bytes: &[u8]) -> Result<PublicRecord> {
        Ok(PublicRecord::parse(bytes, &self.config.parse)?)
    }

    /// Parse a private record with the service's limits.
    pub fn parse_private_record(&self, bytes: &[u8]) -> Result<PrivateRecord> {
        Ok(PrivateRecord::parse(bytes, &self.config.parse)?)
    }

    /// Parse a detached signature record with the service's limits.
    pub fn parse_signature(&self, bytes: &[u8]) -> Result<Sexp> {
        Ok(natmsg_core::parse(bytes, &self.config.parse)?)
    }
}

fn now_epoch_seconds() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs() as i64
}
