//! Key records and the bundle builder.
//!
//! A key record wraps one half of a provider key pair together with
//! owner metadata:
//!
//! ```text
//! (NaturalMessage-Asymmetric-Key
//!   (Owner-Info
//!     (Name …) (Comment …) (Key-Function e|s) (Natural-Message-ID …)
//!     (IPV4 …) (IPV6 …) (Alternative-IPV4 …)
//!     (Create-Time …) (Expire-Date-YYYYMMDD …))
//!   <key subrecord>)
//! ```
//!
//! The private record carries a reduced Owner-Info: name, comment,
//! key function, and create time only. Network and identity fields
//! never sit next to private key material.

use std::fmt;
use zeroize::Zeroizing;

use crate::crypto::{Digest, HashAlgorithm, RawKeyPair, SignatureProvider};
use crate::error::{BundleError, RecordError};
use crate::metadata::{CreateTime, DateYmd, KeyFunction, OwnerMetadata};
use crate::secret::SecretSexp;
use crate::sexp::{self, ParseLimits, Sexp};

/// Top-level tag of every key record.
pub const KEY_RECORD_TAG: &str = "NaturalMessage-Asymmetric-Key";

/// Tag of the owner metadata section.
pub const OWNER_INFO_TAG: &str = "Owner-Info";

/// A public key record: owner metadata plus the `public-key`
/// subrecord. Safe to print, persist, and transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicRecord {
    sexp: Sexp,
}

impl PublicRecord {
    /// Validate the record shape and wrap it.
    pub fn from_sexp(sexp: Sexp) -> Result<Self, RecordError> {
        if !sexp.has_tag(KEY_RECORD_TAG) {
            return Err(RecordError::NotAKeyRecord);
        }
        if sexp.find_token(OWNER_INFO_TAG).is_none() {
            return Err(RecordError::MissingOwnerInfo);
        }
        if sexp.find_token("public-key").is_none() {
            return Err(RecordError::MissingKeyMaterial("public-key"));
        }
        Ok(Self { sexp })
    }

    /// Parse a record from its canonical text.
    pub fn parse(bytes: &[u8], limits: &ParseLimits) -> Result<Self, RecordError> {
        Self::from_sexp(sexp::parse(bytes, limits)?)
    }

    /// The canonical byte form, identical for identical records.
    pub fn serialize(&self) -> Vec<u8> {
        sexp::serialize(&self.sexp)
    }

    pub fn sexp(&self) -> &Sexp {
        &self.sexp
    }

    /// The `public-key` subrecord. Present for every record that
    /// passed [`PublicRecord::from_sexp`].
    pub fn public_key(&self) -> Option<&Sexp> {
        self.sexp.find_token("public-key")
    }

    /// A raw Owner-Info field; empty atoms read as absent.
    pub fn owner_field(&self, tag: &str) -> Option<&[u8]> {
        let value = self.sexp.find_token(OWNER_INFO_TAG)?.value_of(tag)?;
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    pub fn name(&self) -> Option<&[u8]> {
        self.owner_field("Name")
    }

    pub fn comment(&self) -> Option<&[u8]> {
        self.owner_field("Comment")
    }

    pub fn natural_message_id(&self) -> Option<&[u8]> {
        self.owner_field("Natural-Message-ID")
    }

    pub fn create_time(&self) -> Option<&[u8]> {
        self.owner_field("Create-Time")
    }

    pub fn key_function(&self) -> Option<KeyFunction> {
        KeyFunction::from_code(self.owner_field("Key-Function")?)
    }

    /// The declared expiration, if any. A present but malformed date
    /// is an error, not an absent one.
    pub fn expire_date(&self) -> Result<Option<DateYmd>, RecordError> {
        match self.owner_field("Expire-Date-YYYYMMDD") {
            None => Ok(None),
            Some(bytes) => Ok(Some(DateYmd::from_bytes(bytes)?)),
        }
    }

    /// Digest of the canonical serialization; the value a relying
    /// party pins out-of-band for a root record.
    pub fn fingerprint<P: SignatureProvider>(
        &self,
        provider: &P,
        algorithm: HashAlgorithm,
    ) -> Digest {
        provider.hash(algorithm, &self.serialize())
    }
}

impl fmt::Display for PublicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.sexp, f)
    }
}

/// A private key record. Atoms are zeroized on drop; there is no
/// `Display` and `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateRecord {
    sexp: SecretSexp,
}

impl PrivateRecord {
    pub fn from_sexp(sexp: Sexp) -> Result<Self, RecordError> {
        if !sexp.has_tag(KEY_RECORD_TAG) {
            return Err(RecordError::NotAKeyRecord);
        }
        if sexp.find_token(OWNER_INFO_TAG).is_none() {
            return Err(RecordError::MissingOwnerInfo);
        }
        if sexp.find_token("private-key").is_none() {
            return Err(RecordError::MissingKeyMaterial("private-key"));
        }
        Ok(Self {
            sexp: SecretSexp::new(sexp),
        })
    }

    pub fn parse(bytes: &[u8], limits: &ParseLimits) -> Result<Self, RecordError> {
        Self::from_sexp(sexp::parse(bytes, limits)?)
    }

    /// The canonical byte form in a zeroizing buffer. Callers that
    /// persist it own the cleanup of their copy.
    pub fn serialize(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(sexp::serialize(self.sexp.expose()))
    }

    /// The `private-key` subrecord, for handing to the provider's
    /// `sign`.
    pub fn private_key(&self) -> Option<SecretSexp> {
        self.sexp
            .expose()
            .find_token("private-key")
            .cloned()
            .map(SecretSexp::new)
    }

    pub fn name(&self) -> Option<&[u8]> {
        self.owner_field("Name")
    }

    pub fn key_function(&self) -> Option<KeyFunction> {
        KeyFunction::from_code(self.owner_field("Key-Function")?)
    }

    fn owner_field(&self, tag: &str) -> Option<&[u8]> {
        let value = self
            .sexp
            .expose()
            .find_token(OWNER_INFO_TAG)?
            .value_of(tag)?;
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

impl fmt::Debug for PrivateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateRecord(<redacted>)")
    }
}

/// The two records produced for one key pair.
#[derive(Debug)]
pub struct KeyBundle {
    pub public_record: PublicRecord,
    pub private_record: PrivateRecord,
}

/// Compose a provider key pair with owner metadata into a bundle.
///
/// Fails with `IncompleteMetadata` when the key function is unset:
/// an untagged key could later be presented for the wrong role.
pub fn build_bundle(
    keypair: &RawKeyPair,
    metadata: &OwnerMetadata,
    created_at: CreateTime,
) -> Result<KeyBundle, BundleError> {
    let function = metadata
        .key_function
        .ok_or(BundleError::IncompleteMetadata("key_function"))?;

    let public_key = keypair
        .extract_public()
        .map_err(|e| BundleError::MalformedKeyPair(e.to_string()))?;
    let private_key = keypair
        .extract_private()
        .map_err(|e| BundleError::MalformedKeyPair(e.to_string()))?;

    let public_owner = Sexp::list(vec![
        Sexp::atom(OWNER_INFO_TAG),
        Sexp::pair("Name", metadata.name.as_str()),
        Sexp::pair("Comment", metadata.comment.as_str()),
        Sexp::pair("Key-Function", function.code()),
        opt_pair("Natural-Message-ID", &metadata.natural_message_id),
        opt_pair("IPV4", &metadata.ipv4),
        opt_pair("IPV6", &metadata.ipv6),
        opt_pair("Alternative-IPV4", &metadata.backup_ipv4),
        Sexp::pair("Create-Time", created_at.as_str()),
        Sexp::pair(
            "Expire-Date-YYYYMMDD",
            metadata
                .expire_date
                .as_ref()
                .map(|d| d.as_bytes().to_vec())
                .unwrap_or_default(),
        ),
    ]);

    let private_owner = Sexp::list(vec![
        Sexp::atom(OWNER_INFO_TAG),
        Sexp::pair("Name", metadata.name.as_str()),
        Sexp::pair("Comment", metadata.comment.as_str()),
        Sexp::pair("Key-Function", function.code()),
        Sexp::pair("Create-Time", created_at.as_str()),
    ]);

    let public_record = PublicRecord::from_sexp(Sexp::list(vec![
        Sexp::atom(KEY_RECORD_TAG),
        public_owner,
        public_key,
    ]))?;
    let private_record = PrivateRecord::from_sexp(Sexp::list(vec![
        Sexp::atom(KEY_RECORD_TAG),
        private_owner,
        private_key.expose().clone(),
    ]))?;

    Ok(KeyBundle {
        public_record,
        private_record,
    })
}

fn opt_pair(tag: &str, value: &Option<String>) -> Sexp {
    Sexp::pair(tag, value.as_deref().unwrap_or(""))
}
