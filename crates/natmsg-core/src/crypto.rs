//! The signature-provider capability.
//!
//! Key-pair generation, signing, verification, and hashing are
//! delegated to a [`SignatureProvider`]. The default implementation,
//! [`DalekProvider`], uses Ed25519 for signing keys, X25519 for
//! encryption keys, and SHA-384 as the wire-default digest.
//!
//! Key material crosses the provider boundary as S-expression
//! subrecords in the libgcrypt shape:
//!
//! ```text
//! (public-key (ecc (curve Ed25519) (flags eddsa) (q |…|)))
//! (private-key (ecc (curve Ed25519) (flags eddsa) (q |…|) (d |…|)))
//! (sig-val (eddsa (r |…|) (s |…|)))
//! ```

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::payload::SignablePayload;
use crate::secret::SecretSexp;
use crate::sexp::Sexp;

/// Digest algorithms a record may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// The wire default.
    Sha384,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// The identifier embedded in signable payloads.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Parse a payload identifier.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sha384" => Some(HashAlgorithm::Sha384),
            b"sha512" => Some(HashAlgorithm::Sha512),
            b"blake3" => Some(HashAlgorithm::Blake3),
            _ => None,
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Blake3 => 32,
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha384
    }
}

/// Key-pair algorithms the provider can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// Signing keys.
    Ed25519,
    /// Encryption keys (key agreement only).
    X25519,
}

impl KeyAlgorithm {
    /// The curve name embedded in key subrecords.
    pub fn curve_name(self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "Ed25519",
            KeyAlgorithm::X25519 => "Curve25519",
        }
    }

    pub fn from_curve_name(name: &[u8]) -> Option<Self> {
        match name {
            b"Ed25519" => Some(KeyAlgorithm::Ed25519),
            b"Curve25519" => Some(KeyAlgorithm::X25519),
            _ => None,
        }
    }

    /// Whether keys of this algorithm may produce signatures.
    pub fn is_signing(self) -> bool {
        matches!(self, KeyAlgorithm::Ed25519)
    }
}

/// A digest produced by [`SignatureProvider::hash`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest(pub Vec<u8>);

impl Digest {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from hex, as distributed for fingerprint pins.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode(s)?))
    }

    /// Constant-time equality. Digest lengths are public (fixed by
    /// the declared algorithm), so a length mismatch returns early.
    pub fn ct_eq(&self, other: &Digest) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        bool::from(self.0.ct_eq(&other.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Digest({})", &hex[..hex.len().min(16)])
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A provider-generated key pair, held as a combined secret record
/// until it is split into its public and private constituents.
pub struct RawKeyPair {
    algorithm: KeyAlgorithm,
    sexp: SecretSexp,
}

impl RawKeyPair {
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Clone out the `public-key` subrecord.
    pub fn extract_public(&self) -> Result<Sexp, CryptoError> {
        self.sexp
            .expose()
            .find_token("public-key")
            .cloned()
            .ok_or_else(|| CryptoError::MalformedKey("no public-key subrecord".into()))
    }

    /// Clone out the `private-key` subrecord, secret-wrapped.
    pub fn extract_private(&self) -> Result<SecretSexp, CryptoError> {
        self.sexp
            .expose()
            .find_token("private-key")
            .cloned()
            .map(SecretSexp::new)
            .ok_or_else(|| CryptoError::MalformedKey("no private-key subrecord".into()))
    }
}

impl fmt::Debug for RawKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawKeyPair({:?}, <redacted>)", self.algorithm)
    }
}

/// The external cryptography capability.
///
/// Implementations must be deterministic in `sign`, `verify`, and
/// `hash`: identical inputs always produce identical outputs.
pub trait SignatureProvider {
    /// Generate a fresh key pair for the given algorithm.
    fn generate_keypair(&self, algorithm: KeyAlgorithm) -> Result<RawKeyPair, CryptoError>;

    /// Produce a detached signature record over the payload's
    /// canonical bytes. The key must be a `private-key` subrecord of
    /// a signing algorithm.
    fn sign(&self, payload: &SignablePayload, key: &SecretSexp) -> Result<Sexp, CryptoError>;

    /// Check a signature record against the payload's canonical
    /// bytes. `Ok(false)` means the material was well-formed but the
    /// signature does not verify.
    fn verify(
        &self,
        payload: &SignablePayload,
        signature: &Sexp,
        public_key: &Sexp,
    ) -> Result<bool, CryptoError>;

    /// Digest arbitrary bytes with the given algorithm.
    fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Digest;
}

impl<P: SignatureProvider + ?Sized> SignatureProvider for &P {
    fn generate_keypair(&self, algorithm: KeyAlgorithm) -> Result<RawKeyPair, CryptoError> {
        (**self).generate_keypair(algorithm)
    }

    fn sign(&self, payload: &SignablePayload, key: &SecretSexp) -> Result<Sexp, CryptoError> {
        (**self).sign(payload, key)
    }

    fn verify(
        &self,
        payload: &SignablePayload,
        signature: &Sexp,
        public_key: &Sexp,
    ) -> Result<bool, CryptoError> {
        (**self).verify(payload, signature, public_key)
    }

    fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Digest {
        (**self).hash(algorithm, data)
    }
}

/// Default provider over ed25519-dalek / x25519-dalek.
#[derive(Debug, Default, Clone)]
pub struct DalekProvider;

impl DalekProvider {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic key pair from a 32-byte seed. Test and fixture
    /// use only; production keys come from `generate_keypair`.
    pub fn keypair_from_seed(algorithm: KeyAlgorithm, seed: &[u8; 32]) -> RawKeyPair {
        match algorithm {
            KeyAlgorithm::Ed25519 => {
                let signing_key = SigningKey::from_bytes(seed);
                let public = signing_key.verifying_key().to_bytes();
                build_keypair_sexp(algorithm, &public, seed)
            }
            KeyAlgorithm::X25519 => {
                let secret = x25519_dalek::StaticSecret::from(*seed);
                let public = x25519_dalek::PublicKey::from(&secret).to_bytes();
                build_keypair_sexp(algorithm, &public, seed)
            }
        }
    }
}

impl SignatureProvider for DalekProvider {
    fn generate_keypair(&self, algorithm: KeyAlgorithm) -> Result<RawKeyPair, CryptoError> {
        let mut rng = rand::thread_rng();
        let mut seed = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rng, &mut seed);
        let keypair = Self::keypair_from_seed(algorithm, &seed);
        seed.zeroize();
        Ok(keypair)
    }

    fn sign(&self, payload: &SignablePayload, key: &SecretSexp) -> Result<Sexp, CryptoError> {
        let key = key.expose();
        if !key.has_tag("private-key") {
            return Err(CryptoError::MalformedKey(
                "expected a private-key subrecord".into(),
            ));
        }
        match curve_of(key)? {
            KeyAlgorithm::Ed25519 => {}
            KeyAlgorithm::X25519 => return Err(CryptoError::NotASigningKey),
        }

        let mut seed = scalar_of(key, "d")?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        let signature = signing_key.sign(&payload.canonical_bytes());
        let bytes = signature.to_bytes();
        Ok(Sexp::list(vec![
            Sexp::atom("sig-val"),
            Sexp::list(vec![
                Sexp::atom("eddsa"),
                Sexp::pair("r", bytes[..32].to_vec()),
                Sexp::pair("s", bytes[32..].to_vec()),
            ]),
        ]))
    }

    fn verify(
        &self,
        payload: &SignablePayload,
        signature: &Sexp,
        public_key: &Sexp,
    ) -> Result<bool, CryptoError> {
        if !public_key.has_tag("public-key") {
            return Err(CryptoError::MalformedKey(
                "expected a public-key subrecord".into(),
            ));
        }
        match curve_of(public_key)? {
            KeyAlgorithm::Ed25519 => {}
            KeyAlgorithm::X25519 => return Err(CryptoError::NotASigningKey),
        }
        let q = scalar_of(public_key, "q")?;
        let verifying_key = VerifyingKey::from_bytes(&q)
            .map_err(|_| CryptoError::MalformedKey("invalid Ed25519 point".into()))?;

        let eddsa = signature
            .find_token("sig-val")
            .and_then(|v| v.find_token("eddsa"))
            .ok_or_else(|| CryptoError::MalformedSignature("no eddsa sig-val".into()))?;
        let r = fixed_value_of(eddsa, "r")?;
        let s = fixed_value_of(eddsa, "s")?;
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&r);
        bytes[32..].copy_from_slice(&s);
        let sig = Signature::from_bytes(&bytes);

        Ok(verifying_key
            .verify(&payload.canonical_bytes(), &sig)
            .is_ok())
    }

    fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Digest {
        use sha2::Digest as _;
        match algorithm {
            HashAlgorithm::Sha384 => Digest(sha2::Sha384::digest(data).to_vec()),
            HashAlgorithm::Sha512 => Digest(sha2::Sha512::digest(data).to_vec()),
            HashAlgorithm::Blake3 => Digest(blake3::hash(data).as_bytes().to_vec()),
        }
    }
}

fn build_keypair_sexp(algorithm: KeyAlgorithm, public: &[u8; 32], secret: &[u8; 32]) -> RawKeyPair {
    let curve = Sexp::pair("curve", algorithm.curve_name());
    let mut public_parts = vec![Sexp::atom("ecc"), curve.clone()];
    let mut private_parts = vec![Sexp::atom("ecc"), curve];
    if algorithm.is_signing() {
        public_parts.push(Sexp::pair("flags", "eddsa"));
        private_parts.push(Sexp::pair("flags", "eddsa"));
    }
    public_parts.push(Sexp::pair("q", public.to_vec()));
    private_parts.push(Sexp::pair("q", public.to_vec()));
    private_parts.push(Sexp::pair("d", secret.to_vec()));

    let sexp = Sexp::list(vec![
        Sexp::atom("key-data"),
        Sexp::list(vec![Sexp::atom("public-key"), Sexp::List(public_parts)]),
        Sexp::list(vec![Sexp::atom("private-key"), Sexp::List(private_parts)]),
    ]);
    RawKeyPair {
        algorithm,
        sexp: SecretSexp::new(sexp),
    }
}

fn curve_of(key: &Sexp) -> Result<KeyAlgorithm, CryptoError> {
    let name = key
        .value_of("curve")
        .ok_or_else(|| CryptoError::MalformedKey("no curve declared".into()))?;
    KeyAlgorithm::from_curve_name(name).ok_or_else(|| {
        CryptoError::UnsupportedAlgorithm(String::from_utf8_lossy(name).into_owned())
    })
}

fn scalar_of(key: &Sexp, tag: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = key
        .value_of(tag)
        .ok_or_else(|| CryptoError::MalformedKey(format!("no {tag} component")))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedKey(format!("{tag} component must be 32 bytes")))
}

fn fixed_value_of(sexp: &Sexp, tag: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = sexp
        .value_of(tag)
        .ok_or_else(|| CryptoError::MalformedSignature(format!("no {tag} component")))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedSignature(format!("{tag} component must be 32 bytes")))
}
