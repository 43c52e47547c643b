//! Wrappers for secret key material.
//!
//! Private-key bytes must be zeroized on every exit path and must
//! never reach logs. These wrappers enforce both: the inner value is
//! overwritten on drop, and `Debug` output is redacted.

use std::fmt;
use zeroize::Zeroizing;

use crate::sexp::Sexp;

/// A byte buffer that is zeroized when released.
pub struct SecretBytes(Zeroizing<Vec<u8>>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Borrow the secret bytes. Callers must not copy them into
    /// buffers that outlive this wrapper.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes(<{} bytes redacted>)", self.0.len())
    }
}

/// A record tree containing secret atoms.
///
/// Every atom in the tree is overwritten with zeros when the wrapper
/// is dropped. There is no `Display`; serializing a secret tree goes
/// through [`crate::record::PrivateRecord::serialize`], which returns
/// a zeroizing buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretSexp(Sexp);

impl SecretSexp {
    pub fn new(sexp: Sexp) -> Self {
        Self(sexp)
    }

    /// Borrow the inner tree. The borrow must not escape into
    /// long-lived copies; clone into another `SecretSexp` instead.
    pub fn expose(&self) -> &Sexp {
        &self.0
    }
}

impl Drop for SecretSexp {
    fn drop(&mut self) {
        self.0.zeroize_atoms();
    }
}

impl fmt::Debug for SecretSexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretSexp(<redacted>)")
    }
}
