//! Owner metadata attached to key records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MetadataError;

/// The role a key pair is allowed to play.
///
/// Wire codes are single letters: `e` for encryption, `s` for
/// signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyFunction {
    Encrypt,
    Sign,
}

impl KeyFunction {
    /// The single-letter wire code.
    pub fn code(self) -> &'static str {
        match self {
            KeyFunction::Encrypt => "e",
            KeyFunction::Sign => "s",
        }
    }

    pub fn from_code(code: &[u8]) -> Option<Self> {
        match code {
            b"e" => Some(KeyFunction::Encrypt),
            b"s" => Some(KeyFunction::Sign),
            _ => None,
        }
    }
}

/// A calendar date as exactly 8 ASCII digits, `YYYYMMDD`.
///
/// Byte-wise comparison of two dates equals chronological
/// comparison, so expiry checks need no calendar arithmetic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateYmd([u8; 8]);

impl DateYmd {
    /// Validate and wrap an 8-digit date string.
    pub fn parse(s: &str) -> Result<Self, MetadataError> {
        Self::from_bytes(s.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        if bytes.len() != 8 || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(MetadataError::InvalidDate(
                String::from_utf8_lossy(bytes).into_owned(),
            ));
        }
        let mut digits = [0u8; 8];
        digits.copy_from_slice(bytes);
        Ok(Self(digits))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Whether this date lies strictly before `today`. A key is valid
    /// through its expire date and rejected starting the day after.
    pub fn is_past(&self, today: &DateYmd) -> bool {
        self.0 < today.0
    }
}

impl fmt::Debug for DateYmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateYmd({})", self)
    }
}

impl fmt::Display for DateYmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{}", b as char)?;
        }
        Ok(())
    }
}

/// A record creation timestamp: decimal UTC epoch seconds.
///
/// Generated when a bundle is built, never supplied by the key owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateTime(String);

impl CreateTime {
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and reachability information about a key's owner.
///
/// Everything here ends up in the public record; only name, comment,
/// and key function also reach the private record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerMetadata {
    pub name: String,
    pub comment: String,
    /// Must be set before a bundle can be built.
    pub key_function: Option<KeyFunction>,
    pub natural_message_id: Option<String>,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub backup_ipv4: Option<String>,
    pub expire_date: Option<DateYmd>,
}

impl OwnerMetadata {
    /// Start building metadata for a named owner.
    pub fn builder(name: impl Into<String>) -> MetadataBuilder {
        MetadataBuilder::new(name)
    }
}

/// Builder for [`OwnerMetadata`].
pub struct MetadataBuilder {
    name: String,
    comment: String,
    key_function: Option<KeyFunction>,
    natural_message_id: Option<String>,
    ipv4: Option<String>,
    ipv6: Option<String>,
    backup_ipv4: Option<String>,
    expire_date: Option<DateYmd>,
}

impl MetadataBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            key_function: None,
            natural_message_id: None,
            ipv4: None,
            ipv6: None,
            backup_ipv4: None,
            expire_date: None,
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn key_function(mut self, function: KeyFunction) -> Self {
        self.key_function = Some(function);
        self
    }

    pub fn natural_message_id(mut self, id: impl Into<String>) -> Self {
        self.natural_message_id = Some(id.into());
        self
    }

    pub fn ipv4(mut self, addr: impl Into<String>) -> Self {
        self.ipv4 = Some(addr.into());
        self
    }

    pub fn ipv6(mut self, addr: impl Into<String>) -> Self {
        self.ipv6 = Some(addr.into());
        self
    }

    pub fn backup_ipv4(mut self, addr: impl Into<String>) -> Self {
        self.backup_ipv4 = Some(addr.into());
        self
    }

    pub fn expire_date(mut self, date: DateYmd) -> Self {
        self.expire_date = Some(date);
        self
    }

    pub fn build(self) -> OwnerMetadata {
        OwnerMetadata {
            name: self.name,
            comment: self.comment,
            key_function: self.key_function,
            natural_message_id: self.natural_message_id,
            ipv4: self.ipv4,
            ipv6: self.ipv6,
            backup_ipv4: self.backup_ipv4,
            expire_date: self.expire_date,
        }
    }
}
