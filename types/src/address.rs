//! Account address type: a decimal u64 followed by the `L` suffix.

use crate::error::TypesError;
use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// An account address such as `16313739661670634666L`.
///
/// The numeric part is the first 8 bytes (little-endian) of the SHA-256
/// digest of the account's public key. Addresses compare lexicographically
/// on their rendered text, which is the order the voters endpoint sorts by.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Suffix character terminating every address.
    pub const SUFFIX: char = 'L';

    /// Maximum number of decimal digits before the suffix.
    pub const MAX_DIGITS: usize = 20;

    /// Parse and validate an address string.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        if Self::is_valid(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TypesError::InvalidAddress(raw.to_string()))
        }
    }

    /// Derive the address owned by a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self::from_u64(u64::from_le_bytes(head))
    }

    /// Build an address from its numeric part.
    pub fn from_u64(value: u64) -> Self {
        Self(format!("{value}{}", Self::SUFFIX))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part of the address.
    pub fn as_u64(&self) -> u64 {
        // Construction guarantees the digits fit in a u64.
        self.0[..self.0.len() - 1].parse().unwrap_or_default()
    }

    /// Check the address format without allocating.
    pub fn is_valid(raw: &str) -> bool {
        let Some(digits) = raw.strip_suffix(Self::SUFFIX) else {
            return false;
        };
        !digits.is_empty()
            && digits.len() <= Self::MAX_DIGITS
            && digits.bytes().all(|b| b.is_ascii_digit())
            && digits.parse::<u64>().is_ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(TypesError::InvalidAddress(s))
        }
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
