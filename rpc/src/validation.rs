//! Validation of raw voters query parameters.
//!
//! Parameters arrive as optional strings exactly as they appeared in the
//! query string. Validation turns them into a [`VotersQuery`] whose
//! [`Identifier`] names exactly one way of finding the delegate, or fails
//! with a [`ValidationError`] before any lookup is made.

use dpos_types::{Address, Username};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::pagination::{OffsetPagination, MAX_LIMIT};

/// Minimum length of the `address` parameter.
pub const ADDRESS_MIN_LEN: usize = 2;

/// Maximum length of the `address` parameter: 20 digits plus the suffix.
pub const ADDRESS_MAX_LEN: usize = Address::MAX_DIGITS + 1;

/// Raw query string parameters of `GET /api/voters`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotersParams {
    pub address: Option<String>,
    pub public_key: Option<String>,
    pub username: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// The single parameter a delegate is looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Address(Address),
    /// Hex text as supplied. Empty means "match nothing".
    PublicKey(String),
    Username(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Address,
    Username,
    PublicKey,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Username => "username",
            Self::PublicKey => "publicKey",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Requested ordering of the voter list, written `field[:asc|desc]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::PublicKey,
            order: SortOrder::Asc,
        }
    }
}

impl FromStr for Sort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::Format {
            format: "sort",
            value: s.to_string(),
        };
        let (field, order) = match s.split_once(':') {
            Some((field, order)) => (field, Some(order)),
            None => (s, None),
        };
        let field = match field {
            "address" => SortField::Address,
            "username" => SortField::Username,
            "publicKey" => SortField::PublicKey,
            _ => return Err(invalid()),
        };
        let order = match order {
            None | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => return Err(invalid()),
        };
        Ok(Self { field, order })
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        write!(f, "{}:{}", self.field.as_str(), order)
    }
}

/// A validated voters query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotersQuery {
    pub identifier: Identifier,
    pub sort: Sort,
    pub pagination: OffsetPagination,
}

/// Rejection of a voters request. The display text is the client-facing
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Zero or several of `address`, `publicKey`, `username` were supplied.
    #[error("Data does not match any schemas from 'anyOf'")]
    AnyOf,

    #[error("String is too short ({len} chars), minimum {min}")]
    TooShort {
        field: &'static str,
        len: usize,
        min: usize,
    },

    #[error("String is too long ({len} chars), maximum {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Object didn't pass validation for format {format}: {value}")]
    Format { format: &'static str, value: String },

    #[error("Expected type {expected} but found type {found}")]
    Type {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Expected type integer for {field} but found: {value}")]
    NotInteger { field: &'static str, value: String },

    #[error("Value {value} is greater than maximum {max} for {field}")]
    Maximum {
        field: &'static str,
        value: String,
        max: u64,
    },

    #[error("Value {value} is less than minimum 0 for {field}")]
    Negative { field: &'static str, value: String },
}

impl ValidationError {
    /// Parameter the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::AnyOf => None,
            Self::Format { format, .. } => Some(*format),
            Self::TooShort { field, .. }
            | Self::TooLong { field, .. }
            | Self::Type { field, .. }
            | Self::NotInteger { field, .. }
            | Self::Maximum { field, .. }
            | Self::Negative { field, .. } => Some(*field),
        }
    }
}

/// Checks raw parameters against the voters endpoint schema.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_limit: u64,
}

impl Validator {
    pub fn new(max_limit: u64) -> Self {
        Self { max_limit }
    }

    pub fn max_limit(&self) -> u64 {
        self.max_limit
    }

    pub fn validate(&self, params: &VotersParams) -> Result<VotersQuery, ValidationError> {
        let identifier = match (&params.address, &params.public_key, &params.username) {
            (Some(address), None, None) => Identifier::Address(validate_address(address)?),
            (None, Some(key), None) => Identifier::PublicKey(validate_public_key(key)?),
            (None, None, Some(name)) => Identifier::Username(validate_username(name)?),
            _ => return Err(ValidationError::AnyOf),
        };
        let sort = match &params.sort {
            Some(raw) => raw.parse()?,
            None => Sort::default(),
        };
        let limit = params
            .limit
            .as_deref()
            .map(|raw| parse_non_negative("limit", raw, self.max_limit))
            .transpose()?;
        let offset = params
            .offset
            .as_deref()
            .map(|raw| parse_non_negative("offset", raw, u64::MAX))
            .transpose()?
            .unwrap_or(0);

        Ok(VotersQuery {
            identifier,
            sort,
            pagination: OffsetPagination::new(offset, limit),
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(MAX_LIMIT)
    }
}

fn validate_address(raw: &str) -> Result<Address, ValidationError> {
    let stripped = raw.trim();
    let len = stripped.chars().count();
    if len < ADDRESS_MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "address",
            len,
            min: ADDRESS_MIN_LEN,
        });
    }
    if len > ADDRESS_MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "address",
            len,
            max: ADDRESS_MAX_LEN,
        });
    }
    Address::parse(stripped).map_err(|_| ValidationError::Format {
        format: "address",
        value: raw.to_string(),
    })
}

/// An empty key is accepted: it counts as the identifying parameter but
/// can never match an account.
fn validate_public_key(raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Ok(String::new());
    }
    if raw.len() != dpos_types::PublicKey::HEX_LEN || !raw.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(ValidationError::Format {
            format: "publicKey",
            value: raw.to_string(),
        });
    }
    Ok(raw.to_string())
}

fn validate_username(raw: &str) -> Result<String, ValidationError> {
    if let Some(found) = numeric_type(raw) {
        return Err(ValidationError::Type {
            field: "username",
            expected: "string",
            found,
        });
    }
    let len = raw.chars().count();
    if len < Username::MIN_LEN {
        return Err(ValidationError::TooShort {
            field: "username",
            len,
            min: Username::MIN_LEN,
        });
    }
    if len > Username::MAX_LEN {
        return Err(ValidationError::TooLong {
            field: "username",
            len,
            max: Username::MAX_LEN,
        });
    }
    Ok(raw.to_string())
}

/// Query strings carry no types, so a value that reads as a number is
/// treated as one.
fn numeric_type(raw: &str) -> Option<&'static str> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Some("integer");
    }
    let looks_numeric = raw
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'e' | b'E' | b'+'));
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && looks_numeric => Some("number"),
        _ => None,
    }
}

fn parse_non_negative(field: &'static str, raw: &str, max: u64) -> Result<u64, ValidationError> {
    let not_integer = || ValidationError::NotInteger {
        field,
        value: raw.to_string(),
    };
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_integer());
    }
    if negative && digits.bytes().any(|b| b != b'0') {
        return Err(ValidationError::Negative {
            field,
            value: raw.to_string(),
        });
    }
    let too_large = || ValidationError::Maximum {
        field,
        value: raw.to_string(),
        max,
    };
    let value = digits.parse::<u64>().map_err(|_| too_large())?;
    if value > max {
        return Err(too_large());
    }
    Ok(value)
}
