//! Error type for parsing and constructing core types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("invalid balance: {0}")]
    InvalidBalance(String),

    #[error("invalid vote: {0}")]
    InvalidVote(String),
}
