//! Vote edges: the signed deltas a vote transaction applies to a delegate.

use crate::address::Address;
use crate::error::TypesError;
use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Direction of a vote edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteSign {
    /// `+<publicKey>`: start voting for the delegate.
    Add,
    /// `-<publicKey>`: stop voting for the delegate.
    Remove,
}

impl VoteSign {
    pub fn as_char(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Remove => '-',
        }
    }
}

impl fmt::Display for VoteSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A directed, signed relationship from a voter to a delegate.
///
/// `order` is the commit sequence number of the transaction that carried
/// the vote; for a given (voter, delegate) pair the edge with the highest
/// order determines membership.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteEdge {
    pub voter: Address,
    pub delegate: PublicKey,
    pub sign: VoteSign,
    pub order: u64,
}

impl VoteEdge {
    pub fn add(voter: Address, delegate: PublicKey, order: u64) -> Self {
        Self {
            voter,
            delegate,
            sign: VoteSign::Add,
            order,
        }
    }

    pub fn remove(voter: Address, delegate: PublicKey, order: u64) -> Self {
        Self {
            voter,
            delegate,
            sign: VoteSign::Remove,
            order,
        }
    }

    /// Parse a vote transaction entry such as `+c094eb...ab6f`.
    pub fn parse(voter: Address, entry: &str, order: u64) -> Result<Self, TypesError> {
        let (sign, key) = match entry.chars().next() {
            Some('+') => (VoteSign::Add, &entry[1..]),
            Some('-') => (VoteSign::Remove, &entry[1..]),
            _ => return Err(TypesError::InvalidVote(entry.to_string())),
        };
        let delegate =
            PublicKey::from_hex(key).map_err(|_| TypesError::InvalidVote(entry.to_string()))?;
        Ok(Self {
            voter,
            delegate,
            sign,
            order,
        })
    }

    /// Parse every entry of one vote transaction. All entries share
    /// `order`, so a transaction may name each delegate only once.
    pub fn parse_transaction<E: AsRef<str>>(
        voter: &Address,
        entries: &[E],
        order: u64,
    ) -> Result<Vec<Self>, TypesError> {
        let mut seen = HashSet::with_capacity(entries.len());
        let mut edges = Vec::with_capacity(entries.len());
        for entry in entries {
            let edge = Self::parse(voter.clone(), entry.as_ref(), order)?;
            if !seen.insert(edge.delegate) {
                return Err(TypesError::InvalidVote(format!(
                    "delegate {} appears twice in one transaction",
                    edge.delegate
                )));
            }
            edges.push(edge);
        }
        Ok(edges)
    }
}

impl fmt::Display for VoteEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{} #{}",
            self.voter, self.sign, self.delegate, self.order
        )
    }
}
