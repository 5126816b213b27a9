//! Genesis state: the accounts and votes a fresh node starts from.
//!
//! ```json
//! {
//!   "accounts": [
//!     { "publicKey": "c094eb...", "username": "genesis_1", "balance": "0" },
//!     { "address": "16313739661670634666L", "balance": "10000000000000000" }
//!   ],
//!   "votes": [
//!     { "voter": "16313739661670634666L", "votes": ["+c094eb..."] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use dpos_store::Account;
use dpos_types::{Address, Balance, PublicKey, Username, VoteEdge};

use crate::NodeError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub votes: Vec<GenesisVote>,
}

/// An account seeded at genesis. Either `address` or `publicKey` must be
/// set; a missing address is derived from the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisAccount {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub public_key: Option<PublicKey>,
    #[serde(default)]
    pub username: Option<Username>,
    pub balance: Balance,
}

/// A vote transaction applied at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisVote {
    pub voter: Address,
    /// `+<publicKey>` or `-<publicKey>` entries.
    pub votes: Vec<String>,
}

impl GenesisAccount {
    pub fn to_account(&self) -> Result<Account, NodeError> {
        let address = match (&self.address, &self.public_key) {
            (Some(address), Some(key)) => {
                let derived = Address::from_public_key(key);
                if &derived != address {
                    return Err(NodeError::Genesis(format!(
                        "address {address} does not belong to public key {key}"
                    )));
                }
                derived
            }
            (Some(address), None) => address.clone(),
            (None, Some(key)) => Address::from_public_key(key),
            (None, None) => {
                return Err(NodeError::Genesis(
                    "account needs an address or a publicKey".into(),
                ))
            }
        };
        Ok(Account {
            address,
            public_key: self.public_key,
            username: self.username.clone(),
            balance: self.balance,
        })
    }
}

impl Genesis {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Genesis(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, NodeError> {
        serde_json::from_str(s).map_err(|e| NodeError::Genesis(e.to_string()))
    }

    pub fn accounts(&self) -> Result<Vec<Account>, NodeError> {
        self.accounts.iter().map(GenesisAccount::to_account).collect()
    }

    /// Vote edges in file order, numbered from 1. Every entry of one vote
    /// transaction shares its order, so a vote naming the same delegate
    /// twice is rejected like a live transaction would be.
    pub fn vote_edges(&self) -> Result<Vec<VoteEdge>, NodeError> {
        let mut edges = Vec::new();
        for (i, vote) in self.votes.iter().enumerate() {
            let order = i as u64 + 1;
            edges.extend(VoteEdge::parse_transaction(&vote.voter, &vote.votes, order)?);
        }
        Ok(edges)
    }
}
