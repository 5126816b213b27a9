//! Response bodies of the voters endpoint.

use dpos_store::Account;
use dpos_types::{Address, Balance, PublicKey, Username};
use serde::{Deserialize, Serialize};

/// Message returned when the identifier matches no delegate.
pub const NO_DATA_MESSAGE: &str = "No data returned";

// ── Voters ───────────────────────────────────────────────────────────────

/// The delegate that was looked up, its voters and its vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotersResponse {
    pub address: Address,
    pub public_key: Option<PublicKey>,
    pub username: Option<Username>,
    pub balance: Balance,
    /// Size of the delegate's voter set, counted before pagination. A voter
    /// whose account record is missing still counts here but is left out
    /// of `voters`, so the two can differ even on an unpaged response.
    pub votes: u64,
    pub voters: Vec<VoterEntry>,
}

/// One voting account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterEntry {
    pub address: Address,
    pub public_key: Option<PublicKey>,
    pub username: Option<Username>,
    pub balance: Balance,
}

impl From<Account> for VoterEntry {
    fn from(account: Account) -> Self {
        Self {
            address: account.address,
            public_key: account.public_key,
            username: account.username,
            balance: account.balance,
        }
    }
}

// ── Messages ─────────────────────────────────────────────────────────────

/// Body carrying only a message: errors and the not-found response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn no_data() -> Self {
        Self::new(NO_DATA_MESSAGE)
    }
}
