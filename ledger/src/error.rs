use dpos_store::StoreError;
use dpos_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid vote: {0}")]
    InvalidVote(#[from] TypesError),
}
