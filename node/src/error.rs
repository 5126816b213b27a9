use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] dpos_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] dpos_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] dpos_store_lmdb::LmdbError),

    #[error("RPC server error: {0}")]
    Rpc(#[from] dpos_rpc::RpcError),

    #[error("invalid vote: {0}")]
    InvalidVote(#[from] dpos_types::TypesError),

    #[error("config error: {0}")]
    Config(String),

    #[error("genesis error: {0}")]
    Genesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
