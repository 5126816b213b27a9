//! LMDB implementation of VoteEdgeStore.
//!
//! Keys are `order (u64 BE) ++ delegate key (32 bytes) ++ voter address`,
//! so LMDB's byte ordering yields edges in commit order. The value is the
//! sign character. The first edge stored under a key is kept, matching the
//! ledger, which keeps the first of two edges sharing an order.

use dpos_store::{StoreError, VoteEdgeStore};
use dpos_types::{Address, PublicKey, VoteEdge, VoteSign};
use tracing::warn;

use crate::{LmdbError, LmdbStore};

const ORDER_LEN: usize = 8;
const KEY_PREFIX_LEN: usize = ORDER_LEN + 32;

fn encode_key(edge: &VoteEdge) -> Vec<u8> {
    let voter = edge.voter.as_str().as_bytes();
    let mut key = Vec::with_capacity(KEY_PREFIX_LEN + voter.len());
    key.extend_from_slice(&edge.order.to_be_bytes());
    key.extend_from_slice(edge.delegate.as_bytes());
    key.extend_from_slice(voter);
    key
}

fn decode_edge(key: &[u8], val: &[u8]) -> Result<VoteEdge, LmdbError> {
    if key.len() <= KEY_PREFIX_LEN {
        return Err(LmdbError::Corruption(format!(
            "vote edge key too short: {} bytes",
            key.len()
        )));
    }
    let mut order = [0u8; ORDER_LEN];
    order.copy_from_slice(&key[..ORDER_LEN]);
    let mut delegate = [0u8; 32];
    delegate.copy_from_slice(&key[ORDER_LEN..KEY_PREFIX_LEN]);
    let voter = std::str::from_utf8(&key[KEY_PREFIX_LEN..])
        .map_err(|e| LmdbError::Corruption(e.to_string()))?;
    let voter = Address::parse(voter).map_err(|e| LmdbError::Corruption(e.to_string()))?;
    let sign = match val {
        b"+" => VoteSign::Add,
        b"-" => VoteSign::Remove,
        other => {
            return Err(LmdbError::Corruption(format!(
                "invalid vote sign: {other:?}"
            )))
        }
    };
    Ok(VoteEdge {
        voter,
        delegate: PublicKey::new(delegate),
        sign,
        order: u64::from_be_bytes(order),
    })
}

impl VoteEdgeStore for LmdbStore {
    fn append_edge(&self, edge: &VoteEdge) -> Result<(), StoreError> {
        let key = encode_key(edge);
        let sign: &[u8] = match edge.sign {
            VoteSign::Add => b"+",
            VoteSign::Remove => b"-",
        };
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if let Some(existing) = self
            .vote_edges_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
        {
            if existing != sign {
                warn!(%edge, "conflicting vote edge already stored, keeping the first");
            }
            return Ok(());
        }
        self.vote_edges_db
            .put(&mut wtxn, &key, sign)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_edges(&self) -> Result<Vec<VoteEdge>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.vote_edges_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut edges = Vec::new();
        for entry in iter {
            let (key, val) = entry.map_err(LmdbError::from)?;
            edges.push(decode_edge(key, val)?);
        }
        Ok(edges)
    }

    fn edge_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.vote_edges_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
