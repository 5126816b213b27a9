//! The voters node: wires the account store, the vote ledger and the query
//! service together and runs the HTTP server.

use std::sync::Arc;

use dpos_ledger::{ApplyOutcome, LedgerStats, VoteLedger};
use dpos_rpc::{BoundRpcServer, RpcMetrics, RpcServer, VoterQueryService};
use dpos_store::{Account, AccountStore, VoteEdgeStore};
use dpos_store_lmdb::{LmdbEnvironment, LmdbStore};
use dpos_types::{Address, VoteEdge};
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::genesis::Genesis;
use crate::shutdown::ShutdownController;
use crate::tracing_spans::{genesis_span, ledger_rebuild_span, vote_transaction_span};

/// A node serving delegate voter queries.
///
/// Writes (accounts, vote transactions) go to the store first and are then
/// folded into the in-memory ledger; queries only ever read.
pub struct VotersNode<S> {
    config: NodeConfig,
    store: Arc<S>,
    ledger: Arc<VoteLedger>,
    service: Arc<VoterQueryService<S>>,
}

impl VotersNode<LmdbStore> {
    /// Open the LMDB environment in `config.data_dir` and bring the node up
    /// to date with it.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)?;
        let node = Self::new(config, Arc::new(env.store()));
        node.initialize()?;
        Ok(node)
    }
}

impl<S> VotersNode<S>
where
    S: AccountStore + VoteEdgeStore + Send + Sync + 'static,
{
    /// Build a node over `store`. The ledger starts empty; call
    /// [`initialize`](Self::initialize) to load genesis and replay the
    /// edge log.
    pub fn new(config: NodeConfig, store: Arc<S>) -> Self {
        let ledger = Arc::new(VoteLedger::new());
        let service = Arc::new(
            VoterQueryService::new(store.clone(), ledger.clone(), Arc::new(RpcMetrics::new()))
                .with_max_limit(config.max_limit)
                .require_delegate(config.require_delegate),
        );
        Self {
            config,
            store,
            ledger,
            service,
        }
    }

    /// Apply the configured genesis to an empty store, then rebuild the
    /// ledger from the persisted edge log.
    pub fn initialize(&self) -> Result<LedgerStats, NodeError> {
        if let Some(path) = &self.config.genesis_file {
            let count = self.store.account_count()?;
            if count == 0 {
                let genesis = Genesis::from_json_file(path)?;
                self.apply_genesis(&genesis)?;
            } else {
                info!(accounts = count, "store already initialized, skipping genesis");
            }
        }
        let _span = ledger_rebuild_span().entered();
        Ok(self.ledger.rebuild_from_store(self.store.as_ref())?)
    }

    /// Write genesis accounts and votes. Every account and entry is
    /// checked before anything is written.
    pub fn apply_genesis(&self, genesis: &Genesis) -> Result<(), NodeError> {
        let _span = genesis_span(genesis.accounts.len(), genesis.votes.len()).entered();
        let accounts = genesis.accounts()?;
        let edges = genesis.vote_edges()?;

        for account in &accounts {
            self.store.put_account(account)?;
        }
        for edge in &edges {
            self.store.append_edge(edge)?;
        }
        let changed = self.ledger.apply_edges(edges.iter());
        info!(
            accounts = accounts.len(),
            edges = edges.len(),
            changed,
            "genesis applied"
        );
        Ok(())
    }

    /// Insert or update an account, e.g. after a balance change or a
    /// delegate registration.
    pub fn put_account(&self, account: &Account) -> Result<(), NodeError> {
        self.store.put_account(account)?;
        Ok(())
    }

    /// Apply a committed vote transaction: `entries` are `+<publicKey>` or
    /// `-<publicKey>` strings and `order` is the transaction's commit
    /// sequence number.
    ///
    /// All entries are parsed before any edge is written. Returns the number
    /// of voter sets that changed.
    pub fn apply_vote_transaction<E: AsRef<str>>(
        &self,
        voter: &Address,
        entries: &[E],
        order: u64,
    ) -> Result<usize, NodeError> {
        let _span = vote_transaction_span(voter, order, entries.len()).entered();

        let edges = VoteEdge::parse_transaction(voter, entries, order)?;

        let mut changed = 0;
        for edge in &edges {
            self.store.append_edge(edge)?;
            match self.ledger.apply_vote_edge(edge) {
                ApplyOutcome::Added | ApplyOutcome::Removed => changed += 1,
                ApplyOutcome::Unchanged => {}
                ApplyOutcome::Stale => warn!(%edge, "stale vote edge ignored"),
            }
        }
        Ok(changed)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<VoteLedger> {
        &self.ledger
    }

    pub fn service(&self) -> &Arc<VoterQueryService<S>> {
        &self.service
    }

    /// Bind the HTTP listener on the configured address.
    pub async fn bind_rpc(&self) -> Result<BoundRpcServer<S>, NodeError> {
        let addr = self.config.rpc_addr()?;
        Ok(RpcServer::new(addr, self.service.clone()).bind().await?)
    }

    /// Serve HTTP until `shutdown` fires.
    pub async fn run(&self, shutdown: &ShutdownController) -> Result<(), NodeError> {
        let server = self.bind_rpc().await?;
        let stats = self.ledger.stats();
        info!(
            addr = %server.local_addr()?,
            delegates = stats.delegates,
            votes = stats.total_votes,
            "voters node started"
        );
        server.serve(shutdown.signalled()).await?;
        info!("voters node stopped");
        Ok(())
    }
}
