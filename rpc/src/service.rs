//! The voters query: validate, resolve, read the voter set, enrich, sort
//! and paginate.

use dpos_ledger::{VoteLedger, VoterSet};
use dpos_store::AccountStore;
use dpos_types::Address;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, field, info_span, warn};

use crate::error::RpcError;
use crate::handlers::{VoterEntry, VotersResponse};
use crate::metrics::RpcMetrics;
use crate::pagination::MAX_LIMIT;
use crate::resolver::VoterResolver;
use crate::validation::{Sort, SortField, SortOrder, Validator, VotersParams};

/// Result of a voters query that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VotersOutcome {
    Found(VotersResponse),
    /// The identifier matched no delegate.
    NotFound,
}

/// Answers voters queries from an account store and a vote ledger.
///
/// Queries are synchronous and read-only; the ledger hands out snapshot
/// voter sets so a query never observes a half-applied vote.
pub struct VoterQueryService<S: ?Sized> {
    validator: Validator,
    resolver: VoterResolver<S>,
    store: Arc<S>,
    ledger: Arc<VoteLedger>,
    metrics: Arc<RpcMetrics>,
}

impl<S: AccountStore + ?Sized> VoterQueryService<S> {
    pub fn new(store: Arc<S>, ledger: Arc<VoteLedger>, metrics: Arc<RpcMetrics>) -> Self {
        Self {
            validator: Validator::new(MAX_LIMIT),
            resolver: VoterResolver::new(store.clone()),
            store,
            ledger,
            metrics,
        }
    }

    pub fn with_max_limit(mut self, max_limit: u64) -> Self {
        self.validator = Validator::new(max_limit);
        self
    }

    pub fn require_delegate(mut self, require: bool) -> Self {
        self.resolver = self.resolver.require_delegate(require);
        self
    }

    pub fn metrics(&self) -> &Arc<RpcMetrics> {
        &self.metrics
    }

    pub fn query(&self, params: &VotersParams) -> Result<VotersOutcome, RpcError> {
        let span = info_span!("voters_query", identifier = field::Empty, votes = field::Empty);
        let _enter = span.enter();
        let started = Instant::now();
        self.metrics.voters_queries.inc();

        let result = self.run(params, &span);

        self.metrics
            .query_latency_ms
            .observe(started.elapsed().as_secs_f64() * 1_000.0);
        match &result {
            Ok(VotersOutcome::Found(_)) => {}
            Ok(VotersOutcome::NotFound) => self.metrics.not_found.inc(),
            Err(RpcError::Validation(e)) => {
                self.metrics.validation_failures.inc();
                debug!(error = %e, "voters query rejected");
            }
            Err(e @ RpcError::StoreUnavailable(_)) => {
                self.metrics.store_failures.inc();
                warn!(error = %e, "voters query failed on store");
            }
            Err(e) => warn!(error = %e, "voters query failed"),
        }
        result
    }

    fn run(&self, params: &VotersParams, span: &tracing::Span) -> Result<VotersOutcome, RpcError> {
        let query = self.validator.validate(params)?;
        span.record("identifier", field::debug(&query.identifier));

        let Some(delegate) = self.resolver.resolve(&query.identifier)? else {
            return Ok(VotersOutcome::NotFound);
        };

        let voter_set: Arc<VoterSet> = match &delegate.public_key {
            Some(key) => self.ledger.voters_of(key),
            None => Arc::default(),
        };
        let votes = voter_set.len() as u64;
        span.record("votes", votes);

        let addresses = voter_set.to_vec();
        let accounts = self.store.get_many(&addresses)?;
        if accounts.len() < addresses.len() {
            let found: HashSet<&Address> = accounts.iter().map(|a| &a.address).collect();
            for missing in addresses.iter().filter(|a| !found.contains(a)) {
                warn!(voter = %missing, delegate = %delegate.address, "voter has no account record");
                self.metrics.missing_voters.inc();
            }
        }

        let mut entries: Vec<VoterEntry> = accounts.into_iter().map(VoterEntry::from).collect();
        entries.sort_by(|a, b| compare(query.sort, a, b));
        let voters = query.pagination.apply(entries);

        Ok(VotersOutcome::Found(VotersResponse {
            address: delegate.address,
            public_key: delegate.public_key,
            username: delegate.username,
            balance: delegate.balance,
            votes,
            voters,
        }))
    }
}

/// Order two voters by the requested field. Missing values sort after
/// present ones in ascending order; ties fall back to address ascending.
pub fn compare(sort: Sort, a: &VoterEntry, b: &VoterEntry) -> Ordering {
    let primary = match sort.field {
        SortField::Address => a.address.cmp(&b.address),
        SortField::Username => none_last(
            a.username.as_ref().map(|u| u.as_str()),
            b.username.as_ref().map(|u| u.as_str()),
        ),
        SortField::PublicKey => none_last(a.public_key.as_ref(), b.public_key.as_ref()),
    };
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.address.cmp(&b.address))
}

fn none_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_nullables::NullStore;
    use dpos_store::Account;
    use dpos_types::{Balance, PublicKey, Username, VoteEdge};

    struct Fixture {
        store: Arc<NullStore>,
        ledger: Arc<VoteLedger>,
        service: VoterQueryService<NullStore>,
        delegate: Account,
    }

    fn key(seed: u8) -> PublicKey {
        PublicKey::new([seed; 32])
    }

    fn voter(seed: u8, name: Option<&str>) -> Account {
        let account = Account::from_public_key(key(seed), Balance::new(seed as u64 * 10));
        match name {
            Some(n) => account.with_username(Username::new(n).unwrap()),
            None => account,
        }
    }

    fn fixture() -> Fixture {
        let delegate = voter(1, Some("genesis_1"));
        let voters = [
            voter(2, Some("carol")),
            voter(3, None),
            voter(4, Some("alice")),
            Account::new(Address::from_u64(99), Balance::new(3)),
        ];
        let store = Arc::new(NullStore::with_accounts(
            std::iter::once(delegate.clone()).chain(voters.iter().cloned()),
        ));
        let ledger = Arc::new(VoteLedger::new());
        for (i, v) in voters.iter().enumerate() {
            ledger.apply_vote_edge(&VoteEdge::add(
                v.address.clone(),
                key(1),
                i as u64 + 1,
            ));
        }
        let service =
            VoterQueryService::new(store.clone(), ledger.clone(), Arc::new(RpcMetrics::new()));
        Fixture {
            store,
            ledger,
            service,
            delegate,
        }
    }

    fn by_username(name: &str) -> VotersParams {
        VotersParams {
            username: Some(name.into()),
            ..Default::default()
        }
    }

    fn found(outcome: VotersOutcome) -> VotersResponse {
        match outcome {
            VotersOutcome::Found(r) => r,
            VotersOutcome::NotFound => panic!("expected a delegate"),
        }
    }

    #[test]
    fn returns_delegate_and_all_voters() {
        let f = fixture();
        let r = found(f.service.query(&by_username("genesis_1")).unwrap());

        assert_eq!(r.address, f.delegate.address);
        assert_eq!(r.public_key, Some(key(1)));
        assert_eq!(r.username.as_ref().map(|u| u.as_str()), Some("genesis_1"));
        assert_eq!(r.votes, 4);
        assert_eq!(r.voters.len(), 4);
    }

    #[test]
    fn default_sort_is_public_key_ascending_with_missing_last() {
        let f = fixture();
        let r = found(f.service.query(&by_username("genesis_1")).unwrap());
        let keys: Vec<_> = r.voters.iter().map(|v| v.public_key).collect();
        assert_eq!(keys, vec![Some(key(2)), Some(key(3)), Some(key(4)), None]);
    }

    #[test]
    fn username_sort_both_directions() {
        let f = fixture();
        let names = |sort: &str| -> Vec<Option<String>> {
            let params = VotersParams {
                sort: Some(sort.into()),
                ..by_username("genesis_1")
            };
            found(f.service.query(&params).unwrap())
                .voters
                .into_iter()
                .map(|v| v.username.map(|u| u.as_str().to_string()))
                .collect()
        };

        let asc = names("username:asc");
        assert_eq!(asc[0].as_deref(), Some("alice"));
        assert_eq!(asc[1].as_deref(), Some("carol"));
        assert!(asc[2].is_none() && asc[3].is_none());

        let desc = names("username:desc");
        assert!(desc[0].is_none() && desc[1].is_none());
        assert_eq!(desc[2].as_deref(), Some("carol"));
        assert_eq!(desc[3].as_deref(), Some("alice"));
    }

    #[test]
    fn address_sort_is_strictly_ordered() {
        let f = fixture();
        let params = VotersParams {
            sort: Some("address:desc".into()),
            ..by_username("genesis_1")
        };
        let r = found(f.service.query(&params).unwrap());
        let addresses: Vec<_> = r.voters.iter().map(|v| v.address.clone()).collect();
        let mut expected = addresses.clone();
        expected.sort();
        expected.reverse();
        assert_eq!(addresses, expected);
    }

    #[test]
    fn votes_counts_before_pagination() {
        let f = fixture();
        let params = VotersParams {
            limit: Some("1".into()),
            offset: Some("1".into()),
            ..by_username("genesis_1")
        };
        let r = found(f.service.query(&params).unwrap());
        assert_eq!(r.votes, 4);
        assert_eq!(r.voters.len(), 1);
        assert_eq!(r.voters[0].public_key, Some(key(3)));

        let params = VotersParams {
            limit: Some("0".into()),
            ..by_username("genesis_1")
        };
        let r = found(f.service.query(&params).unwrap());
        assert_eq!(r.votes, 4);
        assert!(r.voters.is_empty());
    }

    #[test]
    fn unknown_identifier_is_not_found() {
        let f = fixture();
        assert_eq!(
            f.service.query(&by_username("nobody")).unwrap(),
            VotersOutcome::NotFound
        );
        let empty_key = VotersParams {
            public_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(f.service.query(&empty_key).unwrap(), VotersOutcome::NotFound);
        assert_eq!(f.service.metrics().not_found.get(), 2);
    }

    #[test]
    fn non_delegate_account_has_no_voters() {
        let f = fixture();
        let params = VotersParams {
            address: Some("99L".into()),
            ..Default::default()
        };
        let r = found(f.service.query(&params).unwrap());
        assert_eq!(r.votes, 0);
        assert!(r.voters.is_empty());
        assert_eq!(r.username, None);
    }

    #[test]
    fn require_delegate_turns_plain_accounts_into_not_found() {
        let f = fixture();
        let strict = VoterQueryService::new(
            f.store.clone(),
            f.ledger.clone(),
            Arc::new(RpcMetrics::new()),
        )
        .require_delegate(true);
        let params = VotersParams {
            address: Some("99L".into()),
            ..Default::default()
        };
        assert_eq!(strict.query(&params).unwrap(), VotersOutcome::NotFound);
    }

    #[test]
    fn missing_voter_accounts_are_omitted_but_counted() {
        let f = fixture();
        f.store.forget_account(&voter(3, None).address);
        let r = found(f.service.query(&by_username("genesis_1")).unwrap());
        assert_eq!(r.votes, 4);
        assert_eq!(r.voters.len(), 3);
        assert_eq!(f.service.metrics().missing_voters.get(), 1);
    }

    #[test]
    fn validation_failure_never_touches_the_store() {
        let f = fixture();
        let err = f.service.query(&VotersParams::default()).unwrap_err();
        assert!(matches!(err, RpcError::Validation(_)));
        assert_eq!(f.store.lookup_count(), 0);
        assert_eq!(f.service.metrics().validation_failures.get(), 1);
    }

    #[test]
    fn store_outage_is_reported_as_unavailable() {
        let f = fixture();
        f.store.set_unavailable(true);
        let err = f.service.query(&by_username("genesis_1")).unwrap_err();
        assert!(matches!(err, RpcError::StoreUnavailable(_)));
        assert_eq!(f.service.metrics().store_failures.get(), 1);
    }

    #[test]
    fn removed_vote_disappears_from_result() {
        let f = fixture();
        f.ledger
            .apply_vote_edge(&VoteEdge::remove(voter(2, None).address, key(1), 50));
        let r = found(f.service.query(&by_username("genesis_1")).unwrap());
        assert_eq!(r.votes, 3);
        assert!(r.voters.iter().all(|v| v.public_key != Some(key(2))));
    }

    #[test]
    fn ties_break_by_address() {
        let a = VoterEntry::from(Account::new(Address::from_u64(2), Balance::ZERO));
        let b = VoterEntry::from(Account::new(Address::from_u64(1), Balance::ZERO));
        let sort = Sort {
            field: SortField::Username,
            order: SortOrder::Desc,
        };
        assert_eq!(compare(sort, &a, &b), Ordering::Greater);
    }
}
