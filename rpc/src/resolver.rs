//! Maps a validated identifier to the delegate's account.

use dpos_store::{Account, AccountStore, StoreError};
use dpos_types::PublicKey;
use std::sync::Arc;
use tracing::debug;

use crate::validation::Identifier;

/// Looks up the account named by an [`Identifier`].
///
/// `Ok(None)` means no account matched; store failures are passed through
/// untouched.
pub struct VoterResolver<S: ?Sized> {
    store: Arc<S>,
    require_delegate: bool,
}

impl<S: AccountStore + ?Sized> VoterResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            require_delegate: false,
        }
    }

    /// Treat accounts without a delegate registration as not found.
    pub fn require_delegate(mut self, require: bool) -> Self {
        self.require_delegate = require;
        self
    }

    pub fn resolve(&self, identifier: &Identifier) -> Result<Option<Account>, StoreError> {
        let account = match identifier {
            Identifier::Address(address) => self.store.get_by_address(address)?,
            Identifier::PublicKey(raw) => match PublicKey::from_hex(raw) {
                Ok(key) => self.store.get_by_public_key(&key)?,
                // Empty or non-canonical (uppercase) text never matches.
                Err(_) => None,
            },
            Identifier::Username(name) => self.store.get_by_username(name)?,
        };

        match account {
            Some(account) if self.require_delegate && !account.is_delegate() => {
                debug!(address = %account.address, "account is not a delegate");
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_nullables::NullStore;
    use dpos_types::{Address, Balance, Username};

    const KEY: [u8; 32] = [0xab; 32];

    fn delegate() -> Account {
        Account::from_public_key(PublicKey::new(KEY), Balance::new(1_000))
            .with_username(Username::new("genesis_1").unwrap())
    }

    fn plain() -> Account {
        Account::new(Address::from_u64(77), Balance::new(5))
    }

    fn resolver(require_delegate: bool) -> (Arc<NullStore>, VoterResolver<NullStore>) {
        let store = Arc::new(NullStore::with_accounts([delegate(), plain()]));
        let resolver = VoterResolver::new(store.clone()).require_delegate(require_delegate);
        (store, resolver)
    }

    #[test]
    fn resolves_by_each_identifier() {
        let (_, r) = resolver(false);
        let d = delegate();
        assert_eq!(
            r.resolve(&Identifier::Address(d.address.clone())).unwrap(),
            Some(d.clone())
        );
        assert_eq!(
            r.resolve(&Identifier::PublicKey(hex::encode(KEY))).unwrap(),
            Some(d.clone())
        );
        assert_eq!(
            r.resolve(&Identifier::Username("GENESIS_1".into())).unwrap(),
            Some(d)
        );
    }

    #[test]
    fn empty_public_key_skips_the_store() {
        let (store, r) = resolver(false);
        assert_eq!(r.resolve(&Identifier::PublicKey(String::new())).unwrap(), None);
        assert_eq!(store.lookup_count(), 0);
    }

    #[test]
    fn uppercase_public_key_does_not_match() {
        let (_, r) = resolver(false);
        let upper = hex::encode(KEY).to_uppercase();
        assert_eq!(r.resolve(&Identifier::PublicKey(upper)).unwrap(), None);
    }

    #[test]
    fn non_delegate_policy() {
        let (_, lenient) = resolver(false);
        let (_, strict) = resolver(true);
        let id = Identifier::Address(plain().address);
        assert_eq!(lenient.resolve(&id).unwrap(), Some(plain()));
        assert_eq!(strict.resolve(&id).unwrap(), None);
    }

    #[test]
    fn store_failure_propagates() {
        let (store, r) = resolver(false);
        store.set_unavailable(true);
        let err = r
            .resolve(&Identifier::Username("genesis_1".into()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
