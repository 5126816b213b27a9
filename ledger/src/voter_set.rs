//! Immutable voter set snapshot.

use dpos_types::Address;
use std::collections::BTreeSet;

/// The addresses voting for one delegate at a point in time.
///
/// A `VoterSet` is never mutated after it is published: the ledger builds a
/// fresh one from its working set when a reader asks after a change. The vote count of a delegate is always `len()` of the
/// snapshot a reader holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoterSet {
    voters: BTreeSet<Address>,
}

impl VoterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn contains(&self, voter: &Address) -> bool {
        self.voters.contains(voter)
    }

    /// Voters in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.voters.iter()
    }

    pub fn to_vec(&self) -> Vec<Address> {
        self.voters.iter().cloned().collect()
    }
}

impl From<BTreeSet<Address>> for VoterSet {
    fn from(voters: BTreeSet<Address>) -> Self {
        Self { voters }
    }
}

impl FromIterator<Address> for VoterSet {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            voters: iter.into_iter().collect(),
        }
    }
}
