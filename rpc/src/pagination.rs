//! Offset-based pagination for list endpoints.

/// Default maximum page size accepted for `limit`.
pub const MAX_LIMIT: u64 = 100;

/// Offset and optional limit applied to an already sorted list.
///
/// An absent limit returns everything from `offset` onwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OffsetPagination {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl OffsetPagination {
    pub fn new(offset: u64, limit: Option<u64>) -> Self {
        Self { offset, limit }
    }

    /// Keep the window `[offset, offset + limit)` of `items`.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = self
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_limit_returns_everything_after_offset() {
        let page = OffsetPagination::new(2, None).apply(vec![1, 2, 3, 4, 5]);
        assert_eq!(page, vec![3, 4, 5]);
    }

    #[test]
    fn zero_limit_is_empty() {
        assert!(OffsetPagination::new(0, Some(0)).apply(vec![1, 2]).is_empty());
    }

    #[test]
    fn offset_past_end_is_empty() {
        assert!(OffsetPagination::new(10, Some(5)).apply(vec![1, 2]).is_empty());
        assert!(OffsetPagination::new(u64::MAX, None).apply(vec![1]).is_empty());
    }

    proptest! {
        #[test]
        fn page_is_a_contiguous_window(
            len in 0usize..50,
            offset in 0u64..60,
            limit in proptest::option::of(0u64..60),
        ) {
            let items: Vec<usize> = (0..len).collect();
            let page = OffsetPagination::new(offset, limit).apply(items);

            let start = (offset as usize).min(len);
            let end = match limit {
                Some(l) => (start + l as usize).min(len),
                None => len,
            };
            prop_assert_eq!(page, (start..end).collect::<Vec<_>>());
        }
    }
}
