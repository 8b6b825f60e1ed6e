//! "Sample taken K buckets ago" lookups over the ring buffer.

use heapless::Vec;

use super::{Reading, RingBufferStore};

/// Upper bound on the number of lag offsets tracked at once.
pub const MAX_LAG_OFFSETS: usize = 8;

/// One lag lookup: the offset in buckets and the reading found there, or
/// `None` while the history is not yet deep enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagEntry {
    pub buckets: u32,
    pub reading: Option<Reading>,
}

/// Lag lookups for every configured offset, ascending by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LagSnapshot {
    entries: Vec<LagEntry, MAX_LAG_OFFSETS>,
}

impl LagSnapshot {
    /// Evaluate each offset independently against the current store.
    ///
    /// Offsets beyond [`MAX_LAG_OFFSETS`] are ignored; configuration
    /// validation rejects such lists up front.
    pub fn compute(store: &RingBufferStore, offsets: &[u32]) -> Self {
        let mut entries: Vec<LagEntry, MAX_LAG_OFFSETS> = Vec::new();
        for &buckets in offsets.iter().take(MAX_LAG_OFFSETS) {
            let reading = store.read_lag(buckets as usize);
            let _ = entries.push(LagEntry { buckets, reading });
        }
        entries.sort_unstable_by_key(|entry| entry.buckets);
        Self { entries }
    }

    pub fn entries(&self) -> &[LagEntry] {
        &self.entries
    }

    pub fn get(&self, buckets: u32) -> Option<Reading> {
        self.entries
            .iter()
            .find(|entry| entry.buckets == buckets)
            .and_then(|entry| entry.reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::num::NonZeroUsize;

    fn filled_store(commits: i32) -> RingBufferStore {
        let mut store = RingBufferStore::new(NonZeroUsize::new(61).unwrap());
        for i in 0..commits {
            store.commit(Reading::new(i * 1000, i * 500));
        }
        store
    }

    #[test]
    fn test_offsets_unavailable_until_history_is_deep_enough() {
        let store = filled_store(11);
        let snapshot = LagSnapshot::compute(&store, &[5, 10, 30, 60]);

        assert_eq!(snapshot.get(5), Some(Reading::new(5_000, 2_500)));
        assert_eq!(snapshot.get(10), Some(Reading::new(0, 0)));
        assert_eq!(snapshot.get(30), None);
        assert_eq!(snapshot.get(60), None);
    }

    #[test]
    fn test_entries_sorted_ascending() {
        let store = filled_store(100);
        let snapshot = LagSnapshot::compute(&store, &[60, 5, 30, 10]);
        let offsets: [u32; 4] = core::array::from_fn(|i| snapshot.entries()[i].buckets);

        assert_eq!(offsets, [5, 10, 30, 60]);
        assert!(snapshot.entries().iter().all(|entry| entry.reading.is_some()));
        assert_eq!(snapshot.get(60), Some(Reading::new(39_000, 19_500)));
    }

    #[test]
    fn test_empty_store_gives_placeholders_not_zero() {
        let store = filled_store(0);
        let snapshot = LagSnapshot::compute(&store, &[0, 5]);
        assert_eq!(snapshot.entries().len(), 2);
        assert!(snapshot.entries().iter().all(|entry| entry.reading.is_none()));
    }
}
