use alloc::vec;
use alloc::vec::Vec;
use core::num::NonZeroUsize;

use super::Reading;

/// Fixed-capacity circular history of committed readings.
///
/// Storage is allocated once at construction and overwritten in place
/// forever; once full, every commit replaces the oldest slot. The sample
/// committed `k` buckets ago lives at `(cursor - 1 - k) mod capacity`.
///
/// Nothing here knows how long a bucket is. See [`crate::config::TimeBase`]
/// for the mapping from wall-clock offsets to bucket offsets.
#[derive(Debug)]
pub struct RingBufferStore {
    /// Zero-filled at startup, written only by [`RingBufferStore::commit`]
    slots: Vec<Reading>,
    /// Index of the next slot to be written
    cursor: usize,
    /// Number of commits since startup
    total_writes: u64,
}

impl RingBufferStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![Reading::default(); capacity.get()],
            cursor: 0,
            total_writes: 0,
        }
    }

    /// Write one reading at the cursor and advance it. O(1), never fails.
    pub fn commit(&mut self, reading: Reading) {
        self.slots[self.cursor] = reading;
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.total_writes += 1;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn total_writes(&self) -> u64 {
        self.total_writes
    }

    /// Number of readable samples, `min(total_writes, capacity)`.
    pub fn available(&self) -> usize {
        if self.total_writes >= self.slots.len() as u64 {
            self.slots.len()
        } else {
            self.total_writes as usize
        }
    }

    /// The most recent commit, if any.
    pub fn latest(&self) -> Option<Reading> {
        self.read_lag(0)
    }

    /// The reading committed exactly `lag` buckets before the latest one.
    ///
    /// Returns `None` while fewer than `lag + 1` commits have happened, and
    /// for lags the buffer is too small to still hold.
    pub fn read_lag(&self, lag: usize) -> Option<Reading> {
        if lag >= self.available() {
            return None;
        }
        let capacity = self.slots.len();
        let index = (self.cursor + capacity - 1 - lag) % capacity;
        Some(self.slots[index])
    }

    /// The most recent `min(n, available)` readings, oldest first.
    pub fn read_window(&self, n: usize) -> impl ExactSizeIterator<Item = Reading> + '_ {
        let count = n.min(self.available());
        let capacity = self.slots.len();
        let start = (self.cursor + capacity - count) % capacity;
        (0..count).map(move |i| self.slots[(start + i) % capacity])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn store(capacity: usize) -> RingBufferStore {
        RingBufferStore::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn temp(celsius: i32) -> Reading {
        Reading::new(celsius * 1000, 50_000 + celsius * 100)
    }

    fn window_temps(store: &RingBufferStore, n: usize) -> Vec<i32> {
        store
            .read_window(n)
            .map(|r| r.temperature_milli_celsius / 1000)
            .collect()
    }

    #[test]
    fn test_empty_store_reports_nothing_available() {
        let store = store(4);
        assert_eq!(store.available(), 0);
        assert_eq!(store.latest(), None);
        assert_eq!(store.read_lag(0), None);
        assert_eq!(store.read_window(4).len(), 0);
    }

    #[test]
    fn test_zero_valued_reading_is_not_confused_with_absence() {
        let mut store = store(4);
        store.commit(Reading::new(0, 0));
        assert_eq!(store.read_lag(0), Some(Reading::new(0, 0)));
        assert_eq!(store.read_lag(1), None);
    }

    #[test]
    fn test_wraparound_example() {
        let mut store = store(4);
        for celsius in [10, 11, 12, 13, 14] {
            store.commit(temp(celsius));
        }

        assert_eq!(window_temps(&store, 4), [11, 12, 13, 14]);
        assert_eq!(store.read_lag(0), Some(temp(14)));
        assert_eq!(store.read_lag(3), Some(temp(11)));
        assert_eq!(store.read_lag(4), None);
        assert_eq!(store.total_writes(), 5);
    }

    #[test]
    fn test_window_after_many_wraps_is_chronological() {
        let capacity = 7;
        for extra in [0, 1, 6, 7, 20] {
            let mut store = store(capacity);
            let total = capacity + extra;
            for i in 0..total as i32 {
                store.commit(temp(i));
            }

            let expected: Vec<i32> = ((total - capacity) as i32..total as i32).collect();
            assert_eq!(window_temps(&store, capacity), expected, "extra = {}", extra);
            assert_eq!(store.read_lag(0), Some(temp(total as i32 - 1)));
        }
    }

    #[test]
    fn test_window_shorter_than_available() {
        let mut store = store(8);
        for i in 0..5 {
            store.commit(temp(i));
        }
        assert_eq!(window_temps(&store, 2), [3, 4]);
        assert_eq!(window_temps(&store, 100), [0, 1, 2, 3, 4]);
        assert_eq!(window_temps(&store, 0), Vec::<i32>::new());
    }

    #[test]
    fn test_lag_becomes_available_on_exact_commit() {
        let mut store = store(16);
        let lag = 5;
        for i in 0..=lag as i32 {
            assert_eq!(store.read_lag(lag), None, "total_writes = {}", store.total_writes());
            store.commit(temp(i));
        }
        assert_eq!(store.total_writes(), lag as u64 + 1);
        assert_eq!(store.read_lag(lag), Some(temp(0)));
    }

    #[test]
    fn test_channels_stay_paired() {
        let mut store = store(3);
        for i in 0..10 {
            store.commit(Reading::new(i, -i));
        }
        for reading in store.read_window(3) {
            assert_eq!(reading.humidity_milli_percent, -reading.temperature_milli_celsius);
        }
    }
}
