//! RowIndex - prefix sums and reverse lookup over per-section row counts
//!
//! Built once per projection from the section counts; queries are answered
//! from a Fenwick tree.
//!
//! # Complexity
//!
//! - `from_counts`: O(n log n)
//! - `prefix_sum`: O(log n)
//! - `lower_bound`: O(log² n)
//! - `total`: O(log n)
//! - `len`: O(1)

/// Fenwick tree over a fixed number of non-negative counts.
///
/// Entry `i` owns the half-open range `[start(i), prefix_sum(i))` of a
/// flat index space. Entries with a count of zero own no index at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIndex {
    /// Fenwick tree storage, one slot per entry (0-indexed API).
    tree: Vec<isize>,
}

impl RowIndex {
    /// Builds an index holding `counts` in order.
    ///
    /// ```
    /// # use pipelog::view_state::row_index::RowIndex;
    /// let index = RowIndex::from_counts(&[3, 0, 2]);
    /// assert_eq!(index.len(), 3);
    /// assert_eq!(index.total(), 5);
    /// ```
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut tree = vec![0; counts.len()];
        for (index, &count) in counts.iter().enumerate() {
            if count > 0 {
                fenwick::array::update(&mut tree, index, count as isize);
            }
        }
        Self { tree }
    }

    /// Sum of counts up to and including `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// ```
    /// # use pipelog::view_state::row_index::RowIndex;
    /// let index = RowIndex::from_counts(&[3, 4, 5]);
    /// assert_eq!(index.prefix_sum(0), 3);
    /// assert_eq!(index.prefix_sum(1), 7);
    /// assert_eq!(index.prefix_sum(2), 12);
    /// ```
    pub fn prefix_sum(&self, index: usize) -> usize {
        assert!(
            index < self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );
        fenwick::array::prefix_sum(&self.tree, index).max(0) as usize
    }

    /// First flat index owned by entry `index`.
    pub fn start(&self, index: usize) -> usize {
        if index == 0 {
            0
        } else {
            self.prefix_sum(index - 1)
        }
    }

    /// First entry whose `prefix_sum` exceeds `value`: the entry owning flat
    /// index `value`.
    ///
    /// Returns `None` when `value >= total()`.
    ///
    /// ```
    /// # use pipelog::view_state::row_index::RowIndex;
    /// let index = RowIndex::from_counts(&[10, 0, 20]);
    /// assert_eq!(index.lower_bound(0), Some(0));
    /// assert_eq!(index.lower_bound(9), Some(0));
    /// assert_eq!(index.lower_bound(10), Some(2));
    /// assert_eq!(index.lower_bound(30), None);
    /// ```
    pub fn lower_bound(&self, value: usize) -> Option<usize> {
        let mut left = 0;
        let mut right = self.len();

        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > value {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.len()).then_some(left)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.prefix_sum(self.len() - 1)
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
