use std::cmp::Ordering;

/// Heap key for time-ordered queues.
///
/// Ordered by due time, then by insertion sequence, so entries that compute the
/// same due time stay distinct and fire in subscription order.
#[derive(Debug, Copy, Clone)]
pub(crate) struct DueKey {
    pub(crate) due: f64,
    pub(crate) seq: u64,
}

impl PartialEq for DueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DueKey {}

impl PartialOrd for DueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .total_cmp(&other.due)
            .then(self.seq.cmp(&other.seq))
    }
}
