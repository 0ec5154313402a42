use std::collections::VecDeque;

use super::record::{MetricCategory, MetricRecord};

/// Fixed-capacity, insertion-ordered record store with FIFO eviction
#[derive(Debug)]
pub struct MetricBuffer {
    capacity: usize,
    records: VecDeque<MetricRecord>,
}

impl MetricBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a record, dropping the oldest ones so at most `capacity` remain.
    /// Returns how many records were evicted.
    pub fn push(&mut self, record: MetricRecord) -> usize {
        self.records.push_back(record);
        let overflow = self.records.len().saturating_sub(self.capacity);
        self.records.drain(..overflow);
        overflow
    }

    /// Owned copy of the records, optionally filtered by category, in insertion order
    pub fn snapshot(&self, category: Option<MetricCategory>) -> Vec<MetricRecord> {
        match category {
            Some(category) => self
                .records
                .iter()
                .filter(|r| r.category() == category)
                .cloned()
                .collect(),
            None => self.records.iter().cloned().collect(),
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MetricRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
