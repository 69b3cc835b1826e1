//! Chunked range index.

use std::sync::Arc;

use super::{Chunk, Matches, Ranged};

/// Ordered collection of chunks of ranged records.
///
/// Each chunk must be sorted ascending by `begin` with no overlapping
/// ranges; this comes from the source data and is not re-validated. A query
/// first checks each chunk's envelope (`first.begin ..= last.end`) in
/// insertion order, then searches the first chunk whose envelope matches.
/// When envelopes overlap (which sorted, non-overlapping input never
/// produces) the earliest chunk wins.
pub struct RangeIndex<T> {
    chunks: Vec<Chunk<T>>,
    len: usize,
}

impl<T> Default for RangeIndex<T> {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }
}

impl<T: Ranged> RangeIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one pre-sorted batch as a chunk. Empty batches are ignored.
    pub fn add(&mut self, records: Vec<T>) {
        if records.is_empty() {
            return;
        }
        self.len += records.len();
        self.chunks.push(Arc::from(records));
    }

    /// Returns the record whose range contains `ordinal`.
    pub fn query(&self, ordinal: u128) -> Option<&T> {
        let chunk = self.chunks.iter().find(|chunk| envelope_contains(chunk, ordinal))?;

        // Last record starting at or before the ordinal is the only candidate.
        let after = chunk.partition_point(|record| record.range().begin <= ordinal);
        let candidate = chunk.get(after.checked_sub(1)?)?;
        candidate.range().contains(ordinal).then_some(candidate)
    }

    /// Lazily yields every record matching `predicate`, in insertion order.
    pub fn filter<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a T> + 'a
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.iter())
            .filter(move |record| predicate(record))
    }

    /// Shares the current chunks, for iteration after a lock is released.
    pub fn snapshot(&self) -> Vec<Chunk<T>> {
        self.chunks.clone()
    }

    /// Owned, lazy filtered view of the current chunks.
    pub fn matches<P>(&self, predicate: P) -> Matches<T, P>
    where
        P: FnMut(&T) -> bool,
    {
        Matches::new(self.snapshot(), predicate)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

fn envelope_contains<T: Ranged>(chunk: &[T], ordinal: u128) -> bool {
    match (chunk.first(), chunk.last()) {
        (Some(first), Some(last)) => first.range().begin <= ordinal && ordinal <= last.range().end,
        _ => false,
    }
}
