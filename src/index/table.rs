//! Flat id-keyed table.

use std::sync::Arc;

use super::{Chunk, Keyed, Matches};

/// Chunked table of records looked up by integer id.
///
/// Lookups scan chunks in insertion order and return the first record with a
/// matching key; duplicate ids are not rejected.
pub struct LookupTable<T> {
    chunks: Vec<Chunk<T>>,
    len: usize,
}

impl<T> Default for LookupTable<T> {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }
}

impl<T: Keyed> LookupTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, records: Vec<T>) {
        if records.is_empty() {
            return;
        }
        self.len += records.len();
        self.chunks.push(Arc::from(records));
    }

    pub fn get(&self, key: u32) -> Option<&T> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.iter())
            .find(|record| record.key() == key)
    }

    pub fn filter<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a T> + 'a
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.iter())
            .filter(move |record| predicate(record))
    }

    pub fn snapshot(&self) -> Vec<Chunk<T>> {
        self.chunks.clone()
    }

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

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Place {
        id: u32,
        name: &'static str,
    }

    impl Keyed for Place {
        fn key(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn test_get_across_chunks() {
        let mut table = LookupTable::new();
        table.add(vec![Place { id: 1, name: "Paris" }]);
        table.add(vec![Place { id: 2, name: "Lyon" }, Place { id: 3, name: "Nice" }]);

        assert_eq!(table.get(3).map(|p| p.name), Some("Nice"));
        assert_eq!(table.get(4), None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_duplicate_id_returns_first() {
        let mut table = LookupTable::new();
        table.add(vec![Place { id: 7, name: "first" }]);
        table.add(vec![Place { id: 7, name: "second" }]);
        assert_eq!(table.get(7).map(|p| p.name), Some("first"));
    }

    #[test]
    fn test_clear_and_matches() {
        let mut table = LookupTable::new();
        table.add(vec![Place { id: 1, name: "a" }, Place { id: 2, name: "b" }]);
        let evens: Vec<u32> = table.matches(|p| p.id % 2 == 0).map(|p| p.id).collect();
        assert_eq!(evens, vec![2]);

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.get(1), None);
        assert_eq!(table.filter(|_| true).count(), 0);
    }
}
