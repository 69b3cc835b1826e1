//! Lazy filtered iteration over a snapshot of chunks.

use super::Chunk;

/// Iterator yielding clones of the records that satisfy a predicate.
///
/// Owns its chunk handles, so it stays valid after the lock that produced the
/// snapshot is released and keeps seeing that dataset even if a reload
/// happens meanwhile.
pub struct Matches<T, P> {
    chunks: std::vec::IntoIter<Chunk<T>>,
    current: Option<Chunk<T>>,
    position: usize,
    predicate: P,
}

impl<T, P> Matches<T, P>
where
    P: FnMut(&T) -> bool,
{
    pub(crate) fn new(chunks: Vec<Chunk<T>>, predicate: P) -> Self {
        Self {
            chunks: chunks.into_iter(),
            current: None,
            position: 0,
            predicate,
        }
    }
}

impl<T, P> Iterator for Matches<T, P>
where
    T: Clone,
    P: FnMut(&T) -> bool,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(chunk) = &self.current {
                while self.position < chunk.len() {
                    let record = &chunk[self.position];
                    self.position += 1;
                    if (self.predicate)(record) {
                        return Some(record.clone());
                    }
                }
            }
            self.current = Some(self.chunks.next()?);
            self.position = 0;
        }
    }
}
