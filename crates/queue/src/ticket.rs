//! Heap entries

use envroute_types::{Entity, Priority};
use std::cmp::Ordering;

/// An entity together with the sequence number it was queued with
///
/// Tickets order by priority, then by sequence, so that `BinaryHeap`
/// (a max-heap) pops the lowest priority value first and breaks ties
/// first-in first-out. A ticket put back into its group keeps its
/// original place.
#[derive(Debug, Clone)]
pub struct Ticket<T> {
    sequence: u64,
    entity: Entity<T>,
}

impl<T> Ticket<T> {
    pub(crate) fn new(sequence: u64, entity: Entity<T>) -> Self {
        Self { sequence, entity }
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.entity.priority()
    }

    #[must_use]
    pub fn entity(&self) -> &Entity<T> {
        &self.entity
    }

    #[must_use]
    pub fn into_entity(self) -> Entity<T> {
        self.entity
    }
}

impl<T> PartialEq for Ticket<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ticket<T> {}

impl<T> PartialOrd for Ticket<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ticket<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the "largest" ticket is the one served first
        other
            .priority()
            .cmp(&self.priority())
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
