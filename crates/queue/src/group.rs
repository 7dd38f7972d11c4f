//! Entity queue group
//!
//! Queues are keyed by the entity's required resource. A named key is a
//! prefix: the queue for `stag` serves resources `staging-1`,
//! `staging-2`, and so on. When several non-empty keys are prefixes of the
//! same resource name, the longest one is used.

use crate::Ticket;
use envroute_types::{Entity, RequiredResource};
use std::collections::{BTreeMap, BinaryHeap};
use std::sync::{Arc, Mutex};

/// A queue group shared between concurrent callers of the controller
pub type SharedQueueGroup<T> = Arc<Mutex<EntityQueueGroup<T>>>;

/// Read-only view of one non-empty queue
#[derive(Debug)]
pub struct QueueRef<'a, T> {
    key: &'a RequiredResource,
    heap: &'a BinaryHeap<Ticket<T>>,
}

impl<'a, T> QueueRef<'a, T> {
    #[must_use]
    pub fn key(&self) -> &'a RequiredResource {
        self.key
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The entity that would be served next
    #[must_use]
    pub fn peek(&self) -> Option<&'a Entity<T>> {
        self.heap.peek().map(Ticket::entity)
    }

    /// Entities in serving order
    #[must_use]
    pub fn sorted(&self) -> Vec<&'a Entity<T>> {
        let mut tickets: Vec<&Ticket<T>> = self.heap.iter().collect();
        // Heap order is reversed: greatest is served first
        tickets.sort_by(|a, b| b.cmp(a));
        tickets.into_iter().map(Ticket::entity).collect()
    }
}

/// Priority queues of pending entities, one per required resource
#[derive(Debug)]
pub struct EntityQueueGroup<T> {
    queues: BTreeMap<RequiredResource, BinaryHeap<Ticket<T>>>,
    next_sequence: u64,
}

impl<T> Default for EntityQueueGroup<T> {
    fn default() -> Self {
        Self {
            queues: BTreeMap::new(),
            next_sequence: 0,
        }
    }
}

impl<T> EntityQueueGroup<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the group for sharing between callers
    #[must_use]
    pub fn shared(self) -> SharedQueueGroup<T> {
        Arc::new(Mutex::new(self))
    }

    /// Queue an entity under its required resource
    pub fn add(&mut self, entity: Entity<T>) {
        let ticket = Ticket::new(self.next_sequence, entity);
        self.next_sequence += 1;
        self.restore(ticket);
    }

    pub fn add_all(&mut self, entities: impl IntoIterator<Item = Entity<T>>) {
        for entity in entities {
            self.add(entity);
        }
    }

    /// Put a polled ticket back, keeping its original queue position
    pub fn restore(&mut self, ticket: Ticket<T>) {
        self.queues
            .entry(ticket.entity().required().clone())
            .or_default()
            .push(ticket);
    }

    /// Number of queued entities across all queues
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.queues.values().map(BinaryHeap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_size() == 0
    }

    /// Exact-key lookup of a non-empty queue
    #[must_use]
    pub fn queue(&self, key: &RequiredResource) -> Option<QueueRef<'_, T>> {
        self.queues
            .get_key_value(key)
            .filter(|(_, heap)| !heap.is_empty())
            .map(|(key, heap)| QueueRef { key, heap })
    }

    /// The non-empty named queue serving `resource_name`
    ///
    /// Picks the longest key that is a prefix of the lower-cased name.
    #[must_use]
    pub fn queue_for(&self, resource_name: &str) -> Option<QueueRef<'_, T>> {
        let key = self.key_for(resource_name)?;
        self.queue(&key)
    }

    /// The non-empty wildcard queue
    #[must_use]
    pub fn wildcard_queue(&self) -> Option<QueueRef<'_, T>> {
        self.queue(&RequiredResource::Any)
    }

    /// Take the next entity for `resource_name`
    ///
    /// Looks at the named queue and the wildcard queue; the named head wins
    /// unless the wildcard head has a strictly lower priority value.
    pub fn poll(&mut self, resource_name: &str) -> Option<Entity<T>> {
        self.poll_ticket(resource_name).map(Ticket::into_entity)
    }

    /// Like [`poll`](Self::poll) but keeps the queue position for [`restore`](Self::restore)
    pub fn poll_ticket(&mut self, resource_name: &str) -> Option<Ticket<T>> {
        tracing::trace!(resource = resource_name, "Polling entity");

        let named = self.key_for(resource_name);
        let named_head = named
            .as_ref()
            .and_then(|key| self.queues.get(key))
            .and_then(BinaryHeap::peek)
            .map(Ticket::priority);
        let any_head = self
            .queues
            .get(&RequiredResource::Any)
            .and_then(BinaryHeap::peek)
            .map(Ticket::priority);

        let key = match (named, named_head, any_head) {
            (Some(key), Some(named), Some(any)) if named <= any => key,
            (_, _, Some(_)) => RequiredResource::Any,
            (Some(key), Some(_), None) => key,
            _ => {
                tracing::trace!(resource = resource_name, "No entity for resource");
                return None;
            }
        };

        let ticket = self.queues.get_mut(&key).and_then(BinaryHeap::pop);
        if let Some(ticket) = &ticket {
            tracing::debug!(
                resource = resource_name,
                queue = %key,
                priority = %ticket.priority(),
                "Entity taken from queue"
            );
        }
        ticket
    }

    /// Pop the head of the queue with exactly this key
    pub fn pop(&mut self, key: &RequiredResource) -> Option<Entity<T>> {
        self.queues
            .get_mut(key)
            .and_then(BinaryHeap::pop)
            .map(Ticket::into_entity)
    }

    /// Non-empty named queues that no known resource can serve
    ///
    /// `known_names` are lower-cased resource names. Queues come back in key
    /// order.
    #[must_use]
    pub fn undefined_queues<S: AsRef<str>>(&self, known_names: &[S]) -> Vec<QueueRef<'_, T>> {
        self.queues
            .iter()
            .filter(|(_, heap)| !heap.is_empty())
            .filter(|(key, _)| match key {
                RequiredResource::Any => false,
                RequiredResource::Named(_) => {
                    !known_names.iter().any(|name| key.matches(name.as_ref()))
                }
            })
            .map(|(key, heap)| QueueRef { key, heap })
            .collect()
    }

    /// Every queued entity, queue by queue in serving order
    #[must_use]
    pub fn pending(&self) -> Vec<&Entity<T>> {
        self.queues
            .iter()
            .filter(|(_, heap)| !heap.is_empty())
            .flat_map(|(key, heap)| QueueRef { key, heap }.sorted())
            .collect()
    }

    fn key_for(&self, resource_name: &str) -> Option<RequiredResource> {
        self.queues
            .iter()
            .filter(|(key, heap)| !key.is_any() && !heap.is_empty() && key.matches(resource_name))
            .max_by_key(|(key, _)| match key {
                RequiredResource::Named(prefix) => prefix.len(),
                RequiredResource::Any => 0,
            })
            .map(|(key, _)| key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entity(name: &'static str, required: &str, priority: i32) -> Entity<&'static str> {
        Entity::new(name, RequiredResource::parse(required)).with_priority(priority)
    }

    fn names(group: &mut EntityQueueGroup<&'static str>, resource: &str) -> Vec<&'static str> {
        std::iter::from_fn(|| group.poll(resource))
            .map(Entity::into_payload)
            .collect()
    }

    #[test]
    fn empty_group_polls_nothing() {
        let mut group: EntityQueueGroup<&str> = EntityQueueGroup::new();
        assert_eq!(group.total_size(), 0);
        assert!(group.poll("qa").is_none());
        assert!(group.queue_for("qa").is_none());
        assert!(group.wildcard_queue().is_none());
    }

    #[test]
    fn add_creates_queue_per_required_name() {
        let mut group = EntityQueueGroup::new();
        group.add_all([
            entity("a", "qa", 1),
            entity("b", "QA", 2),
            entity("c", "any", 3),
            entity("d", "staging", 4),
        ]);

        assert_eq!(group.total_size(), 4);
        assert_eq!(group.queue_for("qa").map(|q| q.len()), Some(2));
        assert_eq!(group.wildcard_queue().map(|q| q.len()), Some(1));
        assert_eq!(
            group.queue_for("staging-2").map(|q| q.key().to_string()),
            Some("staging".to_string())
        );
    }

    #[test]
    fn lower_priority_value_is_served_first() {
        let mut group = EntityQueueGroup::new();
        group.add(entity("late", "qa", 9));
        group.add(entity("early", "qa", 1));
        assert_eq!(names(&mut group, "qa"), vec!["early", "late"]);
    }

    #[test]
    fn equal_priorities_are_fifo() {
        let mut group = EntityQueueGroup::new();
        group.add_all([
            entity("first", "qa", 2),
            entity("second", "qa", 2),
            entity("third", "qa", 2),
        ]);
        assert_eq!(names(&mut group, "qa"), vec!["first", "second", "third"]);
    }

    #[test]
    fn named_queue_wins_ties_with_wildcard() {
        let mut group = EntityQueueGroup::new();
        group.add(entity("wild", "any", 1));
        group.add(entity("named", "qa", 1));
        assert_eq!(names(&mut group, "qa"), vec!["named", "wild"]);
    }

    #[test]
    fn wildcard_wins_with_strictly_lower_priority() {
        let mut group = EntityQueueGroup::new();
        group.add(entity("named", "qa", 5));
        group.add(entity("wild", "any", 1));
        assert_eq!(names(&mut group, "qa"), vec!["wild", "named"]);
    }

    #[test]
    fn only_wildcard_serves_unrelated_resource() {
        let mut group = EntityQueueGroup::new();
        group.add(entity("named", "qa", 1));
        group.add(entity("wild", "any", 5));
        assert_eq!(names(&mut group, "prod"), vec!["wild"]);
        assert_eq!(group.total_size(), 1);
    }

    #[test]
    fn longest_prefix_is_chosen() {
        let mut group = EntityQueueGroup::new();
        group.add(entity("short", "stag", 1));
        group.add(entity("long", "staging-eu", 1));

        assert_eq!(
            group.poll("Staging-EU-1").map(Entity::into_payload),
            Some("long")
        );
        // The longer queue is empty now, so the shorter prefix serves
        assert_eq!(
            group.poll("staging-eu-1").map(Entity::into_payload),
            Some("short")
        );
    }

    #[test]
    fn wildcard_key_is_not_a_prefix_of_named_resources() {
        let mut group = EntityQueueGroup::new();
        group.add(entity("wild", "any", 1));
        assert!(group.queue_for("anything").is_none());
        assert_eq!(
            group.poll("anything").map(Entity::into_payload),
            Some("wild")
        );
    }

    #[test]
    fn restored_ticket_keeps_its_place() {
        let mut group = EntityQueueGroup::new();
        group.add_all([entity("first", "qa", 1), entity("second", "qa", 1)]);

        let ticket = group.poll_ticket("qa").unwrap();
        assert_eq!(*ticket.entity().payload(), "first");
        group.restore(ticket);

        assert_eq!(names(&mut group, "qa"), vec!["first", "second"]);
    }

    #[test]
    fn undefined_queues_skip_wildcard_and_known_prefixes() {
        let mut group = EntityQueueGroup::new();
        group.add_all([
            entity("a", "zeta", 1),
            entity("b", "stag", 1),
            entity("c", "any", 1),
            entity("d", "alpha", 1),
        ]);

        let undefined = group.undefined_queues(&["staging-1", "qa"]);
        let keys: Vec<_> = undefined.iter().map(|q| q.key().to_string()).collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn undefined_queue_can_be_drained() {
        let mut group = EntityQueueGroup::new();
        group.add(entity("lost", "zeta", 1));

        let key = group.undefined_queues(&["qa"])[0].key().clone();
        assert_eq!(group.pop(&key).map(Entity::into_payload), Some("lost"));
        assert!(group.undefined_queues(&["qa"]).is_empty());
        assert_eq!(group.total_size(), 0);
    }

    #[test]
    fn pending_lists_every_entity() {
        let mut group = EntityQueueGroup::new();
        group.add_all([
            entity("q2", "qa", 2),
            entity("q1", "qa", 1),
            entity("w", "any", 1),
        ]);
        let pending: Vec<_> = group.pending().into_iter().map(|e| *e.payload()).collect();
        assert_eq!(pending, vec!["w", "q1", "q2"]);
    }

    proptest! {
        #[test]
        fn poll_is_ordered_regardless_of_insertion(priorities in prop::collection::vec(-50i32..50, 1..40)) {
            let mut group = EntityQueueGroup::new();
            for (i, p) in priorities.iter().enumerate() {
                group.add(Entity::new(i, RequiredResource::parse("qa")).with_priority(*p));
            }

            let polled: Vec<(i32, usize)> = std::iter::from_fn(|| group.poll("qa"))
                .map(|e| (e.priority().value(), *e.payload()))
                .collect();

            let mut expected: Vec<(i32, usize)> = priorities
                .iter()
                .enumerate()
                .map(|(i, p)| (*p, i))
                .collect();
            expected.sort_unstable();
            prop_assert_eq!(polled, expected);
        }
    }
}
