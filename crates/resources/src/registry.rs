//! Slot accounting for the fixed set of resources
//!
//! The registry itself is not synchronised: the lock controller keeps it
//! behind the same mutex that guards the matching algorithm, so every
//! mutation here happens inside that critical section.

use envroute_errors::{Error, LockError};
use envroute_types::Resource;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Occupancy of a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Shared locks; `free` slots are left out of the capacity
    Shared { free: usize },
    /// Hard-locked: the whole capacity belongs to one owner
    Exclusive,
}

#[derive(Debug)]
struct Slot {
    resource: Arc<Resource>,
    state: SlotState,
}

impl Slot {
    fn idle(resource: Resource) -> Self {
        let free = resource.capacity();
        Self {
            resource: Arc::new(resource),
            state: SlotState::Shared { free },
        }
    }

    fn capacity(&self) -> usize {
        self.resource.capacity()
    }

    fn is_available(&self) -> bool {
        matches!(self.state, SlotState::Shared { free } if free > 0)
    }
}

/// Registry of resources keyed by lower-cased name
///
/// Iteration order is the name order, which gives `list_available` its
/// deterministic order.
#[derive(Debug)]
pub struct ResourceRegistry {
    slots: BTreeMap<String, Slot>,
}

impl ResourceRegistry {
    /// Create a registry with every resource idle
    ///
    /// # Errors
    ///
    /// Returns an error if `resources` is empty or contains two resources
    /// whose names differ only by case.
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Result<Self, Error> {
        let mut slots = BTreeMap::new();
        for resource in resources {
            let key = resource.key();
            if slots.contains_key(&key) {
                return Err(LockError::InvalidArgument {
                    message: format!("duplicate resource name: {}", resource.name()),
                }
                .into());
            }
            slots.insert(key, Slot::idle(resource));
        }

        if slots.is_empty() {
            return Err(LockError::InvalidArgument {
                message: "a registry needs at least one resource".to_string(),
            }
            .into());
        }

        tracing::debug!(resources = slots.len(), "Created resource registry");
        Ok(Self { slots })
    }

    /// Create a registry of plain resources sharing one capacity
    ///
    /// # Errors
    ///
    /// Returns an error if a name is blank, the capacity is zero, or the
    /// set is empty or contains duplicates.
    pub fn from_names<S: AsRef<str>>(names: &[S], capacity: usize) -> Result<Self, Error> {
        let resources = names
            .iter()
            .map(|name| Resource::new(name.as_ref(), capacity))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(resources)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lower-cased names of every resource, in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn resources(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.slots.values().map(|slot| &slot.resource)
    }

    /// Case-insensitive lookup by exact name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Resource>> {
        self.slots.get(&name.to_lowercase()).map(|slot| &slot.resource)
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<SlotState> {
        self.slots.get(&name.to_lowercase()).map(|slot| slot.state)
    }

    /// Free shared slots; a hard-locked resource has none
    #[must_use]
    pub fn free_slots(&self, name: &str) -> Option<usize> {
        self.state(name).map(|state| match state {
            SlotState::Shared { free } => free,
            SlotState::Exclusive => 0,
        })
    }

    /// Whether one more shared lock fits; unknown names are never available
    #[must_use]
    pub fn is_available(&self, name: &str) -> bool {
        self.slots
            .get(&name.to_lowercase())
            .is_some_and(Slot::is_available)
    }

    /// Every resource that can take one more shared lock, in name order
    #[must_use]
    pub fn list_available(&self) -> Vec<Arc<Resource>> {
        self.slots
            .values()
            .filter(|slot| slot.is_available())
            .map(|slot| Arc::clone(&slot.resource))
            .collect()
    }

    /// Take one shared slot
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is unknown.
    pub fn try_lock(&mut self, name: &str) -> Result<bool, LockError> {
        let slot = self.slot_mut(name)?;
        match slot.state {
            SlotState::Shared { free } if free > 0 => {
                slot.state = SlotState::Shared { free: free - 1 };
                tracing::debug!(resource = %slot.resource, free = free - 1, "Locked resource");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Take the whole resource; only possible while it is fully idle
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is unknown.
    pub fn try_hard_lock(&mut self, name: &str) -> Result<bool, LockError> {
        let slot = self.slot_mut(name)?;
        match slot.state {
            SlotState::Shared { free } if free == slot.capacity() => {
                slot.state = SlotState::Exclusive;
                tracing::debug!(resource = %slot.resource, "Hard-locked resource");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Give back one lock
    ///
    /// A hard lock returns the full capacity in one step. Releasing an idle
    /// resource leaves it idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is unknown.
    pub fn release(&mut self, name: &str) -> Result<(), LockError> {
        let slot = self.slot_mut(name)?;
        let capacity = slot.capacity();
        match slot.state {
            SlotState::Exclusive => {
                tracing::debug!(resource = %slot.resource, "Released hard lock");
                slot.state = SlotState::Shared { free: capacity };
            }
            SlotState::Shared { free } if free < capacity => {
                tracing::debug!(resource = %slot.resource, free = free + 1, "Released resource");
                slot.state = SlotState::Shared { free: free + 1 };
            }
            SlotState::Shared { .. } => {
                tracing::warn!(resource = %slot.resource, "Release of an idle resource ignored");
            }
        }
        Ok(())
    }

    /// Force a resource back to idle
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is unknown.
    pub fn reset(&mut self, name: &str) -> Result<(), LockError> {
        let slot = self.slot_mut(name)?;
        tracing::debug!(resource = %slot.resource, "Reset resource");
        slot.state = SlotState::Shared {
            free: slot.capacity(),
        };
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.state = SlotState::Shared {
                free: slot.capacity(),
            };
        }
        tracing::debug!("Reset all resources");
    }

    /// Release one lock on every resource
    pub fn release_all(&mut self) {
        let keys: Vec<String> = self.slots.keys().cloned().collect();
        for key in keys {
            // Keys come from the map itself
            let _ = self.release(&key);
        }
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut Slot, LockError> {
        self.slots
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| LockError::UnknownResource {
                name: name.to_string(),
            })
    }
}
