//! Per-section entity and listener sets.

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::index::ListenerIndex;
use crate::{ListenerId, NearbyEntityListener, TrackedEntity};

/// Entities located in one section and the listeners watching it.
#[derive(Debug)]
pub(crate) struct TrackedCell<E> {
    entities: HashSet<E>,
    /// In subscription order.
    listeners: SmallVec<[ListenerId; 4]>,
    /// Subset of `listeners` that receive exact-position events.
    exact_listeners: SmallVec<[ListenerId; 2]>,
}

impl<E: TrackedEntity> TrackedCell<E> {
    pub(crate) fn new() -> Self {
        Self {
            entities: HashSet::new(),
            listeners: SmallVec::new(),
            exact_listeners: SmallVec::new(),
        }
    }

    /// A cell with no entities and no listeners must be pruned.
    pub(crate) fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.listeners.is_empty()
    }

    pub(crate) fn contains_entity(&self, entity: E) -> bool {
        self.entities.contains(&entity)
    }

    pub(crate) fn contains_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(&id)
    }

    pub(crate) fn entities(&self) -> impl Iterator<Item = E> + '_ {
        self.entities.iter().copied()
    }

    pub(crate) fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }

    pub(crate) fn exact_listeners(&self) -> &[ListenerId] {
        &self.exact_listeners
    }

    /// Insert an entity and tell every listener of this cell about it.
    ///
    /// Returns `false` without notifying if the entity was already here.
    pub(crate) fn add_entity(&mut self, entity: E, index: &mut ListenerIndex<E>) -> bool {
        if !self.entities.insert(entity) {
            return false;
        }

        for &id in &self.listeners {
            if let Some(listener) = index.listener_mut(id) {
                listener.on_entity_entered_range(entity);
            }
        }

        true
    }

    /// Remove an entity and tell every listener of this cell it left.
    pub(crate) fn remove_entity(&mut self, entity: E, index: &mut ListenerIndex<E>) -> bool {
        if !self.entities.remove(&entity) {
            return false;
        }

        for &id in &self.listeners {
            if let Some(listener) = index.listener_mut(id) {
                listener.on_entity_left_range(entity);
            }
        }

        true
    }

    /// Attach a listener, delivering every entity already present first.
    pub(crate) fn add_listener(
        &mut self,
        id: ListenerId,
        exact: bool,
        listener: &mut dyn NearbyEntityListener<E>,
    ) {
        debug_assert!(!self.contains_listener(id));

        for &entity in &self.entities {
            listener.on_entity_entered_range(entity);
        }

        self.listeners.push(id);

        if exact {
            self.exact_listeners.push(id);
        }
    }

    /// Detach a listener, delivering a leave for every entity still present.
    ///
    /// Returns `false` if the listener was not attached here.
    pub(crate) fn remove_listener(
        &mut self,
        id: ListenerId,
        listener: &mut dyn NearbyEntityListener<E>,
    ) -> bool {
        let Some(at) = self.listeners.iter().position(|&l| l == id) else {
            return false;
        };

        self.listeners.remove(at);

        for &entity in &self.entities {
            listener.on_entity_left_range(entity);
        }

        if let Some(at) = self.exact_listeners.iter().position(|&l| l == id) {
            self.exact_listeners.remove(at);
        }

        true
    }

    /// Forward a within-section movement to the exact-position listeners.
    pub(crate) fn notify_moved_any_distance(&self, entity: E, index: &mut ListenerIndex<E>) {
        for &id in &self.exact_listeners {
            if let Some(exact) = index
                .listener_mut(id)
                .and_then(|listener| listener.as_exact_position())
            {
                exact.on_entity_moved_any_distance(entity);
            }
        }
    }
}
