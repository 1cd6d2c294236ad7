//! Registered listeners and the sections each one occupies.

use core::any::Any;

use hashbrown::HashMap;

use crate::{ListenerId, NearbyEntityListener, SectionPos, TrackedEntity};

/// The sections a listener currently occupies.
///
/// Always equal, as a set, to the sections in the registry listing the
/// listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Subscription {
    /// Center of a cuboid subscription, `None` for an explicit section list.
    pub(crate) center: Option<SectionPos>,
    /// Occupied sections in subscription order.
    pub(crate) sections: Vec<SectionPos>,
}

/// A registered listener together with its occupancy record.
#[derive(Debug)]
pub(crate) struct ListenerSlot<E> {
    pub(crate) listener: Box<dyn NearbyEntityListener<E>>,
    /// Cached at registration: whether the listener wants exact positions.
    pub(crate) exact: bool,
    pub(crate) subscription: Option<Subscription>,
}

/// Every listener registered with an engine.
#[derive(Debug)]
pub(crate) struct ListenerIndex<E> {
    slots: HashMap<ListenerId, ListenerSlot<E>>,
    next_id: u32,
}

impl<E: TrackedEntity> ListenerIndex<E> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Register a listener and hand out its id. Ids are never reused.
    pub(crate) fn insert(&mut self, mut listener: Box<dyn NearbyEntityListener<E>>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        let exact = listener.as_exact_position().is_some();

        self.slots.insert(
            id,
            ListenerSlot {
                listener,
                exact,
                subscription: None,
            },
        );

        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> Option<ListenerSlot<E>> {
        self.slots.remove(&id)
    }

    pub(crate) fn get(&self, id: ListenerId) -> Option<&ListenerSlot<E>> {
        self.slots.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ListenerId) -> Option<&mut ListenerSlot<E>> {
        self.slots.get_mut(&id)
    }

    pub(crate) fn listener_mut(
        &mut self,
        id: ListenerId,
    ) -> Option<&mut (dyn NearbyEntityListener<E> + 'static)> {
        self.slots.get_mut(&id).map(|slot| &mut *slot.listener)
    }

    pub(crate) fn downcast<T: NearbyEntityListener<E>>(&self, id: ListenerId) -> Option<&T> {
        let any: &dyn Any = &*self.slots.get(&id)?.listener;
        any.downcast_ref::<T>()
    }

    pub(crate) fn downcast_mut<T: NearbyEntityListener<E>>(&mut self, id: ListenerId) -> Option<&mut T> {
        let any: &mut dyn Any = &mut *self.slots.get_mut(&id)?.listener;
        any.downcast_mut::<T>()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn subscriptions(&self) -> impl Iterator<Item = (ListenerId, &Subscription)> + '_ {
        self.slots
            .iter()
            .filter_map(|(&id, slot)| slot.subscription.as_ref().map(|sub| (id, sub)))
    }
}
