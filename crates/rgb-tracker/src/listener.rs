//! Listener traits used to receive events from the tracking engine.

use core::any::Any;
use core::fmt;
use core::hash::Hash;

/// Handle of an entity tracked by the engine.
///
/// The engine only ever compares handles, it never looks inside them.
/// `Ord` is used solely to break distance ties deterministically.
pub trait TrackedEntity: Copy + Eq + Hash + Ord + fmt::Debug + 'static {}

impl<T: Copy + Eq + Hash + Ord + fmt::Debug + 'static> TrackedEntity for T {}

/// Identifier of a listener registered with an engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u32);

impl ListenerId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Receives enter/leave events for the sections a listener watches.
///
/// Callbacks only get `&mut self`. The engine stays borrowed for the whole
/// notifying call, so a callback cannot subscribe, unsubscribe or move
/// anything while the engine iterates a section.
pub trait NearbyEntityListener<E: TrackedEntity>: Any + fmt::Debug {
    /// Range of this listener in sections. Must not change while the
    /// listener is registered. Zero disables spatial tracking.
    fn chunk_range(&self) -> u32;

    /// An entity entered one of the watched sections.
    fn on_entity_entered_range(&mut self, entity: E);

    /// An entity left the watched sections or was removed from the world.
    fn on_entity_left_range(&mut self, entity: E);

    /// All entities already present were delivered after a subscribe.
    fn on_initial_entities_received(&mut self) {}

    /// View of this listener as an exact-position listener, if it is one.
    fn as_exact_position(&mut self) -> Option<&mut dyn ExactPositionListener<E>> {
        None
    }
}

/// Listener that also hears about every movement of an entity inside the
/// section it occupies, not only section crossings.
///
/// Returning `Some(self)` from [`NearbyEntityListener::as_exact_position`]
/// opts a listener in. Registration is always explicit: the engine never
/// subscribes or unsubscribes these on its own.
pub trait ExactPositionListener<E: TrackedEntity>: NearbyEntityListener<E> {
    /// An entity in one of the watched sections moved any distance.
    ///
    /// This does not replace the enter and leave callbacks.
    fn on_entity_moved_any_distance(&mut self, entity: E);
}
