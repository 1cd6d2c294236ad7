//! Listener that follows every movement inside its sections.

use hashbrown::HashSet;

use crate::{
    EntityTrackerEngine, ExactPositionListener, ListenerId, NearbyEntityListener, SectionPos,
    TrackedEntity, TrackerResult,
};

/// Watches a fixed set of sections and raises a flag whenever an entity in
/// them enters, leaves or moves.
///
/// Typical use is a block that reacts to entities standing on it: the block
/// registers the sections it overlaps and polls [`take_changed`] once per
/// tick instead of scanning for entities.
///
/// [`take_changed`]: ExactPositionTracker::take_changed
#[derive(Debug)]
pub struct ExactPositionTracker<E> {
    entities: HashSet<E>,
    changed: bool,
    moved: u64,
}

impl<E: TrackedEntity> Default for ExactPositionTracker<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TrackedEntity> ExactPositionTracker<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashSet::new(),
            changed: false,
            moved: 0,
        }
    }

    /// Subscribe `id` to an explicit section list.
    pub fn register(
        engine: &mut EntityTrackerEngine<E>,
        id: ListenerId,
        sections: &[SectionPos],
    ) -> TrackerResult<()> {
        engine.subscribe_sections(id, sections)
    }

    /// Drop the subscription of `id`. The listener itself stays registered.
    pub fn deregister(engine: &mut EntityTrackerEngine<E>, id: ListenerId) -> TrackerResult<()> {
        engine.unsubscribe(id)
    }

    /// Whether anything happened since the last call, clearing the flag.
    pub fn take_changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }

    /// Entities currently in the watched sections.
    pub fn entities(&self) -> impl Iterator<Item = E> + '_ {
        self.entities.iter().copied()
    }

    /// Whether `entity` is in the watched sections.
    #[must_use]
    pub fn contains(&self, entity: E) -> bool {
        self.entities.contains(&entity)
    }

    /// Total number of movement events received.
    #[must_use]
    pub fn moved_count(&self) -> u64 {
        self.moved
    }
}

impl<E: TrackedEntity> NearbyEntityListener<E> for ExactPositionTracker<E> {
    fn chunk_range(&self) -> u32 {
        1
    }

    fn on_entity_entered_range(&mut self, entity: E) {
        self.entities.insert(entity);
        self.changed = true;
    }

    fn on_entity_left_range(&mut self, entity: E) {
        if self.entities.remove(&entity) {
            self.changed = true;
        }
    }

    fn as_exact_position(&mut self) -> Option<&mut dyn ExactPositionListener<E>> {
        Some(self)
    }
}

impl<E: TrackedEntity> ExactPositionListener<E> for ExactPositionTracker<E> {
    fn on_entity_moved_any_distance(&mut self, _entity: E) {
        self.moved += 1;
        self.changed = true;
    }
}
