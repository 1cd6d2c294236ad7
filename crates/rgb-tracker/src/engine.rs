//! The entity tracker engine.
//!
//! Tracks which section every entity is in and which listeners watch each
//! section. Listeners are told, synchronously and in-line with the mutating
//! call, when an entity enters or leaves the sections they watch. This saves
//! every listener from polling the world for nearby entities each tick.

use core::fmt;

use hashbrown::HashSet;
use tracing::{debug, error, trace, warn};

use crate::index::{ListenerIndex, Subscription};
use crate::region::SectionBox;
use crate::registry::SectionRegistry;
use crate::{
    ListenerId, NearbyEntityListener, SectionPos, TrackedEntity, TrackerConfig, TrackerError,
    TrackerResult,
};

/// A validated move of a cuboid subscription, ready to apply.
#[derive(Debug, Clone, Copy)]
struct Relocation {
    id: ListenerId,
    before: SectionBox,
    after: SectionBox,
}

/// Per-world entity tracker.
///
/// Construct one per world with [`EntityTrackerEngine::new`] and drive it
/// from the world's entity lifecycle hooks. Every call runs on the world's
/// tick thread.
pub struct EntityTrackerEngine<E: TrackedEntity> {
    config: TrackerConfig,
    sections: SectionRegistry<E>,
    listeners: ListenerIndex<E>,
}

impl<E: TrackedEntity> EntityTrackerEngine<E> {
    /// Create an empty engine.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            sections: SectionRegistry::with_capacity(config.section_capacity),
            listeners: ListenerIndex::with_capacity(config.listener_capacity),
            config,
        }
    }

    /// The configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ==================== World Events ====================

    /// An entity was added to the world.
    ///
    /// If the entity carries its own `listener`, that listener is subscribed
    /// around `pos` once the entity is in.
    pub fn on_entity_added(
        &mut self,
        pos: SectionPos,
        entity: E,
        listener: Option<ListenerId>,
    ) -> TrackerResult<bool> {
        let pos = pos.clamped();
        let radius = match listener {
            Some(id) => self.prepare_subscribe(id, Some(pos))?,
            None => None,
        };

        if !self.add_entity(pos, entity) {
            return Ok(false);
        }

        if let (Some(id), Some(radius)) = (listener, radius) {
            self.attach(id, Some(pos), SectionBox::around(pos, radius).sections().collect());
        }

        Ok(true)
    }

    /// An entity was removed from the world.
    ///
    /// If the entity carries its own `listener`, that listener is
    /// unsubscribed once the entity is gone.
    pub fn on_entity_removed(
        &mut self,
        pos: SectionPos,
        entity: E,
        listener: Option<ListenerId>,
    ) -> TrackerResult<bool> {
        let detach = match listener {
            Some(id) => self.prepare_unsubscribe(id)?,
            None => false,
        };

        if !self.remove_entity(pos, entity) {
            return Ok(false);
        }

        if let (Some(id), true) = (listener, detach) {
            self.detach(id);
        }

        Ok(true)
    }

    /// An entity moved between sections.
    ///
    /// Cheaper than removing and re-adding: the entity's own listener only
    /// touches the sections that actually enter or leave its range.
    pub fn on_entity_moved(
        &mut self,
        from: SectionPos,
        to: SectionPos,
        entity: E,
        listener: Option<ListenerId>,
    ) -> TrackerResult<bool> {
        let (from, to) = (from.clamped(), to.clamped());

        if from == to {
            return Ok(false);
        }

        let relocation = match listener {
            Some(id) => self.plan_relocation(id, from, to)?,
            None => None,
        };

        if !self.move_entity(from, to, entity) {
            return Ok(false);
        }

        if let Some(relocation) = relocation {
            self.apply_relocation(relocation, to);
        }

        Ok(true)
    }

    /// Called right before the host teleports an entity.
    ///
    /// Teleports bypass the regular move path, so the entity is taken out of
    /// its old section here and put back by
    /// [`after_entity_teleport`](Self::after_entity_teleport).
    pub fn before_entity_teleport(&mut self, pos: SectionPos, entity: E) -> bool {
        self.remove_entity(pos, entity)
    }

    /// Called right after the host teleported an entity.
    pub fn after_entity_teleport(&mut self, pos: SectionPos, entity: E) -> bool {
        self.add_entity(pos, entity)
    }

    /// An entity moved, possibly without crossing a section boundary.
    ///
    /// Only the exact-position listeners of the section the entity is
    /// registered at are notified, even if the entity has just been moved
    /// into another section. This cannot replace the enter/leave handling of
    /// [`on_entity_moved`](Self::on_entity_moved).
    pub fn on_entity_moved_any_distance(&mut self, entity: E, pos: SectionPos) {
        if !self.config.exact_position_events {
            return;
        }

        if let Some(cell) = self.sections.get(pos.clamped()) {
            cell.notify_moved_any_distance(entity, &mut self.listeners);
        }
    }

    // ==================== Entities ====================

    /// Insert an entity into the section at `pos`.
    ///
    /// Every listener of that section hears about it. Returns `false` if the
    /// entity was already there, or if `x` or `z` lies outside the packable
    /// range (see [`SectionPos::is_valid`]).
    pub fn add_entity(&mut self, pos: SectionPos, entity: E) -> bool {
        let pos = pos.clamped();

        if !pos.is_valid() {
            warn!("refusing to track {:?} at out-of-range section {}", entity, pos);
            return false;
        }

        let added = self
            .sections
            .get_or_create(pos)
            .add_entity(entity, &mut self.listeners);

        if added {
            trace!("added {:?} to section {}", entity, pos);
        }

        added
    }

    /// Remove an entity from the section at `pos`, pruning the section if
    /// it ends up empty. Returns `false` if the entity was not there.
    pub fn remove_entity(&mut self, pos: SectionPos, entity: E) -> bool {
        let pos = pos.clamped();

        let Some(cell) = self.sections.get_mut(pos) else {
            return false;
        };

        if !cell.remove_entity(entity, &mut self.listeners) {
            return false;
        }

        self.sections.remove_if_empty(pos);
        trace!("removed {:?} from section {}", entity, pos);
        true
    }

    /// Move an entity from one section to another.
    ///
    /// Moving within the same section is a no-op. Returns `true` only if the
    /// entity was removed from `from` and added at `to`. A `to` outside the
    /// packable range leaves the entity where it was.
    pub fn move_entity(&mut self, from: SectionPos, to: SectionPos, entity: E) -> bool {
        let (from, to) = (from.clamped(), to.clamped());

        if from == to {
            return false;
        }

        if !to.is_valid() {
            warn!("refusing to move {:?} to out-of-range section {}", entity, to);
            return false;
        }

        self.remove_entity(from, entity) && self.add_entity(to, entity)
    }

    // ==================== Listeners ====================

    /// Register a listener. It stays dormant until subscribed.
    pub fn add_listener<L: NearbyEntityListener<E>>(&mut self, listener: L) -> ListenerId {
        let range = listener.chunk_range();
        let id = self.listeners.insert(Box::new(listener));
        debug!("registered {} with chunk range {}", id, range);
        id
    }

    /// Unregister a listener, unsubscribing it first if needed.
    pub fn remove_listener(&mut self, id: ListenerId) -> TrackerResult<Box<dyn NearbyEntityListener<E>>> {
        let subscribed = match self.listeners.get(id) {
            Some(slot) => slot.subscription.is_some(),
            None => return fail(TrackerError::UnknownListener { listener: id }),
        };

        if subscribed {
            self.unsubscribe(id)?;
        }

        match self.listeners.remove(id) {
            Some(slot) => {
                debug!("unregistered {}", id);
                Ok(slot.listener)
            }
            None => fail(TrackerError::UnknownListener { listener: id }),
        }
    }

    /// Borrow a registered listener as its concrete type.
    #[must_use]
    pub fn listener<T: NearbyEntityListener<E>>(&self, id: ListenerId) -> Option<&T> {
        self.listeners.downcast(id)
    }

    /// Mutably borrow a registered listener as its concrete type.
    pub fn listener_mut<T: NearbyEntityListener<E>>(&mut self, id: ListenerId) -> Option<&mut T> {
        self.listeners.downcast_mut(id)
    }

    /// Subscribe a listener to the cuboid of sections around `center`.
    ///
    /// Every entity already in range is delivered before
    /// [`on_initial_entities_received`](NearbyEntityListener::on_initial_entities_received)
    /// fires. Zero-range listeners are ignored. The center's `y` is clamped
    /// into `0..=15` first, so a center above or below the world still
    /// subscribes the boundary layers around it.
    pub fn subscribe(&mut self, id: ListenerId, center: SectionPos) -> TrackerResult<()> {
        let center = center.clamped();

        if let Some(radius) = self.prepare_subscribe(id, Some(center))? {
            self.attach(id, Some(center), SectionBox::around(center, radius).sections().collect());
        }

        Ok(())
    }

    /// Subscribe a listener to an explicit list of sections.
    ///
    /// Duplicates and sections that are not [valid](SectionPos::is_valid)
    /// are skipped.
    pub fn subscribe_sections(&mut self, id: ListenerId, sections: &[SectionPos]) -> TrackerResult<()> {
        if self.prepare_subscribe(id, None)?.is_none() {
            return Ok(());
        }

        let mut seen = HashSet::with_capacity(sections.len());
        let sections = sections
            .iter()
            .copied()
            .filter(|pos| pos.is_valid() && seen.insert(*pos))
            .collect();

        self.attach(id, None, sections);
        Ok(())
    }

    /// Remove a listener from every section it occupies.
    ///
    /// A leave is delivered for each entity still in range. Zero-range
    /// listeners are ignored.
    pub fn unsubscribe(&mut self, id: ListenerId) -> TrackerResult<()> {
        if self.prepare_unsubscribe(id)? {
            self.detach(id);
        }

        Ok(())
    }

    /// Move a cuboid subscription from `from` to `to`.
    ///
    /// Only sections that leave or enter the cuboid are touched. Sections in
    /// both stay as they are and produce no callbacks. Both centers have
    /// their `y` clamped into `0..=15`, matching [`subscribe`](Self::subscribe).
    pub fn relocate(&mut self, id: ListenerId, from: SectionPos, to: SectionPos) -> TrackerResult<()> {
        let (from, to) = (from.clamped(), to.clamped());

        if let Some(relocation) = self.plan_relocation(id, from, to)? {
            self.apply_relocation(relocation, to);
        }

        Ok(())
    }

    // ==================== Diagnostics ====================

    /// Number of live sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether a section is live at `pos`.
    #[must_use]
    pub fn contains_section(&self, pos: SectionPos) -> bool {
        self.sections.get(pos).is_some()
    }

    /// Positions of all live sections, in no particular order.
    pub fn section_positions(&self) -> impl Iterator<Item = SectionPos> + '_ {
        self.sections.positions()
    }

    /// Whether `entity` is tracked in the section at `pos`.
    #[must_use]
    pub fn contains_entity(&self, pos: SectionPos, entity: E) -> bool {
        self.sections
            .get(pos)
            .is_some_and(|cell| cell.contains_entity(entity))
    }

    /// Entities tracked in the section at `pos`.
    pub fn entities_in(&self, pos: SectionPos) -> impl Iterator<Item = E> + '_ {
        self.sections
            .get(pos)
            .into_iter()
            .flat_map(|cell| cell.entities())
    }

    /// Listeners watching the section at `pos`, in subscription order.
    #[must_use]
    pub fn listeners_in(&self, pos: SectionPos) -> &[ListenerId] {
        self.sections
            .get(pos)
            .map(|cell| cell.listeners())
            .unwrap_or_default()
    }

    /// Exact-position listeners watching the section at `pos`.
    #[must_use]
    pub fn exact_listeners_in(&self, pos: SectionPos) -> &[ListenerId] {
        self.sections
            .get(pos)
            .map(|cell| cell.exact_listeners())
            .unwrap_or_default()
    }

    /// Whether the listener currently holds a subscription.
    #[must_use]
    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners
            .get(id)
            .is_some_and(|slot| slot.subscription.is_some())
    }

    /// Sections the listener occupies, in subscription order.
    #[must_use]
    pub fn sections_of(&self, id: ListenerId) -> Option<&[SectionPos]> {
        self.listeners
            .get(id)?
            .subscription
            .as_ref()
            .map(|sub| sub.sections.as_slice())
    }

    /// Check that the listener index and the section registry agree and
    /// that no empty section is left behind.
    pub fn validate(&self) -> TrackerResult<()> {
        for (id, sub) in self.listeners.subscriptions() {
            for &section in &sub.sections {
                if !self.listed_at(id, section) {
                    return Err(TrackerError::MissingFromSection { listener: id, section });
                }
            }
        }

        for (section, cell) in self.sections.cells() {
            if cell.is_empty() {
                return Err(TrackerError::EmptySection { section });
            }

            for &id in cell.listeners() {
                let recorded = self
                    .listeners
                    .get(id)
                    .and_then(|slot| slot.subscription.as_ref())
                    .is_some_and(|sub| sub.sections.contains(&section));

                if !recorded {
                    return Err(TrackerError::UnexpectedInSection { listener: id, section });
                }
            }
        }

        Ok(())
    }

    // ==================== Internals ====================

    fn listed_at(&self, id: ListenerId, pos: SectionPos) -> bool {
        self.sections
            .get(pos)
            .is_some_and(|cell| cell.contains_listener(id))
    }

    /// Check that `id` may subscribe. Returns its range, or `None` for a
    /// zero-range listener.
    fn prepare_subscribe(&self, id: ListenerId, center: Option<SectionPos>) -> TrackerResult<Option<u32>> {
        let Some(slot) = self.listeners.get(id) else {
            return fail(TrackerError::UnknownListener { listener: id });
        };

        let radius = slot.listener.chunk_range();

        if radius == 0 {
            return Ok(None);
        }

        if let Some(sub) = &slot.subscription {
            return fail(TrackerError::AlreadyListening {
                listener: id,
                description: format!("{:?}", slot.listener),
                center,
                radius,
                sections: sub.sections.clone(),
            });
        }

        Ok(Some(radius))
    }

    /// Add the listener to every section, delivering present entities.
    fn attach(&mut self, id: ListenerId, center: Option<SectionPos>, sections: Vec<SectionPos>) {
        let Some(slot) = self.listeners.get_mut(id) else {
            return;
        };

        let exact = slot.exact;
        let listener = &mut *slot.listener;

        for &pos in &sections {
            self.sections.get_or_create(pos).add_listener(id, exact, listener);
        }

        debug!(
            "subscribed {} to {} sections around {}",
            id,
            sections.len(),
            center.map_or_else(|| "explicit list".to_owned(), |c| c.to_string())
        );

        slot.subscription = Some(Subscription { center, sections });
        slot.listener.on_initial_entities_received();
    }

    /// Check that `id` may unsubscribe. Returns `false` for a zero-range
    /// listener.
    fn prepare_unsubscribe(&self, id: ListenerId) -> TrackerResult<bool> {
        let Some(slot) = self.listeners.get(id) else {
            return fail(TrackerError::UnknownListener { listener: id });
        };

        if slot.listener.chunk_range() == 0 {
            return Ok(false);
        }

        let Some(sub) = &slot.subscription else {
            return fail(TrackerError::NotListening { listener: id });
        };

        if let Some(&section) = sub.sections.iter().find(|&&pos| !self.listed_at(id, pos)) {
            return fail(TrackerError::MissingFromSection { listener: id, section });
        }

        Ok(true)
    }

    /// Remove the listener from every recorded section and drop the record.
    fn detach(&mut self, id: ListenerId) {
        let Some(slot) = self.listeners.get_mut(id) else {
            return;
        };

        let Some(sub) = slot.subscription.take() else {
            return;
        };

        let listener = &mut *slot.listener;

        for &pos in &sub.sections {
            if let Some(cell) = self.sections.get_mut(pos) {
                cell.remove_listener(id, listener);
            }
            self.sections.remove_if_empty(pos);
        }

        debug!("unsubscribed {} from {} sections", id, sub.sections.len());
    }

    /// Validate a cuboid move. Returns `None` when there is nothing to do.
    fn plan_relocation(
        &self,
        id: ListenerId,
        from: SectionPos,
        to: SectionPos,
    ) -> TrackerResult<Option<Relocation>> {
        let Some(slot) = self.listeners.get(id) else {
            return fail(TrackerError::UnknownListener { listener: id });
        };

        let radius = slot.listener.chunk_range();

        if radius == 0 {
            return Ok(None);
        }

        let Some(sub) = &slot.subscription else {
            return fail(TrackerError::NotListening { listener: id });
        };

        if sub.center != Some(from) {
            return fail(TrackerError::CenterMismatch {
                listener: id,
                from,
                actual: sub.center,
            });
        }

        if from == to {
            return Ok(None);
        }

        let before = SectionBox::around(from, radius);
        let after = SectionBox::around(to, radius);

        if let Some(section) = before.difference(&after).find(|&pos| !self.listed_at(id, pos)) {
            return fail(TrackerError::MissingFromSection { listener: id, section });
        }

        if let Some(section) = after.difference(&before).find(|&pos| self.listed_at(id, pos)) {
            return fail(TrackerError::UnexpectedInSection { listener: id, section });
        }

        Ok(Some(Relocation { id, before, after }))
    }

    fn apply_relocation(&mut self, relocation: Relocation, to: SectionPos) {
        let Relocation { id, before, after } = relocation;

        let Some(slot) = self.listeners.get_mut(id) else {
            return;
        };

        let exact = slot.exact;
        let listener = &mut *slot.listener;
        let mut left = 0usize;
        let mut entered = 0usize;

        for pos in before.difference(&after) {
            if let Some(cell) = self.sections.get_mut(pos) {
                cell.remove_listener(id, listener);
            }
            self.sections.remove_if_empty(pos);
            left += 1;
        }

        for pos in after.difference(&before) {
            self.sections.get_or_create(pos).add_listener(id, exact, listener);
            entered += 1;
        }

        slot.subscription = Some(Subscription {
            center: Some(to),
            sections: after.sections().collect(),
        });

        trace!(
            "relocated {} to {}: left {} sections, entered {}",
            id, to, left, entered
        );
    }
}

impl<E: TrackedEntity> fmt::Debug for EntityTrackerEngine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTrackerEngine")
            .field("sections", &self.sections.len())
            .field("listeners", &self.listeners.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Log a programming error and return it.
fn fail<T>(err: TrackerError) -> TrackerResult<T> {
    error!("{}", err);
    Err(err)
}
