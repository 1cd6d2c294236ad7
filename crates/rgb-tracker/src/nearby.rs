//! Live set of nearby entities of one kind.
//!
//! A [`NearbyEntityTracker`] lets AI goals answer "closest matching entity"
//! from a small candidate set instead of querying the world every tick.

use core::cmp::Ordering;
use core::fmt;

use hashbrown::HashSet;

use crate::section::SECTION_SIZE;
use crate::{Aabb, NearbyEntityListener, Position, TrackedEntity};

/// Host-side view of entity state the tracker needs for distance queries.
pub trait EntityLookup<E> {
    /// Current position, or `None` if the entity no longer exists.
    fn position(&self, entity: E) -> Option<Position>;

    /// Current bounding box.
    fn bounds(&self, entity: E) -> Option<Aabb>;

    /// Whether the entity is a living entity that can target or be targeted.
    fn is_living(&self, entity: E) -> bool;
}

/// Kind filter deciding which entities a tracker keeps.
pub struct EntityFilter<E> {
    name: &'static str,
    matches: Box<dyn Fn(E) -> bool>,
}

impl<E> EntityFilter<E> {
    /// Filter named `name` accepting entities for which `matches` holds.
    pub fn new(name: &'static str, matches: impl Fn(E) -> bool + 'static) -> Self {
        Self {
            name,
            matches: Box::new(matches),
        }
    }

    /// Filter accepting every entity.
    #[must_use]
    pub fn any() -> Self {
        Self::new("any", |_| true)
    }

    /// Name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the filter accepts `entity`.
    pub fn matches(&self, entity: E) -> bool {
        (self.matches)(entity)
    }
}

impl<E> fmt::Debug for EntityFilter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityFilter").field(&self.name).finish()
    }
}

/// Keeps every entity of one kind within range of an anchor entity.
pub struct NearbyEntityTracker<E> {
    filter: EntityFilter<E>,
    anchor: E,
    range: f64,
    range_sq: f64,
    chunk_range: u32,
    nearby: HashSet<E>,
}

impl<E: TrackedEntity> NearbyEntityTracker<E> {
    /// Track entities accepted by `filter` within `range` blocks of `anchor`.
    ///
    /// The section range is `range` rounded up to whole sections, and at
    /// least one section. Ranges too large for `u32` saturate.
    pub fn new(anchor: E, range: f64, filter: EntityFilter<E>) -> Self {
        let sections = (range.max(0.0) / f64::from(SECTION_SIZE)).ceil().max(1.0);
        let chunk_range = sections as u32;

        Self {
            filter,
            anchor,
            range,
            range_sq: range * range,
            chunk_range,
            nearby: HashSet::new(),
        }
    }

    /// The entity this tracker measures distances from.
    #[must_use]
    pub fn anchor(&self) -> E {
        self.anchor
    }

    /// Range in blocks.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.range
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nearby.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nearby.is_empty()
    }

    /// Whether `entity` is currently tracked.
    #[must_use]
    pub fn contains(&self, entity: E) -> bool {
        self.nearby.contains(&entity)
    }

    /// Tracked entities, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = E> + '_ {
        self.nearby.iter().copied()
    }

    /// Closest tracked entity to the anchor that intersects `area` (if
    /// given) and satisfies `predicate(anchor, candidate)`.
    ///
    /// Only living entities are considered, and the anchor itself must be
    /// living. Candidates at equal distance resolve to the smaller handle.
    /// Returns `None` when the best match is farther than the range.
    pub fn closest<L, P>(&self, lookup: &L, area: Option<&Aabb>, mut predicate: P) -> Option<E>
    where
        L: EntityLookup<E> + ?Sized,
        P: FnMut(E, E) -> bool,
    {
        if !lookup.is_living(self.anchor) {
            return None;
        }

        let origin = lookup.position(self.anchor)?;

        let mut nearest = None;
        let mut nearest_sq = f64::INFINITY;

        for &candidate in &self.nearby {
            if candidate == self.anchor || !lookup.is_living(candidate) {
                continue;
            }

            let Some(pos) = lookup.position(candidate) else {
                continue;
            };

            let distance_sq = origin.squared_distance(pos);
            let closer = match distance_sq.total_cmp(&nearest_sq) {
                Ordering::Less => true,
                Ordering::Equal => nearest.is_some_and(|best| candidate < best),
                Ordering::Greater => false,
            };

            if !closer {
                continue;
            }

            let in_area = area.is_none_or(|area| {
                lookup
                    .bounds(candidate)
                    .is_some_and(|bounds| area.intersects(&bounds))
            });

            if in_area && predicate(self.anchor, candidate) {
                nearest = Some(candidate);
                nearest_sq = distance_sq;
            }
        }

        if nearest_sq <= self.range_sq {
            nearest
        } else {
            None
        }
    }
}

impl<E: TrackedEntity> NearbyEntityListener<E> for NearbyEntityTracker<E> {
    fn chunk_range(&self) -> u32 {
        self.chunk_range
    }

    fn on_entity_entered_range(&mut self, entity: E) {
        if self.filter.matches(entity) {
            self.nearby.insert(entity);
        }
    }

    fn on_entity_left_range(&mut self, entity: E) {
        if self.nearby.is_empty() || !self.filter.matches(entity) {
            return;
        }

        self.nearby.remove(&entity);
    }
}

impl<E: TrackedEntity> fmt::Debug for NearbyEntityTracker<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NearbyEntityTracker")
            .field("filter", &self.filter.name)
            .field("anchor", &self.anchor)
            .field("range_sq", &self.range_sq)
            .field("nearby", &self.nearby.len())
            .finish_non_exhaustive()
    }
}
