//! Host-side glue deciding when fine-grained movement is reported.
//!
//! An entity that moves during its own tick is reported once, after the
//! tick. Moves caused by something else (pistons, shulkers, another entity
//! pushing) are reported as they happen.

use crate::{EntityTrackerEngine, Position, SectionPos, TrackedEntity};

/// Tracks the entity currently being ticked and its position before the tick.
#[derive(Debug, Clone, Copy)]
pub struct MotionTracker<E> {
    ticking: Option<(E, Position)>,
}

impl<E> Default for MotionTracker<E> {
    fn default() -> Self {
        Self { ticking: None }
    }
}

impl<E: TrackedEntity> MotionTracker<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The host is about to tick `entity`, currently at `position`.
    pub fn begin_tick(&mut self, entity: E, position: Position) {
        self.ticking = Some((entity, position));
    }

    /// The host finished ticking `entity`, now at `position` and registered
    /// at `section`. Returns whether a movement event was raised.
    pub fn end_tick(
        &mut self,
        engine: &mut EntityTrackerEngine<E>,
        entity: E,
        position: Position,
        section: SectionPos,
    ) -> bool {
        let Some((ticking, before)) = self.ticking.take() else {
            return false;
        };

        if ticking != entity || before == position {
            return false;
        }

        engine.on_entity_moved_any_distance(entity, section);
        true
    }

    /// `entity` was moved by something other than its own tick.
    ///
    /// Ignored while the entity itself is ticking, since [`end_tick`] will
    /// report it.
    ///
    /// [`end_tick`]: MotionTracker::end_tick
    pub fn on_external_move(
        &mut self,
        engine: &mut EntityTrackerEngine<E>,
        entity: E,
        section: SectionPos,
    ) -> bool {
        if self.is_ticking(entity) {
            return false;
        }

        engine.on_entity_moved_any_distance(entity, section);
        true
    }

    /// Whether `entity` is the one currently being ticked.
    #[must_use]
    pub fn is_ticking(&self, entity: E) -> bool {
        self.ticking.is_some_and(|(e, _)| e == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExactPositionTracker, TrackerConfig};

    fn setup() -> (EntityTrackerEngine<u32>, crate::ListenerId, SectionPos) {
        let pos = SectionPos::new(0, 4, 0);
        let mut engine = EntityTrackerEngine::new(TrackerConfig::default());
        let id = engine.add_listener(ExactPositionTracker::<u32>::new());
        engine.subscribe_sections(id, &[pos]).unwrap();
        engine.add_entity(pos, 1);
        (engine, id, pos)
    }

    fn moved(engine: &EntityTrackerEngine<u32>, id: crate::ListenerId) -> u64 {
        engine
            .listener::<ExactPositionTracker<u32>>(id)
            .unwrap()
            .moved_count()
    }

    #[test]
    fn test_tick_reports_once() {
        let (mut engine, id, pos) = setup();
        let mut motion = MotionTracker::new();

        motion.begin_tick(1, Position::new(1.0, 64.0, 1.0));
        assert!(motion.is_ticking(1));
        assert!(!motion.on_external_move(&mut engine, 1, pos));
        assert!(motion.end_tick(&mut engine, 1, Position::new(1.5, 64.0, 1.0), pos));

        assert!(!motion.is_ticking(1));
        assert_eq!(moved(&engine, id), 1);
    }

    #[test]
    fn test_idle_tick_is_silent() {
        let (mut engine, id, pos) = setup();
        let mut motion = MotionTracker::new();
        let here = Position::new(2.0, 64.0, 2.0);

        motion.begin_tick(1, here);
        assert!(!motion.end_tick(&mut engine, 1, here, pos));
        assert_eq!(moved(&engine, id), 0);
    }

    #[test]
    fn test_external_move_of_other_entity() {
        let (mut engine, id, pos) = setup();
        engine.add_entity(pos, 2);
        let mut motion = MotionTracker::new();

        motion.begin_tick(1, Position::new(0.0, 64.0, 0.0));
        assert!(motion.on_external_move(&mut engine, 2, pos));
        assert_eq!(moved(&engine, id), 1);
    }

    #[test]
    fn test_end_tick_without_begin() {
        let (mut engine, _, pos) = setup();
        let mut motion = MotionTracker::<u32>::new();
        assert!(!motion.end_tick(&mut engine, 1, Position::default(), pos));
    }
}
