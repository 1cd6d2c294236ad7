//! Integration tests for rgb-tracker

use std::collections::BTreeSet;

use rgb_tracker::prelude::*;
use rgb_tracker::{Aabb, SectionBox};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Entered(u32),
    Left(u32),
    Initial,
}

#[derive(Debug)]
struct Recorder {
    range: u32,
    events: Vec<Event>,
}

impl Recorder {
    fn new(range: u32) -> Self {
        Self {
            range,
            events: Vec::new(),
        }
    }
}

impl NearbyEntityListener<u32> for Recorder {
    fn chunk_range(&self) -> u32 {
        self.range
    }

    fn on_entity_entered_range(&mut self, entity: u32) {
        self.events.push(Event::Entered(entity));
    }

    fn on_entity_left_range(&mut self, entity: u32) {
        self.events.push(Event::Left(entity));
    }

    fn on_initial_entities_received(&mut self) {
        self.events.push(Event::Initial);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine() -> EntityTrackerEngine<u32> {
    init_tracing();
    EntityTrackerEngine::new(TrackerConfig::default())
}

fn events(engine: &EntityTrackerEngine<u32>, id: ListenerId) -> Vec<Event> {
    engine.listener::<Recorder>(id).unwrap().events.clone()
}

fn clear(engine: &mut EntityTrackerEngine<u32>, id: ListenerId) {
    engine.listener_mut::<Recorder>(id).unwrap().events.clear();
}

fn live_sections(engine: &EntityTrackerEngine<u32>) -> BTreeSet<SectionPos> {
    engine.section_positions().collect()
}

// ============================================================================
// Subscription Scenarios
// ============================================================================

#[test]
fn test_subscribe_sees_existing_entity_then_initial() {
    let mut engine = engine();
    let origin = SectionPos::new(0, 4, 0);

    engine.add_entity(origin, 1);
    let id = engine.add_listener(Recorder::new(1));
    engine.subscribe(id, origin).unwrap();

    assert_eq!(events(&engine, id), vec![Event::Entered(1), Event::Initial]);
}

#[test]
fn test_move_out_of_range_leaves_once() {
    let mut engine = engine();
    let origin = SectionPos::new(0, 4, 0);

    engine.add_entity(origin, 1);
    let id = engine.add_listener(Recorder::new(1));
    engine.subscribe(id, origin).unwrap();
    clear(&mut engine, id);

    assert!(engine.move_entity(origin, SectionPos::new(5, 4, 0), 1));
    assert_eq!(events(&engine, id), vec![Event::Left(1)]);
    engine.validate().unwrap();
}

#[test]
fn test_only_covering_listener_is_notified() {
    let mut engine = engine();

    let l1 = engine.add_listener(Recorder::new(1));
    engine.subscribe(l1, SectionPos::new(0, 0, 0)).unwrap();
    let l2 = engine.add_listener(Recorder::new(1));
    engine.subscribe(l2, SectionPos::new(2, 0, 0)).unwrap();
    clear(&mut engine, l1);
    clear(&mut engine, l2);

    engine.add_entity(SectionPos::new(-1, 0, 0), 4);

    assert_eq!(events(&engine, l1), vec![Event::Entered(4)]);
    assert!(events(&engine, l2).is_empty());
}

#[test]
fn test_vertical_clipping_at_top() {
    let mut engine = engine();
    let id = engine.add_listener(Recorder::new(3));
    engine.subscribe(id, SectionPos::new(0, 15, 0)).unwrap();

    let sections = engine.sections_of(id).unwrap();
    assert_eq!(sections.len(), 7 * 4 * 7);
    assert!(sections.iter().all(|s| (12..=15).contains(&s.y)));

    engine.relocate(id, SectionPos::new(0, 15, 0), SectionPos::new(1, 15, 0)).unwrap();
    assert!(engine.section_positions().all(|s| (0..=15).contains(&s.y)));
    engine.validate().unwrap();
}

#[test]
fn test_vertical_clipping_at_bottom() {
    let mut engine = engine();
    let id = engine.add_listener(Recorder::new(2));
    engine.subscribe(id, SectionPos::new(0, 0, 0)).unwrap();

    let sections = engine.sections_of(id).unwrap();
    assert_eq!(sections.len(), SectionBox::around(SectionPos::new(0, 0, 0), 2).volume());
    assert!(sections.iter().all(|s| (0..=2).contains(&s.y)));
}

#[test]
fn test_explicit_sections() {
    let mut engine = engine();
    let a = SectionPos::new(4, 4, 4);
    let b = SectionPos::new(9, 1, -3);
    engine.add_entity(b, 8);

    let id = engine.add_listener(Recorder::new(1));
    engine
        .subscribe_sections(id, &[a, b, SectionPos::new(0, 16, 0), a])
        .unwrap();

    assert_eq!(engine.sections_of(id), Some(&[a, b][..]));
    assert_eq!(events(&engine, id), vec![Event::Entered(8), Event::Initial]);

    // Explicit subscriptions have no center to relocate from
    let err = engine.relocate(id, a, b).unwrap_err();
    assert!(matches!(err, TrackerError::CenterMismatch { actual: None, .. }));
    engine.validate().unwrap();
}

// ============================================================================
// Round Trips and Relocation
// ============================================================================

#[test]
fn test_subscribe_unsubscribe_restores_sections() {
    let mut engine = engine();
    engine.add_entity(SectionPos::new(0, 4, 0), 1);
    engine.add_entity(SectionPos::new(1, 5, 1), 2);
    engine.add_entity(SectionPos::new(30, 4, 30), 3);

    let before = live_sections(&engine);

    let id = engine.add_listener(Recorder::new(2));
    engine.subscribe(id, SectionPos::new(0, 4, 0)).unwrap();
    assert!(engine.section_count() > before.len());

    engine.unsubscribe(id).unwrap();
    assert_eq!(live_sections(&engine), before);
    assert_eq!(
        events(&engine, id)
            .iter()
            .filter(|e| matches!(e, Event::Left(_)))
            .count(),
        2
    );
}

#[test]
fn test_relocate_to_same_center_is_silent() {
    let mut engine = engine();
    let center = SectionPos::new(2, 6, 2);
    engine.add_entity(center, 1);

    let id = engine.add_listener(Recorder::new(2));
    engine.subscribe(id, center).unwrap();
    clear(&mut engine, id);
    let record = engine.sections_of(id).unwrap().to_vec();

    engine.relocate(id, center, center).unwrap();

    assert!(events(&engine, id).is_empty());
    assert_eq!(engine.sections_of(id).unwrap(), record.as_slice());
}

#[test]
fn test_relocate_only_touches_difference() {
    let mut engine = engine();
    let from = SectionPos::new(0, 4, 0);
    let to = SectionPos::new(1, 4, 0);

    // One entity per interesting region: leaving, shared, entering
    engine.add_entity(SectionPos::new(-1, 4, 0), 10);
    engine.add_entity(SectionPos::new(0, 4, 0), 20);
    engine.add_entity(SectionPos::new(1, 4, 1), 21);
    engine.add_entity(SectionPos::new(2, 4, 0), 30);

    let id = engine.add_listener(Recorder::new(1));
    engine.subscribe(id, from).unwrap();
    clear(&mut engine, id);

    engine.relocate(id, from, to).unwrap();

    assert_eq!(events(&engine, id), vec![Event::Left(10), Event::Entered(30)]);

    let recorded: BTreeSet<_> = engine.sections_of(id).unwrap().iter().copied().collect();
    let expected: BTreeSet<_> = SectionBox::around(to, 1).sections().collect();
    assert_eq!(recorded, expected);
    assert!(engine.listeners_in(SectionPos::new(-1, 4, 0)).is_empty());
    engine.validate().unwrap();
}

#[test]
fn test_relocate_far_away() {
    let mut engine = engine();
    let from = SectionPos::new(0, 4, 0);
    let to = SectionPos::new(100, 4, -100);

    let id = engine.add_listener(Recorder::new(1));
    engine.subscribe(id, from).unwrap();
    engine.relocate(id, from, to).unwrap();

    assert!(!engine.contains_section(from));
    assert!(engine.contains_section(to));
    assert_eq!(engine.section_count(), 27);
    engine.validate().unwrap();
}

// ============================================================================
// Error Paths
// ============================================================================

#[test]
fn test_duplicate_subscription_message_lists_sections() {
    let mut engine = engine();
    let id = engine.add_listener(Recorder::new(1));
    engine.subscribe(id, SectionPos::new(0, 0, 0)).unwrap();

    let err = engine.subscribe(id, SectionPos::new(3, 3, 3)).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("adding entity listener a second time"));
    assert!(message.contains("[3, 3, 3]"));
    assert!(message.contains("[-1, 0, -1]"));
    assert!(engine.listeners_in(SectionPos::new(3, 3, 3)).is_empty());
}

#[test]
fn test_unknown_listener() {
    let mut engine = engine();
    let id = engine.add_listener(Recorder::new(1));
    engine.remove_listener(id).unwrap();

    assert_eq!(
        engine.subscribe(id, SectionPos::new(0, 0, 0)),
        Err(TrackerError::UnknownListener { listener: id })
    );
    assert_eq!(engine.section_count(), 0);
}

#[test]
fn test_entity_listener_rejected_before_entity_is_added() {
    let mut engine = engine();
    let id = engine.add_listener(Recorder::new(1));
    engine.subscribe(id, SectionPos::new(0, 4, 0)).unwrap();

    let result = engine.on_entity_added(SectionPos::new(9, 4, 9), 5, Some(id));
    assert!(matches!(result, Err(TrackerError::AlreadyListening { .. })));
    assert!(!engine.contains_entity(SectionPos::new(9, 4, 9), 5));
}

#[test]
fn test_duplicate_entity_add_is_noop() {
    let mut engine = engine();
    let pos = SectionPos::new(0, 4, 0);
    let id = engine.add_listener(Recorder::new(1));
    engine.subscribe(id, pos).unwrap();
    clear(&mut engine, id);

    assert!(engine.add_entity(pos, 1));
    assert!(!engine.add_entity(pos, 1));
    assert!(!engine.remove_entity(SectionPos::new(1, 4, 0), 1));

    assert_eq!(events(&engine, id), vec![Event::Entered(1)]);
}

// ============================================================================
// Derived Observers
// ============================================================================

struct World {
    positions: Vec<Position>,
}

impl EntityLookup<u32> for World {
    fn position(&self, entity: u32) -> Option<Position> {
        self.positions.get(entity as usize).copied()
    }

    fn bounds(&self, entity: u32) -> Option<Aabb> {
        self.position(entity).map(|p| Aabb::around(p, 0.3, 0.9, 0.3))
    }

    fn is_living(&self, _entity: u32) -> bool {
        true
    }
}

#[test]
fn test_nearby_tracker_range_cutoff() {
    let mut engine = engine();
    let world = World {
        positions: vec![Position::new(0.0, 64.0, 0.0), Position::new(6.0, 64.0, 0.0)],
    };

    let anchor_section = SectionPos::from_position(world.positions[0]);
    let id = engine.add_listener(NearbyEntityTracker::new(0, 5.0, EntityFilter::any()));
    engine.on_entity_added(anchor_section, 0, Some(id)).unwrap();
    engine.add_entity(SectionPos::from_position(world.positions[1]), 1);

    let tracker = engine.listener::<NearbyEntityTracker<u32>>(id).unwrap();
    assert!(tracker.contains(1));
    assert_eq!(tracker.closest(&world, None, |_, _| true), None);
}

#[test]
fn test_nearby_tracker_follows_anchor() {
    let mut engine = engine();
    let odd = EntityFilter::new("odd", |e: u32| e % 2 == 1);
    let id = engine.add_listener(NearbyEntityTracker::new(0, 10.0, odd));

    let start = SectionPos::new(0, 4, 0);
    engine.on_entity_added(start, 0, Some(id)).unwrap();
    engine.add_entity(SectionPos::new(-1, 4, 0), 1);
    engine.add_entity(SectionPos::new(1, 4, 0), 2);
    engine.add_entity(SectionPos::new(2, 4, 0), 3);

    {
        let tracker = engine.listener::<NearbyEntityTracker<u32>>(id).unwrap();
        assert_eq!(tracker.entities().collect::<BTreeSet<_>>(), BTreeSet::from([1]));
    }

    engine
        .on_entity_moved(start, SectionPos::new(1, 4, 0), 0, Some(id))
        .unwrap();

    let tracker = engine.listener::<NearbyEntityTracker<u32>>(id).unwrap();
    assert_eq!(tracker.entities().collect::<BTreeSet<_>>(), BTreeSet::from([3]));
    engine.validate().unwrap();
}

#[test]
fn test_exact_tracker_with_motion() {
    let mut engine = engine();
    let pos = SectionPos::new(0, 4, 0);
    let id = engine.add_listener(ExactPositionTracker::<u32>::new());
    ExactPositionTracker::register(&mut engine, id, &[pos]).unwrap();
    engine.add_entity(pos, 1);

    let mut motion = MotionTracker::new();
    motion.begin_tick(1, Position::new(1.0, 64.0, 1.0));
    motion.on_external_move(&mut engine, 1, pos);
    motion.end_tick(&mut engine, 1, Position::new(2.0, 64.0, 1.0), pos);

    let tracker = engine.listener_mut::<ExactPositionTracker<u32>>(id).unwrap();
    assert_eq!(tracker.moved_count(), 1);
    assert!(tracker.take_changed());

    ExactPositionTracker::deregister(&mut engine, id).unwrap();
    assert!(!engine.is_subscribed(id));
    engine.validate().unwrap();
}
