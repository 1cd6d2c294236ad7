//! Headless simulation driving the entity tracker
//!
//! This binary:
//! 1. Spawns a deterministic population of orbiting entities
//! 2. Gives the first few of them a nearby-villager tracker
//! 3. Ticks the world, reporting moves through the engine
//! 4. Logs what the observers can see
//!
//! Configuration comes from the environment:
//! - `SIM_TICKS` - number of ticks to run
//! - `SIM_ENTITIES` - population size
//! - `SIM_OBSERVERS` - how many entities carry a tracker
//! - `RGB_TRACKER_*` - engine tuning, see `TrackerConfig::from_env`

mod world;

use std::str::FromStr;

use eyre::eyre;
use rgb_tracker::{
    EntityFilter, EntityLookup, EntityTrackerEngine, ExactPositionTracker, ListenerId, MotionTracker,
    NearbyEntityTracker, Position, SectionPos, TrackerConfig,
};
use tracing::{debug, info};

use crate::world::{SimEntity, SimWorld};

/// Observer sight range in blocks.
const OBSERVER_RANGE: f64 = 24.0;

/// Log a summary every this many ticks.
const REPORT_EVERY: u64 = 50;

/// Section watched by the pressure plate.
const PLATE_SECTION: SectionPos = SectionPos::new(0, 4, 0);

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rgb_tracker_sim=info".parse()?)
                .add_directive("rgb_tracker=info".parse()?),
        )
        .init();

    let ticks: u64 = env_or("SIM_TICKS", 200);
    let population: u32 = env_or("SIM_ENTITIES", 256);
    let observers: u32 = env_or::<u32>("SIM_OBSERVERS", 16).min(population);
    let config = TrackerConfig::from_env();

    info!(
        "Starting simulation: {} ticks, {} entities, {} observers",
        ticks, population, observers
    );
    if population == 0 {
        info!("Nothing to simulate");
        return Ok(());
    }

    let mut engine = EntityTrackerEngine::new(config);
    debug!("Tracker config: {:?}", engine.config());
    let mut world = SimWorld::new(population);

    for i in 0..observers {
        let entity = SimEntity(i);
        let filter = EntityFilter::new("villager", SimEntity::is_villager);
        let id = engine.add_listener(NearbyEntityTracker::new(entity, OBSERVER_RANGE, filter));
        world.set_listener(entity, id);
    }

    for entity in world.entities() {
        let section = section_of(&world, entity)?;
        engine.on_entity_added(section, entity, world.listener(entity))?;
    }

    let plate = engine.add_listener(ExactPositionTracker::<SimEntity>::new());
    ExactPositionTracker::register(&mut engine, plate, &[PLATE_SECTION])?;

    info!(
        "Spawned {} entities across {} sections",
        population,
        engine.section_count()
    );

    let mut motion = MotionTracker::new();
    let mut crossings = 0u64;
    let mut plate_activity = 0u64;

    for tick in 1..=ticks {
        for entity in world.entities() {
            crossings += u64::from(tick_entity(&mut engine, &mut world, &mut motion, entity, tick)?);
        }

        // A piston shoves one entity per tick from outside its own tick
        let pushed = SimEntity((tick % u64::from(population)) as u32);
        let from = section_of(&world, pushed)?;
        world.push(pushed, 0.5, 0.0);
        let to = section_of(&world, pushed)?;
        crossings += u64::from(engine.on_entity_moved(from, to, pushed, world.listener(pushed))?);
        motion.on_external_move(&mut engine, pushed, to);

        if tick % REPORT_EVERY == 0 {
            teleport_last(&mut engine, &mut world, observers, tick)?;

            if let Some(tracker) = engine.listener_mut::<ExactPositionTracker<SimEntity>>(plate) {
                plate_activity += u64::from(tracker.take_changed());
            }

            report(&engine, &world, observers, tick, crossings);
        }
    }

    engine.validate()?;

    let plate_moves = engine
        .listener::<ExactPositionTracker<SimEntity>>(plate)
        .map_or(0, ExactPositionTracker::moved_count);

    info!(
        "Simulation finished: {} section crossings, {} plate moves, plate active in {} reports",
        crossings, plate_moves, plate_activity
    );

    Ok(())
}

fn section_of(world: &SimWorld, entity: SimEntity) -> eyre::Result<SectionPos> {
    world
        .section(entity)
        .ok_or_else(|| eyre!("entity {:?} has no position", entity))
}

/// Run one entity tick. Returns whether it crossed a section boundary.
fn tick_entity(
    engine: &mut EntityTrackerEngine<SimEntity>,
    world: &mut SimWorld,
    motion: &mut MotionTracker<SimEntity>,
    entity: SimEntity,
    tick: u64,
) -> eyre::Result<bool> {
    let before = world
        .position(entity)
        .ok_or_else(|| eyre!("entity {:?} has no position", entity))?;
    let from = SectionPos::from_position(before);

    motion.begin_tick(entity, before);
    world.advance(entity, tick);

    let after = world
        .position(entity)
        .ok_or_else(|| eyre!("entity {:?} has no position", entity))?;
    let to = SectionPos::from_position(after);

    let crossed = engine.on_entity_moved(from, to, entity, world.listener(entity))?;
    motion.end_tick(engine, entity, after, to);

    Ok(crossed)
}

/// Teleport the last non-observer entity to the plate and back out.
fn teleport_last(
    engine: &mut EntityTrackerEngine<SimEntity>,
    world: &mut SimWorld,
    observers: u32,
    tick: u64,
) -> eyre::Result<()> {
    let Some(last) = world.entities().last() else {
        return Ok(());
    };

    if last.0 < observers {
        return Ok(());
    }

    let (x, y, z) = PLATE_SECTION.min_block();
    let target = if (tick / REPORT_EVERY) % 2 == 0 {
        Position::new(f64::from(x) + 8.0, f64::from(y) + 1.0, f64::from(z) + 8.0)
    } else {
        Position::new(-300.0, 70.0, 300.0)
    };

    let from = section_of(world, last)?;
    engine.before_entity_teleport(from, last);
    world.teleport(last, target);
    engine.after_entity_teleport(SectionPos::from_position(target), last);

    debug!("Teleported {:?} from {} to {:?}", last, from, target);
    Ok(())
}

fn report(
    engine: &EntityTrackerEngine<SimEntity>,
    world: &SimWorld,
    observers: u32,
    tick: u64,
    crossings: u64,
) {
    let mut watching = 0usize;
    let mut targeting = 0usize;

    for i in 0..observers {
        let Some(id) = world.listener(SimEntity(i)) else {
            continue;
        };

        let Some(tracker) = engine.listener::<NearbyEntityTracker<SimEntity>>(id) else {
            continue;
        };

        watching += tracker.len();
        if tracker.closest(world, None, |_, _| true).is_some() {
            targeting += 1;
        }
    }

    info!(
        "Tick {}: {} sections, {} crossings, observers see {} villagers, {} have a target",
        tick,
        engine.section_count(),
        crossings,
        watching,
        targeting
    );

    log_listener(engine, world.listener(SimEntity(0)));
}

fn log_listener(engine: &EntityTrackerEngine<SimEntity>, id: Option<ListenerId>) {
    if let Some(sections) = id.and_then(|id| engine.sections_of(id)) {
        debug!("Observer 0 covers {} sections", sections.len());
    }
}
