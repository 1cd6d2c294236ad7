#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::float_cmp)]

//! RGB Tracker - Chunk-section entity tracking
//!
//! Keeps, per world, which entities sit in which 16x16x16 chunk section and
//! which listeners watch each section. Listeners hear synchronously when an
//! entity enters or leaves their range, so nothing has to scan the world
//! for nearby entities every tick.
//!
//! # Key Concepts
//!
//! - **Section**: A 16-block cube addressed by [`SectionPos`]
//! - **Listener**: Anything implementing [`NearbyEntityListener`], owned by the engine
//! - **Subscription**: The cuboid (or explicit list) of sections a listener watches
//! - **Exact-position listener**: Also hears about movement inside a section
//!
//! # Example
//!
//! ```
//! use rgb_tracker::prelude::*;
//!
//! let mut engine = EntityTrackerEngine::<u32>::new(TrackerConfig::default());
//! let zombie = engine.add_listener(NearbyEntityTracker::new(1, 10.0, EntityFilter::any()));
//!
//! engine.on_entity_added(SectionPos::new(0, 4, 0), 1, Some(zombie)).unwrap();
//! engine.add_entity(SectionPos::new(1, 4, 0), 2);
//!
//! let tracker = engine.listener::<NearbyEntityTracker<u32>>(zombie).unwrap();
//! assert!(tracker.contains(2));
//! ```

mod cell;
mod config;
mod engine;
mod error;
mod exact;
mod index;
mod listener;
mod motion;
mod nearby;
mod position;
mod region;
mod registry;
mod section;

pub use config::{ENV_EXACT_POSITION, ENV_LISTENER_CAPACITY, ENV_SECTION_CAPACITY, TrackerConfig};
pub use engine::EntityTrackerEngine;
pub use error::{TrackerError, TrackerResult};
pub use exact::ExactPositionTracker;
pub use listener::{ExactPositionListener, ListenerId, NearbyEntityListener, TrackedEntity};
pub use motion::MotionTracker;
pub use nearby::{EntityFilter, EntityLookup, NearbyEntityTracker};
pub use position::{Aabb, Position};
pub use region::SectionBox;
pub use section::{MAX_SECTION_XZ, MAX_SECTION_Y, MIN_SECTION_XZ, MIN_SECTION_Y, SECTION_SIZE, SectionPos};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        EntityFilter, EntityLookup, EntityTrackerEngine, ExactPositionListener,
        ExactPositionTracker, ListenerId, MotionTracker, NearbyEntityListener,
        NearbyEntityTracker, Position, SectionPos, TrackedEntity, TrackerConfig, TrackerError,
    };
}
