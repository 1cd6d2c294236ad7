//! Deterministic toy world feeding the tracker.

use rgb_tracker::{Aabb, EntityLookup, ListenerId, Position, SectionPos};

/// Entity handle used by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimEntity(pub u32);

impl SimEntity {
    /// Odd entities are villagers, even ones are zombies.
    pub fn is_villager(self) -> bool {
        self.0 % 2 == 1
    }
}

#[derive(Debug)]
struct Body {
    position: Position,
    orbit_center: Position,
    orbit_radius: f64,
    phase: f64,
    speed: f64,
    listener: Option<ListenerId>,
}

/// Entities orbiting fixed points, spread over a few dozen sections.
#[derive(Debug)]
pub struct SimWorld {
    bodies: Vec<Body>,
}

impl SimWorld {
    pub fn new(count: u32) -> Self {
        let bodies = (0..count)
            .map(|i| {
                let f = f64::from(i);
                let orbit_center = Position::new(
                    (f * 37.0) % 256.0 - 128.0,
                    64.0 + (f * 7.0) % 24.0,
                    (f * 53.0) % 256.0 - 128.0,
                );
                let phase = f * 0.618;

                Body {
                    position: orbit_center,
                    orbit_center,
                    orbit_radius: 4.0 + (f * 3.0) % 28.0,
                    phase,
                    // Some entities stand still
                    speed: if i % 5 == 0 { 0.0 } else { 0.02 + (f % 7.0) * 0.01 },
                    listener: None,
                }
            })
            .collect();

        let mut world = Self { bodies };
        for e in world.entities().collect::<Vec<_>>() {
            world.advance(e, 0);
        }
        world
    }

    pub fn entities(&self) -> impl Iterator<Item = SimEntity> + use<> {
        (0..self.bodies.len() as u32).map(SimEntity)
    }

    pub fn set_listener(&mut self, entity: SimEntity, id: ListenerId) {
        if let Some(body) = self.bodies.get_mut(entity.0 as usize) {
            body.listener = Some(id);
        }
    }

    pub fn listener(&self, entity: SimEntity) -> Option<ListenerId> {
        self.bodies.get(entity.0 as usize)?.listener
    }

    pub fn section(&self, entity: SimEntity) -> Option<SectionPos> {
        self.position(entity).map(SectionPos::from_position)
    }

    /// Move the entity to where its orbit puts it at `tick`.
    pub fn advance(&mut self, entity: SimEntity, tick: u64) {
        let Some(body) = self.bodies.get_mut(entity.0 as usize) else {
            return;
        };

        let angle = body.speed.mul_add(tick as f64, body.phase);
        body.position = Position::new(
            body.orbit_radius.mul_add(angle.cos(), body.orbit_center.x),
            body.orbit_center.y,
            body.orbit_radius.mul_add(angle.sin(), body.orbit_center.z),
        );
    }

    /// Shift an entity without it ticking, like a piston would.
    pub fn push(&mut self, entity: SimEntity, dx: f64, dz: f64) {
        if let Some(body) = self.bodies.get_mut(entity.0 as usize) {
            body.position.x += dx;
            body.position.z += dz;
        }
    }

    /// Place an entity somewhere else entirely.
    pub fn teleport(&mut self, entity: SimEntity, to: Position) {
        if let Some(body) = self.bodies.get_mut(entity.0 as usize) {
            body.position = to;
            body.orbit_center = to;
        }
    }
}

impl EntityLookup<SimEntity> for SimWorld {
    fn position(&self, entity: SimEntity) -> Option<Position> {
        self.bodies.get(entity.0 as usize).map(|body| body.position)
    }

    fn bounds(&self, entity: SimEntity) -> Option<Aabb> {
        let pos = self.position(entity)?;
        Some(Aabb::around(pos, 0.3, 0.975, 0.3))
    }

    fn is_living(&self, entity: SimEntity) -> bool {
        (entity.0 as usize) < self.bodies.len()
    }
}
