//! Cuboids of sections watched by a listener.

use crate::section::{MAX_SECTION_XZ, MAX_SECTION_Y, MIN_SECTION_XZ, MIN_SECTION_Y, SectionPos};

/// Inclusive cuboid of sections, clipped to the legal coordinate range.
///
/// An empty box (possible when the center lies far outside that range) has
/// `min > max` on some axis and yields no sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionBox {
    pub min: SectionPos,
    pub max: SectionPos,
}

impl SectionBox {
    /// The `(2r+1)` wide cube of sections around `center`, clipped to the
    /// valid sections.
    #[must_use]
    pub fn around(center: SectionPos, radius: u32) -> Self {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        let low = |c: i32, min: i32| c.saturating_sub(r).max(min);
        let high = |c: i32, max: i32| c.saturating_add(r).min(max);

        Self {
            min: SectionPos::new(
                low(center.x, MIN_SECTION_XZ),
                low(center.y, MIN_SECTION_Y),
                low(center.z, MIN_SECTION_XZ),
            ),
            max: SectionPos::new(
                high(center.x, MAX_SECTION_XZ),
                high(center.y, MAX_SECTION_Y),
                high(center.z, MAX_SECTION_XZ),
            ),
        }
    }

    /// Whether the box contains the section.
    #[must_use]
    pub const fn contains(&self, pos: SectionPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Number of sections in the box.
    #[must_use]
    pub fn volume(&self) -> usize {
        let span = |min: i32, max: i32| (i64::from(max) - i64::from(min) + 1).max(0) as usize;

        span(self.min.x, self.max.x) * span(self.min.y, self.max.y) * span(self.min.z, self.max.z)
    }

    /// Whether the box holds no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Sections in the box, x outermost then y then z.
    pub fn sections(&self) -> impl Iterator<Item = SectionPos> + use<> {
        let Self { min, max } = *self;

        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| SectionPos::new(x, y, z)))
        })
    }

    /// Sections of `self` that are not in `other`.
    pub fn difference(&self, other: &Self) -> impl Iterator<Item = SectionPos> + use<> {
        let other = *other;
        self.sections().filter(move |pos| !other.contains(*pos))
    }
}
