//! Chunk section coordinates.
//!
//! A section is a 16x16x16 cube of blocks. Sections are addressed by an
//! integer triple and stored under a bit-packed `u64` key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Edge length of a section in blocks.
pub const SECTION_SIZE: i32 = 16;

/// Lowest legal section Y coordinate.
pub const MIN_SECTION_Y: i32 = 0;

/// Highest legal section Y coordinate.
pub const MAX_SECTION_Y: i32 = 15;

/// Lowest section X or Z coordinate that packs into a key.
pub const MIN_SECTION_XZ: i32 = -(1 << 29);

/// Highest section X or Z coordinate that packs into a key.
pub const MAX_SECTION_XZ: i32 = (1 << 29) - 1;

const Y_BITS: u32 = 4;
const XZ_BITS: u32 = 30;
const Y_MASK: u64 = (1 << Y_BITS) - 1;
const XZ_MASK: u64 = (1 << XZ_BITS) - 1;
const Z_SHIFT: u32 = Y_BITS;
const X_SHIFT: u32 = Y_BITS + XZ_BITS;

/// Position of a chunk section in section space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SectionPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SectionPos {
    /// Create a section position from raw section coordinates.
    ///
    /// Only positions passing [`is_valid`](Self::is_valid) can be tracked:
    /// `y` in `0..=15`, `x` and `z` in `MIN_SECTION_XZ..=MAX_SECTION_XZ`.
    /// Every section [`from_block`](Self::from_block) yields is valid.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Section containing the given block. Y is clamped into the legal range
    /// so entities above or below the world land in the boundary section.
    #[must_use]
    pub const fn from_block(x: i32, y: i32, z: i32) -> Self {
        Self::new(x >> 4, y >> 4, z >> 4).clamped()
    }

    /// Section containing the given world position.
    #[must_use]
    pub fn from_position(pos: Position) -> Self {
        Self::from_block(
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        )
    }

    /// Whether `y` lies inside the legal vertical range.
    #[must_use]
    pub const fn is_valid_y(self) -> bool {
        self.y >= MIN_SECTION_Y && self.y <= MAX_SECTION_Y
    }

    /// Whether `x` and `z` lie inside the packable range.
    #[must_use]
    pub const fn is_valid_xz(self) -> bool {
        self.x >= MIN_SECTION_XZ
            && self.x <= MAX_SECTION_XZ
            && self.z >= MIN_SECTION_XZ
            && self.z <= MAX_SECTION_XZ
    }

    /// Whether this position can be stored under a key.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.is_valid_y() && self.is_valid_xz()
    }

    /// Copy of this position with `y` clamped into the legal range.
    #[must_use]
    pub const fn clamped(self) -> Self {
        let y = if self.y < MIN_SECTION_Y {
            MIN_SECTION_Y
        } else if self.y > MAX_SECTION_Y {
            MAX_SECTION_Y
        } else {
            self.y
        };

        Self::new(self.x, y, self.z)
    }

    /// Pack into a single `u64` key.
    ///
    /// Layout: `x` in bits 34..64, `z` in bits 4..34, `y` in bits 0..4.
    /// Lossless for every [valid](Self::is_valid) position. Callers must
    /// not pack anything else.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        debug_assert!(self.is_valid());

        (((self.x as u64) & XZ_MASK) << X_SHIFT)
            | (((self.z as u64) & XZ_MASK) << Z_SHIFT)
            | ((self.y as u64) & Y_MASK)
    }

    /// Unpack from a key produced by [`SectionPos::to_bits`].
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            x: sign_extend((bits >> X_SHIFT) & XZ_MASK),
            y: (bits & Y_MASK) as i32,
            z: sign_extend((bits >> Z_SHIFT) & XZ_MASK),
        }
    }

    /// Minimum block corner of this section.
    #[must_use]
    pub const fn min_block(self) -> (i32, i32, i32) {
        (
            self.x * SECTION_SIZE,
            self.y * SECTION_SIZE,
            self.z * SECTION_SIZE,
        )
    }
}

const fn sign_extend(value: u64) -> i32 {
    let shift = 64 - XZ_BITS;
    (((value << shift) as i64) >> shift) as i32
}

impl fmt::Debug for SectionPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionPos({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for SectionPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}
