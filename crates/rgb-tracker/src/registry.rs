//! Lazily populated map from section keys to tracked cells.

use hashbrown::HashMap;
use tracing::trace;

use crate::cell::TrackedCell;
use crate::{SectionPos, TrackedEntity};

/// All non-empty sections of a world, keyed by [`SectionPos::to_bits`].
#[derive(Debug)]
pub(crate) struct SectionRegistry<E> {
    sections: HashMap<u64, TrackedCell<E>>,
}

impl<E: TrackedEntity> SectionRegistry<E> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            sections: HashMap::with_capacity(capacity),
        }
    }

    /// Get the cell at `pos`, inserting an empty one if there is none.
    ///
    /// `pos` must be valid.
    pub(crate) fn get_or_create(&mut self, pos: SectionPos) -> &mut TrackedCell<E> {
        debug_assert!(pos.is_valid());
        self.sections.entry(pos.to_bits()).or_insert_with(|| {
            trace!("creating section {}", pos);
            TrackedCell::new()
        })
    }

    pub(crate) fn get(&self, pos: SectionPos) -> Option<&TrackedCell<E>> {
        if !pos.is_valid() {
            return None;
        }
        self.sections.get(&pos.to_bits())
    }

    pub(crate) fn get_mut(&mut self, pos: SectionPos) -> Option<&mut TrackedCell<E>> {
        if !pos.is_valid() {
            return None;
        }
        self.sections.get_mut(&pos.to_bits())
    }

    /// Drop the cell at `pos` if it holds neither entities nor listeners.
    pub(crate) fn remove_if_empty(&mut self, pos: SectionPos) -> bool {
        if !pos.is_valid() {
            return false;
        }

        let key = pos.to_bits();

        if self.sections.get(&key).is_some_and(TrackedCell::is_empty) {
            self.sections.remove(&key);
            trace!("pruned empty section {}", pos);
            return true;
        }

        false
    }

    pub(crate) fn len(&self) -> usize {
        self.sections.len()
    }

    /// Positions of all live sections, decoded from their keys.
    pub(crate) fn positions(&self) -> impl Iterator<Item = SectionPos> + '_ {
        self.sections.keys().map(|&key| SectionPos::from_bits(key))
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (SectionPos, &TrackedCell<E>)> + '_ {
        self.sections
            .iter()
            .map(|(&key, cell)| (SectionPos::from_bits(key), cell))
    }
}
