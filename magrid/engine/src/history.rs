//! Append-only log of region definitions.
//!
//! Order is both definition order and precedence: a later entry wins over an
//! earlier one wherever their shapes overlap. Single-cell overrides are never
//! recorded here, so they do not survive a replay.

use magrid_geo::{Shape, Vec3};

use crate::id::RegionId;

/// One region definition. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionEntry {
    /// Region painted by this definition
    pub id: RegionId,
    /// Cells whose centers lie inside are painted
    pub shape: Shape,
}

/// Ordered definition log owned by one session.
#[derive(Debug, Clone, Default)]
pub struct DefinitionHistory {
    entries: Vec<DefinitionEntry>,
}

impl DefinitionHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, id: RegionId, shape: Shape) {
        self.entries.push(DefinitionEntry { id, shape });
    }

    /// Entries in definition order.
    pub fn iter(&self) -> std::slice::Iter<'_, DefinitionEntry> {
        self.entries.iter()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before the first definition.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Region of the newest definition containing `p`, or the universe region.
    /// O(history length).
    pub fn region_at(&self, p: Vec3) -> RegionId {
        self.entries
            .iter()
            .rev()
            .find(|d| d.shape.contains(p))
            .map_or(RegionId::UNIVERSE, |d| d.id)
    }
}

impl<'a> IntoIterator for &'a DefinitionHistory {
    type Item = &'a DefinitionEntry;
    type IntoIter = std::slice::Iter<'a, DefinitionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
