//! Region ids: one byte per cell.

use std::fmt;

use crate::error::{RegionError, Result};

/// Maximum number of regions.
pub const NREGION: usize = 256;

/// Region id in `0..=255`. Id 0 is the background ("universe") region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(u8);

impl RegionId {
    /// Background region every cell starts in.
    pub const UNIVERSE: RegionId = RegionId(0);

    /// Validate a user-supplied id.
    pub fn new(id: i64) -> Result<Self> {
        u8::try_from(id).map(RegionId).map_err(|_| RegionError::InvalidRegionId(id))
    }

    /// Raw byte value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Table index for lookup tables.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl From<u8> for RegionId {
    fn from(v: u8) -> Self {
        RegionId(v)
    }
}

impl From<RegionId> for u8 {
    fn from(id: RegionId) -> Self {
        id.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
