//! Region decoding: per-region lookup tables turned into per-cell fields.

use rayon::prelude::*;

use crate::id::{RegionId, NREGION};
use crate::mirror::HostMirror;

/// Lookup table with one value per possible region id.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionLut<T> {
    table: Vec<T>,
}

impl<T: Copy> RegionLut<T> {
    /// Same value for every region.
    pub fn uniform(value: T) -> Self {
        Self { table: vec![value; NREGION] }
    }

    /// Table built from `f(id)` for each id.
    pub fn from_fn(mut f: impl FnMut(RegionId) -> T) -> Self {
        let table = (0..=u8::MAX).map(|b| f(RegionId::from(b))).collect();
        Self { table }
    }

    /// Set the value of one region.
    pub fn set_region(&mut self, id: RegionId, value: T) {
        self.table[id.index()] = value;
    }

    /// Value of one region.
    pub fn get(&self, id: RegionId) -> T {
        self.table[id.index()]
    }

    /// All 256 entries in id order.
    pub fn as_slice(&self) -> &[T] {
        &self.table
    }
}

impl RegionLut<f32> {
    /// id -> id, used for plain region output.
    pub fn identity() -> Self {
        Self::from_fn(|id| f32::from(id.get()))
    }
}

/// Per-cell field `lut[region(cell)]` in storage order. Pure read transform.
pub fn decode<T: Copy + Send + Sync>(mirror: &HostMirror, lut: &RegionLut<T>) -> Vec<T> {
    let table = lut.as_slice();
    mirror.cells().par_iter().map(|&b| table[usize::from(b)]).collect()
}
