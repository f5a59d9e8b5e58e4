//! Host mirror: a disposable CPU copy of the resident region map.
//!
//! Built on demand from a download, never kept across mutations.

use crate::error::{RegionError, Result};
use crate::id::RegionId;
use crate::mesh::{cell_of, flat_index, prod};

/// Flat region bytes viewed as a `[Nz][Ny][Nx]` array.
#[derive(Debug, Clone, PartialEq)]
pub struct HostMirror {
    size: [usize; 3],
    cells: Vec<u8>,
}

impl HostMirror {
    /// View `cells` as a mesh of `size`. A length mismatch is an internal bug.
    pub fn from_flat(cells: Vec<u8>, size: [usize; 3]) -> Result<Self> {
        if cells.len() != prod(size) {
            return Err(RegionError::LengthMismatch { len: cells.len(), size });
        }
        Ok(Self { size, cells })
    }

    /// All-background mirror, the state of a freshly allocated map.
    pub fn zeros(size: [usize; 3]) -> Self {
        Self { size, cells: vec![0; prod(size)] }
    }

    /// Cell counts.
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Region of one cell.
    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> Result<RegionId> {
        let i = flat_index(ix, iy, iz, self.size)?;
        Ok(RegionId::from(self.cells[i]))
    }

    /// Overwrite one cell.
    pub fn set(&mut self, ix: usize, iy: usize, iz: usize, id: RegionId) -> Result<()> {
        let i = flat_index(ix, iy, iz, self.size)?;
        self.cells[i] = id.get();
        Ok(())
    }

    /// The `Nx` cells of row `(iy, iz)`.
    pub fn row(&self, iy: usize, iz: usize) -> Result<&[u8]> {
        let start = flat_index(0, iy, iz, self.size)?;
        Ok(&self.cells[start..start + self.size[0]])
    }

    /// Flat bytes in storage order.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Mutable flat bytes; the length is fixed by the mesh size.
    pub fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Give the bytes back, e.g. for upload.
    pub fn into_cells(self) -> Vec<u8> {
        self.cells
    }

    /// `([ix, iy, iz], id)` for every cell in storage order.
    pub fn iter_cells(&self) -> impl Iterator<Item = ([usize; 3], RegionId)> + '_ {
        let size = self.size;
        self.cells.iter().enumerate().map(move |(i, &b)| (cell_of(i, size), RegionId::from(b)))
    }
}
