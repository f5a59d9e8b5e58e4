//! Structured mesh: cell counts, cell size and the index/coordinate mapping.
//!
//! Cells are stored z-major, `(iz * Ny + iy) * Nx + ix`. All flat indexing
//! goes through [`flat_index`].

use magrid_geo::{Axis, Vec3};

use crate::error::{RegionError, Result};

/// Bounds-checked flat index of cell `(ix, iy, iz)` in a mesh of `size` cells.
#[inline]
pub fn flat_index(ix: usize, iy: usize, iz: usize, size: [usize; 3]) -> Result<usize> {
    let [nx, ny, nz] = size;
    if ix >= nx || iy >= ny || iz >= nz {
        return Err(RegionError::CellOutOfBounds { ix, iy, iz, size });
    }
    Ok((iz * ny + iy) * nx + ix)
}

/// Inverse of [`flat_index`] for an index already known to be in range.
#[inline]
pub fn cell_of(index: usize, size: [usize; 3]) -> [usize; 3] {
    let [nx, ny, _] = size;
    [index % nx, (index / nx) % ny, index / (nx * ny)]
}

/// Number of cells in a mesh of `size`.
#[inline]
pub fn prod(size: [usize; 3]) -> usize {
    size[0] * size[1] * size[2]
}

/// Read-only mesh geometry consumed by the region map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    size: [usize; 3],
    cell_size: Vec3,
    /// Accumulated window shift in world units, subtracted from cell centers.
    total_shift: Vec3,
}

impl Mesh {
    /// Mesh of `size` cells with edge lengths `cell_size`.
    pub fn new(size: [usize; 3], cell_size: [f64; 3]) -> Result<Self> {
        if size.iter().any(|&n| n == 0) {
            return Err(RegionError::InvalidMesh(format!("cell count must be positive, have {size:?}")));
        }
        if size.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n)).is_none() {
            return Err(RegionError::InvalidMesh(format!("cell count overflows: {size:?}")));
        }
        if cell_size.iter().any(|c| !c.is_finite() || *c <= 0.0) {
            return Err(RegionError::InvalidMesh(format!(
                "cell size must be finite and positive, have {cell_size:?}"
            )));
        }
        Ok(Self { size, cell_size: Vec3::from_array(cell_size), total_shift: Vec3::ZERO })
    }

    /// Same shift, new geometry. Used when the mesh is resized mid-session.
    pub fn with_geometry(&self, size: [usize; 3], cell_size: [f64; 3]) -> Result<Self> {
        let mut m = Self::new(size, cell_size)?;
        m.total_shift = self.total_shift;
        Ok(m)
    }

    /// Cell counts `[Nx, Ny, Nz]`.
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Cell count along `axis`.
    pub fn len_along(&self, axis: Axis) -> usize {
        self.size[axis.index()]
    }

    /// Total number of cells.
    pub fn ncell(&self) -> usize {
        prod(self.size)
    }

    /// Cell edge lengths.
    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// Accumulated window shift.
    pub fn total_shift(&self) -> Vec3 {
        self.total_shift
    }

    /// True when both meshes have identical cell counts, i.e. the same storage layout.
    pub fn same_geometry(&self, other: &Mesh) -> bool {
        self.size == other.size
    }

    /// Bounds-checked flat index.
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> Result<usize> {
        flat_index(ix, iy, iz, self.size)
    }

    /// World coordinate of the center of cell `(ix, iy, iz)`, including the window shift.
    pub fn index_to_coord(&self, ix: usize, iy: usize, iz: usize) -> Vec3 {
        let c = self.cell_size;
        Vec3::new(
            c.x * (ix as f64 + 0.5),
            c.y * (iy as f64 + 0.5),
            c.z * (iz as f64 + 0.5),
        )
        .sub(self.total_shift)
    }

    /// Record that the window moved by `dx` cells along `axis`: afterwards cell
    /// `i` sees the coordinate cell `i - dx` saw before.
    pub fn shift_window(&mut self, axis: Axis, dx: i64) {
        let moved = dx as f64 * self.cell_size.component(axis);
        let total = self.total_shift.component(axis) + moved;
        self.total_shift = self.total_shift.with_component(axis, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_index_is_z_major() {
        let size = [4, 3, 2];
        assert_eq!(flat_index(0, 0, 0, size).ok(), Some(0));
        assert_eq!(flat_index(1, 0, 0, size).ok(), Some(1));
        assert_eq!(flat_index(0, 1, 0, size).ok(), Some(4));
        assert_eq!(flat_index(0, 0, 1, size).ok(), Some(12));
        assert_eq!(flat_index(3, 2, 1, size).ok(), Some(23));
        assert_eq!(cell_of(23, size), [3, 2, 1]);
    }

    #[test]
    fn flat_index_rejects_outside() {
        let err = flat_index(4, 0, 0, [4, 4, 1]);
        assert!(matches!(err, Err(RegionError::CellOutOfBounds { ix: 4, .. })));
    }

    #[test]
    fn rejects_degenerate_meshes() {
        assert!(Mesh::new([0, 4, 1], [1.0; 3]).is_err());
        assert!(Mesh::new([4, 4, 1], [1.0, 0.0, 1.0]).is_err());
        assert!(Mesh::new([4, 4, 1], [1.0, f64::NAN, 1.0]).is_err());
    }

    #[test]
    fn shifted_coordinate_follows_content() -> Result<()> {
        let mut m = Mesh::new([8, 1, 1], [2.0, 1.0, 1.0])?;
        let before = m.index_to_coord(3, 0, 0);
        m.shift_window(Axis::X, 2);
        assert_eq!(m.index_to_coord(5, 0, 0), before);
        m.shift_window(Axis::X, -2);
        assert_eq!(m.index_to_coord(3, 0, 0), before);
        Ok(())
    }

    #[test]
    fn resize_keeps_shift() -> Result<()> {
        let mut m = Mesh::new([4, 4, 1], [1.0; 3])?;
        m.shift_window(Axis::Y, 3);
        let r = m.with_geometry([8, 8, 1], [1.0; 3])?;
        assert_eq!(r.total_shift(), Vec3::new(0.0, 3.0, 0.0));
        assert!(!r.same_geometry(&m));
        Ok(())
    }
}
