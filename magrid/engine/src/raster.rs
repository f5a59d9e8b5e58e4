//! Rasterizer: paints a shape's region id into a host mirror.
//!
//! Painter's algorithm. Cells outside the shape keep whatever the mirror
//! already holds, so the mirror must start from the current map. Cost is
//! O(cell count) shape evaluations per call.

use magrid_geo::Shape;
use rayon::prelude::*;

use crate::error::{RegionError, Result};
use crate::id::RegionId;
use crate::mesh::{cell_of, Mesh};
use crate::mirror::HostMirror;

/// Overwrite every cell whose center lies inside `shape` with `id`.
/// Returns the number of cells painted.
pub fn rasterize(mirror: &mut HostMirror, mesh: &Mesh, id: RegionId, shape: &Shape) -> Result<usize> {
    if mirror.size() != mesh.size() {
        return Err(RegionError::LengthMismatch { len: mirror.cells().len(), size: mesh.size() });
    }
    let [nx, ny, _] = mesh.size();
    let slab_size = [nx, ny, 1];
    let byte = id.get();

    // z slabs are disjoint, so painting them in parallel matches a sequential pass.
    let painted: usize = mirror
        .cells_mut()
        .par_chunks_exact_mut(nx * ny)
        .enumerate()
        .map(|(iz, slab)| {
            let mut n = 0usize;
            for (j, cell) in slab.iter_mut().enumerate() {
                let [ix, iy, _] = cell_of(j, slab_size);
                if shape.contains(mesh.index_to_coord(ix, iy, iz)) {
                    *cell = byte;
                    n += 1;
                }
            }
            n
        })
        .sum();
    Ok(painted)
}
