//! Resident region map: one byte per cell, owned by a [`ResidentBackend`].
//!
//! The resident buffer is the single source of truth. Host mirrors are taken
//! on demand and never kept across a mutation. Every [`define_region`] call is
//! recorded in the [`DefinitionHistory`] and replayed when the mesh geometry
//! changes.
//!
//! Cell overrides made with [`define_cell`] or [`set_cell`] are NOT recorded.
//! They disappear on the next resize and are not recomputed when they enter a
//! shifted window. Keep it that way: they are transient edits, and replaying
//! them would change what a resize means.
//!
//! [`define_region`]: RegionMap::define_region
//! [`define_cell`]: RegionMap::define_cell
//! [`set_cell`]: RegionMap::set_cell

use magrid_geo::{Axis, Shape, Vec3};

use crate::backend::ResidentBackend;
use crate::decode::{decode, RegionLut};
use crate::error::{RegionError, Result};
use crate::history::DefinitionHistory;
use crate::id::{RegionId, NREGION};
use crate::mesh::{flat_index, prod, Mesh};
use crate::mirror::HostMirror;
use crate::raster::rasterize;
use crate::shift::{dirty_range, ShiftStats};

/// Region classification of a mesh.
pub struct RegionMap<B: ResidentBackend> {
    backend: B,
    resident: Option<(B::Buffer, [usize; 3])>,
    history: DefinitionHistory,
}

impl<B: ResidentBackend> RegionMap<B> {
    /// Empty map over `backend`. Nothing is allocated until the first mutation.
    pub fn new(backend: B) -> Self {
        Self { backend, resident: None, history: DefinitionHistory::new() }
    }

    /// Backend holding the resident buffer.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resident buffer, if allocated.
    pub fn resident(&self) -> Option<&B::Buffer> {
        self.resident.as_ref().map(|(buf, _)| buf)
    }

    /// True once the resident buffer exists.
    pub fn is_allocated(&self) -> bool {
        self.resident.is_some()
    }

    /// Every region definition so far, oldest first.
    pub fn history(&self) -> &DefinitionHistory {
        &self.history
    }

    /// Paint `shape` with `id`, then record the definition.
    ///
    /// Later definitions win where shapes overlap. Returns the number of cells
    /// painted.
    pub fn define_region(&mut self, mesh: &Mesh, id: i64, shape: Shape) -> Result<usize> {
        let id = RegionId::new(id)?;
        self.ensure_current(mesh)?;
        let painted = match self.resident.as_mut() {
            Some((buf, _)) => paint(&self.backend, buf, mesh, id, &shape)?,
            None => return Err(RegionError::Allocation("resident buffer missing".into())),
        };
        self.history.push(id, shape);
        Ok(painted)
    }

    /// Set one cell to `id` without recording it in the history.
    pub fn define_cell(&mut self, mesh: &Mesh, id: i64, ix: usize, iy: usize, iz: usize) -> Result<()> {
        let id = RegionId::new(id)?;
        self.set_cell(mesh, ix, iy, iz, id)
    }

    /// Direct write of one resident byte. No host round trip.
    pub fn set_cell(&mut self, mesh: &Mesh, ix: usize, iy: usize, iz: usize, id: RegionId) -> Result<()> {
        let index = mesh.index(ix, iy, iz)?;
        self.ensure_current(mesh)?;
        let (buf, _) = self
            .resident
            .as_mut()
            .ok_or_else(|| RegionError::Allocation("resident buffer missing".into()))?;
        self.backend.write_byte(buf, index, id.get())
    }

    /// Region stored for one cell. An unallocated map reads as the background.
    pub fn get_cell(&self, mesh: &Mesh, ix: usize, iy: usize, iz: usize) -> Result<RegionId> {
        let index = mesh.index(ix, iy, iz)?;
        match self.current(mesh)? {
            Some(buf) => self.backend.read_byte(buf, index).map(RegionId::from),
            None => Ok(RegionId::UNIVERSE),
        }
    }

    /// Region at a world coordinate according to the history alone.
    pub fn region_at(&self, p: Vec3) -> RegionId {
        self.history.region_at(p)
    }

    /// Reallocate for `mesh` and replay the history onto a background map.
    ///
    /// The old buffer is released only once the new one is complete, so a
    /// failed resize leaves the previous map in place.
    pub fn resize(&mut self, mesh: &Mesh) -> Result<()> {
        let size = mesh.size();
        let mut buf = self.backend.allocate(mesh.ncell())?;
        if let Err(e) = self.replay(&mut buf, mesh) {
            self.backend.release(buf);
            return Err(e);
        }
        if let Some((old, _)) = self.resident.replace((buf, size)) {
            self.backend.release(old);
        }
        tracing::info!(
            backend = self.backend.name(),
            nx = size[0],
            ny = size[1],
            nz = size[2],
            replayed = self.history.len(),
            "regions.re-alloc"
        );
        Ok(())
    }

    fn replay(&self, buf: &mut B::Buffer, mesh: &Mesh) -> Result<()> {
        self.backend.fill(buf, RegionId::UNIVERSE.get())?;
        for entry in &self.history {
            paint(&self.backend, buf, mesh, entry.id, &entry.shape)?;
        }
        Ok(())
    }

    /// Slide the map contents by `dx` cells along `axis`.
    ///
    /// `mesh` must already carry the shifted coordinate space. Cells entering
    /// the window are recomputed from the history; everything else is moved
    /// as is. Shifting an unallocated map does nothing.
    pub fn shift(&mut self, mesh: &Mesh, axis: Axis, dx: i64) -> Result<ShiftStats> {
        if dx == 0 || self.resident.is_none() {
            return Ok(ShiftStats::default());
        }
        self.ensure_current(mesh)?;
        let size = mesh.size();
        let Some((src, _)) = self.resident.take() else {
            return Ok(ShiftStats::default());
        };

        let mut dst = match self.backend.allocate(prod(size)) {
            Ok(dst) => dst,
            Err(e) => {
                self.resident = Some((src, size));
                return Err(e);
            }
        };
        if let Err(e) = self.backend.shift_window(&mut dst, &src, size, axis, dx, RegionId::UNIVERSE.get()) {
            self.backend.release(dst);
            self.resident = Some((src, size));
            return Err(e);
        }
        // The new map only becomes resident once its exposed edge is repaired.
        let stats = match self.repair_edge(&mut dst, mesh, axis, dx) {
            Ok(stats) => stats,
            Err(e) => {
                self.backend.release(dst);
                self.resident = Some((src, size));
                return Err(e);
            }
        };
        self.backend.release(src);
        self.resident = Some((dst, size));
        tracing::debug!(
            axis = ?axis,
            dx,
            exposed = stats.exposed,
            repainted = stats.repainted,
            "regions.shift"
        );
        Ok(stats)
    }

    /// Recompute the cells that entered the window from the history.
    fn repair_edge(&self, buf: &mut B::Buffer, mesh: &Mesh, axis: Axis, dx: i64) -> Result<ShiftStats> {
        let size = mesh.size();
        let mut slab = [0..size[0], 0..size[1], 0..size[2]];
        slab[axis.index()] = dirty_range(mesh.len_along(axis), dx);
        let [xs, ys, zs] = slab;
        let mut stats = ShiftStats::default();
        for iz in zs {
            for iy in ys.clone() {
                for ix in xs.clone() {
                    stats.exposed += 1;
                    if self.history.is_empty() {
                        continue;
                    }
                    let id = self.history.region_at(mesh.index_to_coord(ix, iy, iz));
                    if id != RegionId::UNIVERSE {
                        self.backend.write_byte(buf, flat_index(ix, iy, iz, size)?, id.get())?;
                        stats.repainted += 1;
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Snapshot of the resident map.
    pub fn host_mirror(&self, mesh: &Mesh) -> Result<HostMirror> {
        match self.current(mesh)? {
            Some(buf) => HostMirror::from_flat(self.backend.download(buf)?, mesh.size()),
            None => Ok(HostMirror::zeros(mesh.size())),
        }
    }

    /// Fraction of cells carrying `id`.
    pub fn volume(&self, mesh: &Mesh, id: RegionId) -> Result<f64> {
        let mirror = self.host_mirror(mesh)?;
        let n = mirror.cells().iter().filter(|&&b| b == id.get()).count();
        Ok(n as f64 / mirror.cells().len() as f64)
    }

    /// Fractions of all 256 regions from a single scan.
    pub fn volumes(&self, mesh: &Mesh) -> Result<Vec<f64>> {
        let mirror = self.host_mirror(mesh)?;
        let mut counts = vec![0usize; NREGION];
        for &b in mirror.cells() {
            counts[usize::from(b)] += 1;
        }
        let total = mirror.cells().len() as f64;
        Ok(counts.into_iter().map(|c| c as f64 / total).collect())
    }

    /// Per-cell field `lut[region]` in storage order.
    pub fn decode<T: Copy + Send + Sync>(&self, mesh: &Mesh, lut: &RegionLut<T>) -> Result<Vec<T>> {
        Ok(decode(&self.host_mirror(mesh)?, lut))
    }

    /// Region ids as a float field, the plain diagnostic output.
    pub fn field(&self, mesh: &Mesh) -> Result<Vec<f32>> {
        self.decode(mesh, &RegionLut::identity())
    }

    /// Allocate on first use, reallocate and replay when the cell counts moved.
    fn ensure_current(&mut self, mesh: &Mesh) -> Result<()> {
        match &self.resident {
            Some((_, size)) if *size == mesh.size() => Ok(()),
            Some(_) => self.resize(mesh),
            // A failed resize may have left nothing resident; rebuild from history.
            None if !self.history.is_empty() => self.resize(mesh),
            None => {
                let mut buf = self.backend.allocate(mesh.ncell())?;
                self.backend.fill(&mut buf, RegionId::UNIVERSE.get())?;
                let size = mesh.size();
                tracing::info!(
                    backend = self.backend.name(),
                    nx = size[0],
                    ny = size[1],
                    nz = size[2],
                    "regions.alloc"
                );
                self.resident = Some((buf, size));
                Ok(())
            }
        }
    }

    /// Resident buffer for reads. A size mismatch means the caller skipped a
    /// resize, which is an internal error rather than a stale read.
    fn current(&self, mesh: &Mesh) -> Result<Option<&B::Buffer>> {
        match &self.resident {
            Some((buf, size)) if *size == mesh.size() => Ok(Some(buf)),
            Some((_, size)) => Err(RegionError::LengthMismatch { len: prod(*size), size: mesh.size() }),
            None => Ok(None),
        }
    }
}

impl<B: ResidentBackend> Drop for RegionMap<B> {
    fn drop(&mut self) {
        if let Some((buf, _)) = self.resident.take() {
            self.backend.release(buf);
        }
    }
}

/// Download, rasterize on the host, upload. Cells outside `shape` keep their id.
fn paint<B: ResidentBackend>(
    backend: &B,
    buf: &mut B::Buffer,
    mesh: &Mesh,
    id: RegionId,
    shape: &Shape,
) -> Result<usize> {
    let mut mirror = HostMirror::from_flat(backend.download(buf)?, mesh.size())?;
    let painted = rasterize(&mut mirror, mesh, id, shape)?;
    tracing::debug!(region = id.get(), painted, "regions.render");
    backend.upload(mirror.cells(), buf)?;
    tracing::debug!(bytes = mirror.cells().len(), "regions.upload");
    Ok(painted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostBackend;
    use magrid_geo::range;

    fn mesh4() -> Result<Mesh> {
        Mesh::new([4, 4, 1], [1.0; 3])
    }

    #[test]
    fn unallocated_reads_as_background() -> Result<()> {
        let mesh = mesh4()?;
        let map = RegionMap::new(HostBackend);
        assert!(!map.is_allocated());
        assert_eq!(map.get_cell(&mesh, 3, 3, 0)?, RegionId::UNIVERSE);
        assert_eq!(map.volume(&mesh, RegionId::UNIVERSE)?, 1.0);
        assert!(!map.is_allocated());
        Ok(())
    }

    #[test]
    fn invalid_id_leaves_state_untouched() -> Result<()> {
        let mesh = mesh4()?;
        let mut map = RegionMap::new(HostBackend);
        let res = map.define_region(&mesh, 256, Shape::Universe);
        assert!(matches!(res, Err(RegionError::InvalidRegionId(256))));
        assert!(!map.is_allocated());
        assert!(map.history().is_empty());
        Ok(())
    }

    #[test]
    fn shift_of_unallocated_map_is_noop() -> Result<()> {
        let mesh = mesh4()?;
        let mut map = RegionMap::new(HostBackend);
        assert_eq!(map.shift(&mesh, Axis::X, 2)?, ShiftStats::default());
        assert!(!map.is_allocated());
        Ok(())
    }

    #[test]
    fn read_with_stale_mesh_is_an_invariant_error() -> Result<()> {
        let mesh = mesh4()?;
        let mut map = RegionMap::new(HostBackend);
        map.define_region(&mesh, 1, range(Axis::X, 0.0, 2.0))?;
        let bigger = mesh.with_geometry([8, 8, 1], [1.0; 3])?;
        assert!(matches!(map.host_mirror(&bigger), Err(RegionError::LengthMismatch { .. })));
        Ok(())
    }

    #[test]
    fn repair_counts_exposed_slab() -> Result<()> {
        let mut mesh = mesh4()?;
        let mut map = RegionMap::new(HostBackend);
        map.define_region(&mesh, 2, Shape::Universe)?;
        mesh.shift_window(Axis::Y, -1);
        let stats = map.shift(&mesh, Axis::Y, -1)?;
        assert_eq!(stats, ShiftStats { exposed: 4, repainted: 4 });
        assert_eq!(map.volume(&mesh, RegionId::from(2))?, 1.0);
        Ok(())
    }

    #[test]
    fn volumes_cover_all_ids() -> Result<()> {
        let mesh = mesh4()?;
        let mut map = RegionMap::new(HostBackend);
        map.define_region(&mesh, 9, range(Axis::Y, 0.0, 1.0))?;
        let v = map.volumes(&mesh)?;
        assert_eq!(v.len(), NREGION);
        assert_eq!(v[9], 0.25);
        assert_eq!(v[0], 0.75);
        Ok(())
    }
}
