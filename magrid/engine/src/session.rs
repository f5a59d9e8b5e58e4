//! Simulation session: the mesh and the region map that classifies it.

use magrid_geo::{Axis, Shape, Vec3};

use crate::backend::{AnyBackend, GpuBytes, HostBackend, ResidentBackend};
use crate::config::{BackendKind, SessionCfg};
use crate::decode::RegionLut;
use crate::error::{RegionError, Result};
use crate::id::RegionId;
use crate::mesh::Mesh;
use crate::regions::RegionMap;
use crate::shift::ShiftStats;

/// One simulation's region state. Nothing here is process-global; two
/// sessions never share a buffer.
pub struct Session<B: ResidentBackend> {
    mesh: Option<Mesh>,
    regions: RegionMap<B>,
}

impl<B: ResidentBackend> Session<B> {
    /// Unconfigured session over `backend`.
    pub fn new(backend: B) -> Self {
        Self { mesh: None, regions: RegionMap::new(backend) }
    }

    /// Configure or change the mesh geometry.
    ///
    /// The accumulated window shift is kept. An allocated region map whose
    /// cell counts change is reallocated and replayed.
    pub fn set_mesh(&mut self, size: [usize; 3], cell_size: [f64; 3]) -> Result<()> {
        let mesh = match &self.mesh {
            Some(old) => old.with_geometry(size, cell_size)?,
            None => Mesh::new(size, cell_size)?,
        };
        let changed = self.mesh.map_or(true, |old| old != mesh);
        self.mesh = Some(mesh);
        if changed && self.regions.is_allocated() {
            self.regions.resize(&mesh)?;
        }
        Ok(())
    }

    /// Current mesh.
    pub fn mesh(&self) -> Result<&Mesh> {
        self.mesh.as_ref().ok_or(RegionError::MeshNotConfigured)
    }

    /// The region map.
    pub fn regions(&self) -> &RegionMap<B> {
        &self.regions
    }

    /// Slide the simulated domain by `dx` cells along `axis`.
    pub fn shift(&mut self, axis: Axis, dx: i64) -> Result<ShiftStats> {
        let mut mesh = *self.mesh()?;
        mesh.shift_window(axis, dx);
        let stats = self.regions.shift(&mesh, axis, dx)?;
        // Commit the window only once the map has moved with it.
        self.mesh = Some(mesh);
        Ok(stats)
    }

    /// See [`RegionMap::define_region`].
    pub fn define_region(&mut self, id: i64, shape: Shape) -> Result<usize> {
        RegionId::new(id)?;
        let mesh = *self.mesh()?;
        self.regions.define_region(&mesh, id, shape)
    }

    /// See [`RegionMap::define_cell`].
    pub fn define_cell(&mut self, id: i64, ix: usize, iy: usize, iz: usize) -> Result<()> {
        RegionId::new(id)?;
        let mesh = *self.mesh()?;
        self.regions.define_cell(&mesh, id, ix, iy, iz)
    }

    /// See [`RegionMap::set_cell`].
    pub fn set_cell(&mut self, ix: usize, iy: usize, iz: usize, id: RegionId) -> Result<()> {
        let mesh = *self.mesh()?;
        self.regions.set_cell(&mesh, ix, iy, iz, id)
    }

    /// See [`RegionMap::get_cell`].
    pub fn get_cell(&self, ix: usize, iy: usize, iz: usize) -> Result<RegionId> {
        self.regions.get_cell(self.mesh()?, ix, iy, iz)
    }

    /// See [`RegionMap::region_at`].
    pub fn region_at(&self, p: Vec3) -> RegionId {
        self.regions.region_at(p)
    }

    /// See [`RegionMap::volume`].
    pub fn volume(&self, id: RegionId) -> Result<f64> {
        self.regions.volume(self.mesh()?, id)
    }

    /// See [`RegionMap::decode`].
    pub fn decode<T: Copy + Send + Sync>(&self, lut: &RegionLut<T>) -> Result<Vec<T>> {
        self.regions.decode(self.mesh()?, lut)
    }

    /// See [`RegionMap::field`].
    pub fn field(&self) -> Result<Vec<f32>> {
        self.regions.field(self.mesh()?)
    }
}

impl Session<AnyBackend> {
    /// Build a session from configuration.
    pub fn from_cfg(cfg: &SessionCfg) -> Result<Self> {
        let backend = match cfg.backend {
            BackendKind::Host => AnyBackend::Host(HostBackend),
            BackendKind::Gpu => AnyBackend::Gpu(GpuBytes::blocking()?),
            BackendKind::Auto => match GpuBytes::blocking() {
                Ok(gpu) => AnyBackend::Gpu(gpu),
                Err(e) => {
                    tracing::warn!(error = %e, "gpu backend unavailable, falling back to host");
                    AnyBackend::Host(HostBackend)
                }
            },
        };
        let mut session = Session::new(backend);
        if let Some(m) = cfg.mesh {
            session.set_mesh(m.size, m.cell_size)?;
        }
        Ok(session)
    }
}
