//! Configuration types for a region-map session.
//!
//! Plain value structs; callers fill them from whatever front end they use.

/// Where the resident region map lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU memory. Always available.
    Host,
    /// wgpu storage buffer. Fails if no adapter is present.
    Gpu,
    /// Try the GPU, fall back to the host backend.
    #[default]
    Auto,
}

/// Mesh geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshCfg {
    /// Cell counts along x, y, z
    pub size: [usize; 3],
    /// Cell edge lengths along x, y, z (world units)
    pub cell_size: [f64; 3],
}

impl Default for MeshCfg {
    fn default() -> Self {
        Self { size: [1, 1, 1], cell_size: [1.0; 3] }
    }
}

/// Session setup.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionCfg {
    /// Backend selection.
    pub backend: BackendKind,
    /// Initial mesh; `None` leaves the session unconfigured until `set_mesh`.
    pub mesh: Option<MeshCfg>,
}
