//! Error type shared by the region map, its backends and the session.

use magrid_geo::Axis;

/// Errors surfaced by region map operations. None of them is retried.
#[derive(thiserror::Error, Debug)]
pub enum RegionError {
    /// Region id outside `0..=255`; raised before any state changes.
    #[error("region id should be 0-255, have: {0}")]
    InvalidRegionId(i64),
    /// A definition or mutation was issued before `set_mesh`.
    #[error("mesh not configured")]
    MeshNotConfigured,
    /// Mesh parameters that cannot describe a grid.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
    /// Cell index outside the mesh.
    #[error("cell ({ix}, {iy}, {iz}) outside mesh of size {size:?}")]
    CellOutOfBounds {
        /// x index
        ix: usize,
        /// y index
        iy: usize,
        /// z index
        iz: usize,
        /// Mesh cell counts
        size: [usize; 3],
    },
    /// Flat byte array does not match the 3D shape it is viewed as (internal bug).
    #[error("length mismatch: {len} cells cannot be viewed as {size:?}")]
    LengthMismatch {
        /// Actual flat length
        len: usize,
        /// Requested Nx, Ny, Nz
        size: [usize; 3],
    },
    /// Shift offset that does not fit the signed index range.
    #[error("shift offset {dx} along {axis:?} is out of range")]
    ShiftOutOfRange {
        /// Requested offset in cells
        dx: i64,
        /// Shift axis
        axis: Axis,
    },
    /// Accelerator buffer could not be allocated.
    #[error("accelerator allocation failed: {0}")]
    Allocation(String),
    /// Upload, download or kernel dispatch failed.
    #[error("accelerator transfer failed: {0}")]
    Transfer(String),
    /// Shader or pipeline creation rejected by the device.
    #[error("accelerator kernel setup failed: {0}")]
    Kernel(String),
    /// No usable GPU adapter.
    #[error("no suitable GPU adapter")]
    NoAdapter,
    /// Device request rejected by the adapter.
    #[error("request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    /// A buffer from one backend was handed to another.
    #[error("buffer does not belong to the {0} backend")]
    BackendMismatch(&'static str),
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, RegionError>;
