//! Magrid engine: material regions over a structured 3D mesh.
//!
//! A [`RegionMap`] holds one region id per cell in a resident buffer owned by
//! a [`ResidentBackend`] (host memory or a wgpu storage buffer). Regions are
//! painted from [`Shape`]s, replayed after resizes, and repaired along the
//! exposed edge of a sliding window. A [`Session`] ties the map to its mesh.
#![deny(missing_docs)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::dbg_macro, clippy::large_enum_variant)]

pub mod backend;
pub mod config;
pub mod decode;
pub mod error;
pub mod gpu;
pub mod history;
pub mod id;
pub mod mesh;
pub mod mirror;
pub mod raster;
pub mod regions;
pub mod session;
pub mod shift;

pub use backend::{AnyBackend, GpuBytes, HostBackend, ResidentBackend};
pub use config::{BackendKind, MeshCfg, SessionCfg};
pub use decode::RegionLut;
pub use error::{RegionError, Result};
pub use history::{DefinitionEntry, DefinitionHistory};
pub use id::{RegionId, NREGION};
pub use magrid_geo::{range, Axis, CellMask, Shape, Vec3};
pub use mesh::Mesh;
pub use mirror::HostMirror;
pub use regions::RegionMap;
pub use session::Session;
pub use shift::ShiftStats;

/// Returns the engine version string from Cargo metadata.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
