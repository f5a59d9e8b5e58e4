//! Accelerator buffer backends for the resident region map.
//!
//! The region map only talks to [`ResidentBackend`]; where the bytes live is
//! the backend's business. [`HostBackend`] keeps them in CPU memory, [`GpuBytes`]
//! in a wgpu storage buffer.

pub mod gpu;
pub mod host;

use magrid_geo::Axis;

use crate::error::{RegionError, Result};

pub use gpu::{GpuBuffer, GpuBytes};
pub use host::{HostBackend, HostBuffer};

/// Byte-buffer contract the region map depends on. All calls are blocking.
pub trait ResidentBackend {
    /// Owned handle of one allocation.
    type Buffer;

    /// Short backend name for logs and errors.
    fn name(&self) -> &'static str;

    /// Allocate `len` bytes. Contents are unspecified until `fill` or `upload`.
    fn allocate(&self, len: usize) -> Result<Self::Buffer>;

    /// Free an allocation.
    fn release(&self, buf: Self::Buffer);

    /// Length in bytes of an allocation.
    fn buffer_len(&self, buf: &Self::Buffer) -> usize;

    /// Set every byte to `value`.
    fn fill(&self, buf: &mut Self::Buffer, value: u8) -> Result<()>;

    /// Copy `host` into the buffer; lengths must match.
    fn upload(&self, host: &[u8], buf: &mut Self::Buffer) -> Result<()>;

    /// Copy the buffer out.
    fn download(&self, buf: &Self::Buffer) -> Result<Vec<u8>>;

    /// Overwrite one byte in place.
    fn write_byte(&self, buf: &mut Self::Buffer, index: usize, value: u8) -> Result<()>;

    /// `dst = src` translated by `offset` cells along `axis` of a z-major
    /// `size` grid; cells entering from outside get `fill`.
    fn shift_window(
        &self,
        dst: &mut Self::Buffer,
        src: &Self::Buffer,
        size: [usize; 3],
        axis: Axis,
        offset: i64,
        fill: u8,
    ) -> Result<()>;

    /// Read one byte. Default goes through a full download.
    fn read_byte(&self, buf: &Self::Buffer, index: usize) -> Result<u8> {
        let host = self.download(buf)?;
        host.get(index).copied().ok_or_else(|| out_of_range(index, host.len()))
    }
}

pub(crate) fn out_of_range(index: usize, len: usize) -> RegionError {
    RegionError::Transfer(format!("byte {index} outside buffer of {len} bytes"))
}

/// Backend chosen at runtime from configuration.
pub enum AnyBackend {
    /// CPU memory
    Host(HostBackend),
    /// wgpu storage buffers
    Gpu(GpuBytes),
}

/// Allocation of an [`AnyBackend`].
pub enum AnyBuffer {
    /// Host bytes
    Host(HostBuffer),
    /// GPU buffer
    Gpu(GpuBuffer),
}

impl ResidentBackend for AnyBackend {
    type Buffer = AnyBuffer;

    fn name(&self) -> &'static str {
        match self {
            AnyBackend::Host(b) => b.name(),
            AnyBackend::Gpu(b) => b.name(),
        }
    }

    fn allocate(&self, len: usize) -> Result<AnyBuffer> {
        match self {
            AnyBackend::Host(b) => b.allocate(len).map(AnyBuffer::Host),
            AnyBackend::Gpu(b) => b.allocate(len).map(AnyBuffer::Gpu),
        }
    }

    fn release(&self, buf: AnyBuffer) {
        match (self, buf) {
            (AnyBackend::Host(b), AnyBuffer::Host(buf)) => b.release(buf),
            (AnyBackend::Gpu(b), AnyBuffer::Gpu(buf)) => b.release(buf),
            (backend, _) => {
                // Dropping still frees it; the caller mixed backends.
                tracing::warn!(backend = backend.name(), "release of a foreign buffer");
            }
        }
    }

    fn buffer_len(&self, buf: &AnyBuffer) -> usize {
        match buf {
            AnyBuffer::Host(b) => b.len(),
            AnyBuffer::Gpu(b) => b.len(),
        }
    }

    fn fill(&self, buf: &mut AnyBuffer, value: u8) -> Result<()> {
        match (self, buf) {
            (AnyBackend::Host(b), AnyBuffer::Host(buf)) => b.fill(buf, value),
            (AnyBackend::Gpu(b), AnyBuffer::Gpu(buf)) => b.fill(buf, value),
            _ => Err(RegionError::BackendMismatch(self.name())),
        }
    }

    fn upload(&self, host: &[u8], buf: &mut AnyBuffer) -> Result<()> {
        match (self, buf) {
            (AnyBackend::Host(b), AnyBuffer::Host(buf)) => b.upload(host, buf),
            (AnyBackend::Gpu(b), AnyBuffer::Gpu(buf)) => b.upload(host, buf),
            _ => Err(RegionError::BackendMismatch(self.name())),
        }
    }

    fn download(&self, buf: &AnyBuffer) -> Result<Vec<u8>> {
        match (self, buf) {
            (AnyBackend::Host(b), AnyBuffer::Host(buf)) => b.download(buf),
            (AnyBackend::Gpu(b), AnyBuffer::Gpu(buf)) => b.download(buf),
            _ => Err(RegionError::BackendMismatch(self.name())),
        }
    }

    fn write_byte(&self, buf: &mut AnyBuffer, index: usize, value: u8) -> Result<()> {
        match (self, buf) {
            (AnyBackend::Host(b), AnyBuffer::Host(buf)) => b.write_byte(buf, index, value),
            (AnyBackend::Gpu(b), AnyBuffer::Gpu(buf)) => b.write_byte(buf, index, value),
            _ => Err(RegionError::BackendMismatch(self.name())),
        }
    }

    fn shift_window(
        &self,
        dst: &mut AnyBuffer,
        src: &AnyBuffer,
        size: [usize; 3],
        axis: Axis,
        offset: i64,
        fill: u8,
    ) -> Result<()> {
        match (self, dst, src) {
            (AnyBackend::Host(b), AnyBuffer::Host(dst), AnyBuffer::Host(src)) => {
                b.shift_window(dst, src, size, axis, offset, fill)
            }
            (AnyBackend::Gpu(b), AnyBuffer::Gpu(dst), AnyBuffer::Gpu(src)) => {
                b.shift_window(dst, src, size, axis, offset, fill)
            }
            _ => Err(RegionError::BackendMismatch(self.name())),
        }
    }

    fn read_byte(&self, buf: &AnyBuffer, index: usize) -> Result<u8> {
        match (self, buf) {
            (AnyBackend::Host(b), AnyBuffer::Host(buf)) => b.read_byte(buf, index),
            (AnyBackend::Gpu(b), AnyBuffer::Gpu(buf)) => b.read_byte(buf, index),
            _ => Err(RegionError::BackendMismatch(self.name())),
        }
    }
}
