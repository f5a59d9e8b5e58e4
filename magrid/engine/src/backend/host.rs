//! CPU-memory backend. Always available; the reference for the GPU kernels.

use magrid_geo::Axis;

use super::{out_of_range, ResidentBackend};
use crate::error::{RegionError, Result};
use crate::shift::shift_bytes;

/// Bytes owned by the host backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBuffer {
    bytes: Vec<u8>,
}

impl HostBuffer {
    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the bytes without a copy.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

/// Resident storage in plain CPU memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostBackend;

impl ResidentBackend for HostBackend {
    type Buffer = HostBuffer;

    fn name(&self) -> &'static str {
        "host"
    }

    fn allocate(&self, len: usize) -> Result<HostBuffer> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|e| RegionError::Allocation(format!("{len} bytes: {e}")))?;
        bytes.resize(len, 0);
        Ok(HostBuffer { bytes })
    }

    fn release(&self, buf: HostBuffer) {
        drop(buf);
    }

    fn buffer_len(&self, buf: &HostBuffer) -> usize {
        buf.len()
    }

    fn fill(&self, buf: &mut HostBuffer, value: u8) -> Result<()> {
        buf.bytes.fill(value);
        Ok(())
    }

    fn upload(&self, host: &[u8], buf: &mut HostBuffer) -> Result<()> {
        if host.len() != buf.len() {
            return Err(RegionError::Transfer(format!(
                "upload of {} bytes into buffer of {} bytes",
                host.len(),
                buf.len()
            )));
        }
        buf.bytes.copy_from_slice(host);
        Ok(())
    }

    fn download(&self, buf: &HostBuffer) -> Result<Vec<u8>> {
        Ok(buf.bytes.clone())
    }

    fn write_byte(&self, buf: &mut HostBuffer, index: usize, value: u8) -> Result<()> {
        let len = buf.len();
        let b = buf.bytes.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
        *b = value;
        Ok(())
    }

    fn shift_window(
        &self,
        dst: &mut HostBuffer,
        src: &HostBuffer,
        size: [usize; 3],
        axis: Axis,
        offset: i64,
        fill: u8,
    ) -> Result<()> {
        shift_bytes(&mut dst.bytes, &src.bytes, size, axis, offset, fill)
    }

    fn read_byte(&self, buf: &HostBuffer, index: usize) -> Result<u8> {
        buf.bytes.get(index).copied().ok_or_else(|| out_of_range(index, buf.len()))
    }
}
