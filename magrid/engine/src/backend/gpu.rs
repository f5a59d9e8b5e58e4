//! wgpu backend: region bytes packed four per `u32` word in a storage buffer.
//!
//! Single-byte writes and window shifts run as compute kernels, so neither
//! goes through host memory. Fill and upload are queue writes; download is a
//! blocking map-read.

use std::sync::{mpsc, Arc};

use magrid_geo::Axis;
use wgpu::util::DeviceExt;

use super::ResidentBackend;
use crate::error::{RegionError, Result};
use crate::gpu::GpuContext;
use crate::mesh::prod;

const WORKGROUP: u32 = 64;
const MAX_GROUPS_PER_DIM: u32 = 65_535;

/// A resident allocation on the GPU.
pub struct GpuBuffer {
    buf: wgpu::Buffer,
    len: usize,
}

impl GpuBuffer {
    /// Length in region bytes (the storage buffer is padded to whole words).
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Underlying storage buffer, for kernels that consume region ids directly.
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buf
    }

    fn words(&self) -> usize {
        words(self.len)
    }
}

fn words(len: usize) -> usize {
    len.div_ceil(4).max(1)
}

#[repr(C)]
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct KernelParams {
    nx: u32,
    ny: u32,
    nz: u32,
    axis: u32,
    offset: i32,
    fill: u32,
    row_words: u32,
    index: u32,
    value: u32,
    _pad: [u32; 3],
}

/// Region bytes in wgpu storage buffers.
pub struct GpuBytes {
    ctx: Arc<GpuContext>,
    pipeline_shift: wgpu::ComputePipeline,
    bind_shift: wgpu::BindGroupLayout,
    pipeline_write: wgpu::ComputePipeline,
    bind_write: wgpu::BindGroupLayout,
}

impl GpuBytes {
    /// Build the kernels on `ctx`.
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let device = &ctx.device;
        let (pipeline_shift, bind_shift, pipeline_write, bind_write) =
            scoped(device, RegionError::Kernel, || {
                let shader_src = include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../shaders/region_bytes.wgsl"
                ));
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("region_bytes.wgsl"),
                    source: wgpu::ShaderSource::Wgsl(shader_src.into()),
                });
                let bind_shift = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("bind.shift_bytes"),
                    entries: &[params_entry(), storage_entry(1, true), storage_entry(2, false)],
                });
                let bind_write = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("bind.write_byte"),
                    entries: &[params_entry(), storage_entry(2, false)],
                });
                let pipeline_shift = pipeline(device, &module, &bind_shift, "shift_bytes");
                let pipeline_write = pipeline(device, &module, &bind_write, "write_byte");
                (pipeline_shift, bind_shift, pipeline_write, bind_write)
            })?;
        Ok(Self { ctx, pipeline_shift, bind_shift, pipeline_write, bind_write })
    }

    /// Create a device and the kernels in one go.
    pub fn blocking() -> Result<Self> {
        Self::new(Arc::new(GpuContext::blocking()?))
    }

    /// Shared context, e.g. for consumers that bind [`GpuBuffer::raw`].
    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    fn params_buf(&self, params: &KernelParams) -> wgpu::Buffer {
        self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("params"),
            contents: bytemuck::cast_slice(std::slice::from_ref(params)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    fn dispatch(
        &self,
        label: &str,
        pipeline: &wgpu::ComputePipeline,
        bind: &wgpu::BindGroup,
        groups: (u32, u32),
    ) {
        let mut encoder =
            self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            cpass.set_pipeline(pipeline);
            cpass.set_bind_group(0, bind, &[]);
            cpass.dispatch_workgroups(groups.0, groups.1, 1);
        }
        self.ctx.queue.submit(Some(encoder.finish()));
    }

    /// Copy `size` bytes at `offset` (both word aligned) back to the host.
    fn read_words(&self, buf: &wgpu::Buffer, offset: u64, size: u64) -> Result<Vec<u8>> {
        let device = &self.ctx.device;
        let read_buf = scoped(device, RegionError::Transfer, || {
            let read_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("readback"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            });
            let mut encoder =
                device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("enc.read") });
            encoder.copy_buffer_to_buffer(buf, offset, &read_buf, 0, size);
            self.ctx.queue.submit(Some(encoder.finish()));
            read_buf
        })?;
        let (tx, rx) = mpsc::channel();
        read_buf.slice(..).map_async(wgpu::MapMode::Read, move |r| {
            // Receiver outlives the poll below; a failed send only means it was dropped.
            let _ = tx.send(r);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RegionError::Transfer(format!("readback callback lost: {e}")))?
            .map_err(|e| RegionError::Transfer(format!("map readback: {e}")))?;
        let out = read_buf.slice(..).get_mapped_range().to_vec();
        read_buf.unmap();
        Ok(out)
    }
}

impl ResidentBackend for GpuBytes {
    type Buffer = GpuBuffer;

    fn name(&self) -> &'static str {
        "gpu"
    }

    fn allocate(&self, len: usize) -> Result<GpuBuffer> {
        let device = &self.ctx.device;
        let size = (words(len) * 4) as u64;
        let limits = device.limits();
        if u32::try_from(len).is_err()
            || size > limits.max_buffer_size
            || size > u64::from(limits.max_storage_buffer_binding_size)
        {
            return Err(RegionError::Allocation(format!("{len} bytes exceed device limits")));
        }
        let buf = scoped(device, RegionError::Allocation, || {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("regions"),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        })?;
        Ok(GpuBuffer { buf, len })
    }

    fn release(&self, buf: GpuBuffer) {
        buf.buf.destroy();
    }

    fn buffer_len(&self, buf: &GpuBuffer) -> usize {
        buf.len
    }

    fn fill(&self, buf: &mut GpuBuffer, value: u8) -> Result<()> {
        let word = u32::from_ne_bytes([value; 4]);
        let host = vec![word; buf.words()];
        scoped(&self.ctx.device, RegionError::Transfer, || {
            self.ctx.queue.write_buffer(&buf.buf, 0, bytemuck::cast_slice(&host));
        })
    }

    fn upload(&self, host: &[u8], buf: &mut GpuBuffer) -> Result<()> {
        if host.len() != buf.len {
            return Err(RegionError::Transfer(format!(
                "upload of {} bytes into buffer of {} bytes",
                host.len(),
                buf.len
            )));
        }
        let mut padded = vec![0u8; buf.words() * 4];
        padded[..host.len()].copy_from_slice(host);
        scoped(&self.ctx.device, RegionError::Transfer, || {
            self.ctx.queue.write_buffer(&buf.buf, 0, &padded);
        })
    }

    fn download(&self, buf: &GpuBuffer) -> Result<Vec<u8>> {
        let mut out = self.read_words(&buf.buf, 0, (buf.words() * 4) as u64)?;
        out.truncate(buf.len);
        Ok(out)
    }

    fn write_byte(&self, buf: &mut GpuBuffer, index: usize, value: u8) -> Result<()> {
        if index >= buf.len {
            return Err(super::out_of_range(index, buf.len));
        }
        let params = KernelParams {
            index: u32::try_from(index).map_err(|_| super::out_of_range(index, buf.len))?,
            value: u32::from(value),
            ..KernelParams::default()
        };
        let device = &self.ctx.device;
        scoped(device, RegionError::Transfer, || {
            let params_buf = self.params_buf(&params);
            let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("bg.write_byte"),
                layout: &self.bind_write,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: params_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: buf.buf.as_entire_binding() },
                ],
            });
            self.dispatch("write_byte", &self.pipeline_write, &bind, (1, 1));
        })
    }

    fn shift_window(
        &self,
        dst: &mut GpuBuffer,
        src: &GpuBuffer,
        size: [usize; 3],
        axis: Axis,
        offset: i64,
        fill: u8,
    ) -> Result<()> {
        let n = prod(size);
        if dst.len != n || src.len != n {
            return Err(RegionError::LengthMismatch { len: dst.len.min(src.len), size });
        }
        let to_u32 = |v: usize| {
            u32::try_from(v).map_err(|_| RegionError::Transfer(format!("{v} cells exceed kernel range")))
        };
        let along = size[axis.index()] as i64;
        // Offsets past the window only produce fill; clamping keeps them in i32.
        let offset = i32::try_from(offset.clamp(-along, along))
            .map_err(|_| RegionError::ShiftOutOfRange { dx: offset, axis })?;

        let nwords = to_u32(dst.words())?;
        let groups = nwords.div_ceil(WORKGROUP);
        let gx = groups.clamp(1, MAX_GROUPS_PER_DIM);
        let gy = groups.div_ceil(gx).max(1);
        let params = KernelParams {
            nx: to_u32(size[0])?,
            ny: to_u32(size[1])?,
            nz: to_u32(size[2])?,
            axis: axis.index() as u32,
            offset,
            fill: u32::from(fill),
            row_words: gx * WORKGROUP,
            ..KernelParams::default()
        };
        let device = &self.ctx.device;
        scoped(device, RegionError::Transfer, || {
            let params_buf = self.params_buf(&params);
            let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("bg.shift_bytes"),
                layout: &self.bind_shift,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: params_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: src.buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: dst.buf.as_entire_binding() },
                ],
            });
            self.dispatch("shift_bytes", &self.pipeline_shift, &bind, (gx, gy));
        })
    }

    fn read_byte(&self, buf: &GpuBuffer, index: usize) -> Result<u8> {
        if index >= buf.len {
            return Err(super::out_of_range(index, buf.len));
        }
        let word = self.read_words(&buf.buf, (index / 4 * 4) as u64, 4)?;
        Ok(word[index % 4])
    }
}

/// Run `f` inside validation and out-of-memory error scopes and turn any
/// captured device error into a `RegionError` instead of the default panic.
fn scoped<T>(device: &wgpu::Device, wrap: fn(String) -> RegionError, f: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let out = f();
    let oom = pollster::block_on(device.pop_error_scope());
    let validation = pollster::block_on(device.pop_error_scope());
    match oom.or(validation) {
        Some(err) => Err(wrap(err.to_string())),
        None => Ok(out),
    }
}

fn params_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<KernelParams>() as u64),
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn pipeline(
    device: &wgpu::Device,
    module: &wgpu::ShaderModule,
    layout: &wgpu::BindGroupLayout,
    entry_point: &str,
) -> wgpu::ComputePipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(entry_point),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(entry_point),
        layout: Some(&pipeline_layout),
        module,
        entry_point,
    })
}
