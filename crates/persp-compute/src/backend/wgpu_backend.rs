//! wgpu backend: warp and composite as compute shaders.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::debug;
use wgpu::util::DeviceExt;

use super::{Backend, RowBand, WarpPrimitives, acceleration_enabled};
use crate::kernels::Filter;
use crate::shaders;
use crate::{ComputeError, ComputeImage, ComputeResult};

// =============================================================================
// Uniform Buffers
// =============================================================================

/// Four u32 values: dimensions or a band range.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

/// Rows of the inverse homography, padded to vec4.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct InverseUniform {
    rows: [[f32; 4]; 3],
}

impl InverseUniform {
    fn new(h: &[f32; 9]) -> Self {
        Self {
            rows: [
                [h[0], h[1], h[2], 0.0],
                [h[3], h[4], h[5], 0.0],
                [h[6], h[7], h[8], 0.0],
            ],
        }
    }
}

// =============================================================================
// WgpuPrimitives
// =============================================================================

struct Pipelines {
    warp: wgpu::ComputePipeline,
    composite: wgpu::ComputePipeline,
}

/// wgpu device with the warp and composite pipelines.
pub struct WgpuPrimitives {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: Pipelines,
    max_buffer_bytes: u64,
    max_workgroups: u32,
}

impl WgpuPrimitives {
    /// Check if an adapter can be acquired.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Create device, queue and pipelines.
    pub fn new() -> ComputeResult<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Create device, queue and pipelines asynchronously.
    pub async fn new_async() -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("persp_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let info = adapter.get_info();
        debug!(adapter = %info.name, backend = ?info.backend, "wgpu device created");

        let pipelines = Self::create_pipelines(&device);
        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            pipelines,
            max_buffer_bytes: adapter_limits
                .max_buffer_size
                .min(adapter_limits.max_storage_buffer_binding_size as u64),
            max_workgroups: adapter_limits.max_compute_workgroups_per_dimension,
        })
    }

    fn create_pipelines(device: &wgpu::Device) -> Pipelines {
        let create_pipeline = |source: &str, label: &str| -> wgpu::ComputePipeline {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: None,
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        Pipelines {
            warp: create_pipeline(shaders::WARP_PERSPECTIVE, "warp_pipeline"),
            composite: create_pipeline(shaders::COMPOSITE_OVER, "composite_pipeline"),
        }
    }

    fn ensure_enabled(&self) -> ComputeResult<()> {
        if acceleration_enabled() {
            Ok(())
        } else {
            Err(ComputeError::BackendNotAvailable(
                "acceleration flag is off".into(),
            ))
        }
    }

    fn check_size(&self, bytes: u64) -> ComputeResult<()> {
        if bytes > self.max_buffer_bytes {
            return Err(ComputeError::ImageTooLarge {
                bytes,
                limit: self.max_buffer_bytes,
            });
        }
        Ok(())
    }

    fn create_dims_buffer(&self, dims: [u32; 4], label: &str) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&DimsUniform { dims }),
                usage: wgpu::BufferUsages::UNIFORM,
            })
    }

    fn upload(&self, data: &[f32], label: &str) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            })
    }

    fn download(&self, buffer: &wgpu::Buffer, size: u64) -> ComputeResult<Vec<f32>> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("Map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("Map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }

    fn dispatch_and_wait(
        &self,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        workgroups: (u32, u32, u32),
    ) -> ComputeResult<()> {
        let largest = workgroups.0.max(workgroups.1).max(workgroups.2);
        if largest > self.max_workgroups {
            return Err(ComputeError::OperationFailed(format!(
                "dispatch of {largest} workgroups exceeds device limit {}",
                self.max_workgroups
            )));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("compute_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, workgroups.2);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
        Ok(())
    }
}

impl WarpPrimitives for WgpuPrimitives {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn backend(&self) -> Backend {
        Backend::Gpu
    }

    fn uses_acceleration(&self) -> bool {
        true
    }

    fn warp(
        &self,
        src: &ComputeImage,
        inv: &[f32; 9],
        filter: Filter,
        width: u32,
        height: u32,
    ) -> ComputeResult<ComputeImage> {
        self.ensure_enabled()?;
        let c = src.channels;
        let out_bytes = (width as u64) * (height as u64) * (c as u64) * 4;
        self.check_size(src.size_bytes() as u64)?;
        self.check_size(out_bytes)?;

        let src_buf = self.upload(src.data(), "warp_src");
        let dst_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("warp_dst"),
            size: out_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let src_dims = self.create_dims_buffer(
            [src.width, src.height, c, filter.shader_index()],
            "warp_src_dims",
        );
        let dst_dims = self.create_dims_buffer([width, height, 0, 0], "warp_dst_dims");
        let inv_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("warp_inverse"),
                contents: bytemuck::bytes_of(&InverseUniform::new(inv)),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let layout = self.pipelines.warp.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("warp_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: src_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: dst_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: src_dims.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: dst_dims.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: inv_buf.as_entire_binding() },
            ],
        });

        let workgroups = (width.div_ceil(16), height.div_ceil(16), 1);
        self.dispatch_and_wait(&self.pipelines.warp, &bind_group, workgroups)?;

        let data = self.download(&dst_buf, out_bytes)?;
        ComputeImage::from_f32(data, width, height, c)
    }

    fn composite_bands(
        &self,
        warped: &ComputeImage,
        canvas: &mut ComputeImage,
        bands: &[RowBand],
    ) -> ComputeResult<()> {
        self.ensure_enabled()?;
        let canvas_bytes = canvas.size_bytes() as u64;
        self.check_size(warped.size_bytes() as u64)?;
        self.check_size(canvas_bytes)?;

        let warped_buf = self.upload(warped.data(), "composite_src");
        let canvas_buf = self.upload(canvas.data(), "composite_canvas");
        let dims = self.create_dims_buffer(
            [canvas.width, canvas.height, warped.channels, canvas.channels],
            "composite_dims",
        );
        let layout = self.pipelines.composite.get_bind_group_layout(0);

        for band in bands {
            let band_buf = self.create_dims_buffer([band.y0, band.y1, 0, 0], "composite_band");
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("composite_bind_group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: warped_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: canvas_buf.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: dims.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 3, resource: band_buf.as_entire_binding() },
                ],
            });
            let total = canvas.width * band.rows();
            self.dispatch_and_wait(&self.pipelines.composite, &bind_group, (total.div_ceil(256), 1, 1))?;
        }

        let data = self.download(&canvas_buf, canvas_bytes)?;
        if data.len() != canvas.data.len() {
            return Err(ComputeError::BufferSizeMismatch {
                expected: canvas.data.len(),
                actual: data.len(),
            });
        }
        canvas.data = data;
        Ok(())
    }
}
