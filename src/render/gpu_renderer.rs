//! GPU raymarcher.
//!
//! A single static compute shader (`raymarch.wgsl`) walks the draw list,
//! which is uploaded each frame as a storage buffer of [`GpuPrim`]s. The
//! pipeline is built once; only buffers are recreated per frame.

use wgpu::util::DeviceExt;

use super::camera::Camera;
use super::draw_list::DrawList;
use super::lights::Lighting;
use super::sdf_renderer::{BACKGROUND_BOTTOM, BACKGROUND_TOP};
use super::Rasterizer;
use crate::error::{AvatarError, Result};

const SHADER: &str = include_str!("raymarch.wgsl");
const MAX_DIST: f32 = 14.0;

// ── Buffer layouts (must match raymarch.wgsl) ──

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    cam_origin: [f32; 4],
    cam_forward: [f32; 4],
    cam_right: [f32; 4],
    cam_up: [f32; 4],
    ambient: [f32; 4],
    light_dir: [[f32; 4]; 3],
    light_col: [[f32; 4]; 3],
    bg_top: [f32; 4],
    bg_bottom: [f32; 4],
    dims: [u32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuPrim {
    inv: [[f32; 4]; 4],
    params: [f32; 4],
    color: [f32; 4],
    extra: [f32; 4],
    center: [f32; 4],
}

fn vec4(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

/// Pack the draw list for upload. Never empty: wgpu rejects zero-sized
/// storage bindings, so an empty list yields one zeroed record.
pub fn pack_primitives(list: &DrawList) -> Vec<GpuPrim> {
    let mut out: Vec<GpuPrim> = list
        .primitives
        .iter()
        .map(|p| {
            let [a, b, c] = p.shape.params();
            GpuPrim {
                inv: p.inverse.to_cols_array_2d(),
                params: [a, b, c, p.shape.kind_id() as f32],
                color: vec4(p.material.color, p.material.effective_opacity()),
                extra: [p.material.shininess, p.distance_scale, p.bound, 0.0],
                center: vec4(p.center.into(), 1.0),
            }
        })
        .collect();
    if out.is_empty() {
        out.push(bytemuck::Zeroable::zeroed());
    }
    out
}

fn uniforms(list: &DrawList, camera: &Camera, lighting: &Lighting, size: [u32; 2]) -> Uniforms {
    let mut light_dir = [[0.0; 4]; 3];
    let mut light_col = [[0.0; 4]; 3];
    for (k, light) in lighting.lights.iter().enumerate() {
        light_dir[k] = vec4(light.direction.into(), 0.0);
        light_col[k] = vec4(light.color.into(), 0.0);
    }
    Uniforms {
        cam_origin: vec4(camera.origin.into(), camera.fov_factor),
        cam_forward: vec4(camera.forward.into(), camera.aspect()),
        cam_right: vec4(camera.right.into(), MAX_DIST),
        cam_up: vec4(camera.up.into(), 0.0),
        ambient: vec4(lighting.ambient.into(), 0.0),
        light_dir,
        light_col,
        bg_top: vec4(BACKGROUND_TOP, 1.0),
        bg_bottom: vec4(BACKGROUND_BOTTOM, 1.0),
        dims: [size[0], size[1], list.len() as u32, 0],
    }
}

// ── GPU Renderer ──

struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Persistent wgpu raymarcher. Holds the device, queue and pipeline until
/// released.
pub struct GpuRaymarcher {
    state: Option<GpuState>,
    adapter_name: String,
}

impl GpuRaymarcher {
    /// Acquire an adapter and device and build the pipeline.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| AvatarError::RenderUnavailable("no GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("holo-avatar GPU"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| AvatarError::RenderUnavailable(e.to_string()))?;

        let adapter_name = adapter.get_info().name;
        log::info!("GPU raymarcher initialised: {:?}", adapter_name);

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Raymarch Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let buffer_entry = |binding: u32, ty: wgpu::BufferBindingType| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Raymarch BGL"),
            entries: &[
                buffer_entry(0, wgpu::BufferBindingType::Uniform),
                buffer_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                buffer_entry(2, wgpu::BufferBindingType::Storage { read_only: false }),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raymarch PL"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Raymarch Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Ok(Self {
            state: Some(GpuState {
                device,
                queue,
                pipeline,
                bind_group_layout,
            }),
            adapter_name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

impl Rasterizer for GpuRaymarcher {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn render(
        &mut self,
        list: &DrawList,
        camera: &Camera,
        lighting: &Lighting,
        size: [u32; 2],
    ) -> Option<Vec<u8>> {
        let state = self.state.as_ref()?;
        let [width, height] = size;
        if width == 0 || height == 0 {
            return None;
        }
        let device = &state.device;

        let uniforms = uniforms(list, camera, lighting, size);
        let prims = pack_primitives(list);
        let pixel_count = width as usize * height as usize;

        let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let prim_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Primitives"),
            contents: bytemuck::cast_slice(&prims),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let output_size = (pixel_count * 4) as u64; // u32 per pixel
        let output_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Output Pixels"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Raymarch Bind Group"),
            layout: &state.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: prim_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Raymarch Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Raymarch Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&state.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(width.div_ceil(16), height.div_ceil(16), 1);
        }
        encoder.copy_buffer_to_buffer(&output_buf, 0, &staging_buf, 0, output_size);
        state.queue.submit(std::iter::once(encoder.finish()));

        // Read back
        let buffer_slice = staging_buf.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        device.poll(wgpu::Maintain::Wait);
        if rx.recv().ok()?.is_err() {
            log::warn!("GPU readback failed");
            return None;
        }

        let data = buffer_slice.get_mapped_range();
        let packed: &[u32] = bytemuck::cast_slice(&data);
        let mut pixels = Vec::with_capacity(pixel_count * 4);
        for &px in packed {
            pixels.extend_from_slice(&px.to_le_bytes());
        }
        drop(data);
        staging_buf.unmap();

        Some(pixels)
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!("GPU raymarcher released ({})", self.adapter_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::AvatarScene;

    #[test]
    fn empty_list_packs_one_record() {
        let prims = pack_primitives(&DrawList::new());
        assert_eq!(prims.len(), 1);
        assert_eq!(prims[0].extra, [0.0; 4]);
    }

    #[test]
    fn packs_every_visible_primitive() {
        let scene = AvatarScene::new(0, 0);
        let list = DrawList::from_graph(&scene.graph);
        let prims = pack_primitives(&list);
        assert_eq!(prims.len(), list.len());
        for (g, p) in prims.iter().zip(&list.primitives) {
            assert_eq!(g.params[3], p.shape.kind_id() as f32);
            assert_eq!(g.color[3], p.material.effective_opacity());
        }
    }

    #[test]
    fn layouts_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<GpuPrim>(), 128);
    }

    #[test]
    fn uniforms_carry_dims_and_count() {
        let scene = AvatarScene::new(0, 0);
        let list = DrawList::from_graph(&scene.graph);
        let u = uniforms(&list, &Camera::portrait(), &Lighting::studio(), [320, 240]);
        assert_eq!(u.dims, [320, 240, list.len() as u32, 0]);
    }
}
