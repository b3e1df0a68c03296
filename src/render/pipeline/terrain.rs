//! Main terrain pass: replays a [`DrawList`] into the colour and depth targets

use std::num::NonZeroU64;

use crate::core::types::Result;
use crate::render::depth::DepthTexture;
use crate::render::device::{RenderDevice, TargetFormat};
use crate::render::wgpu_device::{WgpuDevice, WgpuTexture};
use crate::terrain::draw_list::{DrawList, DrawUniform, FrameUniform, LevelUniform};
use crate::terrain::vertex::{TerrainVertex, Topology};

/// Offset between consecutive uniforms in the level and draw buffers
const UNIFORM_STRIDE: u64 = 256;

pub const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.55,
    g: 0.7,
    b: 0.9,
    a: 1.0,
};

/// Plain colour used when no grass texture is loaded
const FALLBACK_GRASS: [u8; 4] = [96, 124, 64, 255];

pub struct TerrainPipeline {
    list_pipeline: wgpu::RenderPipeline,
    strip_pipeline: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    level_layout: wgpu::BindGroupLayout,
    draw_layout: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    level_buffer: wgpu::Buffer,
    level_capacity: u64,
    draw_buffer: wgpu::Buffer,
    draw_capacity: u64,
    draw_bind_group: wgpu::BindGroup,
    grass_sampler: wgpu::Sampler,
    normal_sampler: wgpu::Sampler,
    fallback_grass: WgpuTexture,
    fallback_normals: WgpuTexture,
}

impl TerrainPipeline {
    pub fn new(gpu: &mut WgpuDevice, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let fallback_grass =
            gpu.create_color_texture("fallback_grass", &image::RgbaImage::from_pixel(1, 1, image::Rgba(FALLBACK_GRASS)))?;
        let fallback_normals = gpu.create_render_target("fallback_normal_map", 1, TargetFormat::NormalMap)?;

        let device = gpu.device();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/terrain.wgsl").into()),
        });

        // Group 0: frame constants and grass
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain_frame_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false),
                texture_entry(1, wgpu::ShaderStages::FRAGMENT, true),
                sampler_entry(2),
            ],
        });

        // Group 1: level constants and textures
        let level_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain_level_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false),
                texture_entry(1, wgpu::ShaderStages::VERTEX, false),
                texture_entry(2, wgpu::ShaderStages::FRAGMENT, true),
                texture_entry(3, wgpu::ShaderStages::FRAGMENT, true),
                sampler_entry(4),
            ],
        });

        // Group 2: per-draw constants, dynamic offset
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("terrain_draw_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, true)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("terrain_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &level_layout, &draw_layout],
            immediate_size: 0,
        });

        let list_pipeline = create_pipeline(device, &pipeline_layout, &shader, surface_format, Topology::TriangleList);
        let strip_pipeline = create_pipeline(device, &pipeline_layout, &shader, surface_format, Topology::TriangleStrip);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("terrain_frame_uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let level_capacity = 16;
        let level_buffer = uniform_array(device, "terrain_level_uniforms", level_capacity);
        let draw_capacity = 256;
        let draw_buffer = uniform_array(device, "terrain_draw_uniforms", draw_capacity);
        let draw_bind_group = draw_bind_group(device, &draw_layout, &draw_buffer);

        let grass_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("terrain_grass_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Level textures are toroidal, so filtering wraps
        let normal_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("terrain_normal_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            list_pipeline,
            strip_pipeline,
            frame_layout,
            level_layout,
            draw_layout,
            frame_buffer,
            level_buffer,
            level_capacity,
            draw_buffer,
            draw_capacity,
            draw_bind_group,
            grass_sampler,
            normal_sampler,
            fallback_grass,
            fallback_normals,
        })
    }

    /// Draw every command in `list` in order, clearing colour to the sky and
    /// depth to the far plane first
    pub fn render(
        &mut self,
        gpu: &WgpuDevice,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &DepthTexture,
        list: &DrawList<'_, WgpuDevice>,
    ) {
        let device = gpu.device();
        let queue = gpu.queue();

        self.reserve(device, list.levels.len() as u64, list.commands.len() as u64);

        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&list.frame));
        if !list.is_empty() {
            let levels: Vec<LevelUniform> = list.levels.iter().map(|l| l.uniform).collect();
            queue.write_buffer(&self.level_buffer, 0, &strided(&levels));
            let draws: Vec<DrawUniform> = list.commands.iter().map(|c| c.uniform).collect();
            queue.write_buffer(&self.draw_buffer, 0, &strided(&draws));
        }

        let grass = list.grass.unwrap_or(&self.fallback_grass);
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("terrain_frame_bind_group"),
            layout: &self.frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&grass.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.grass_sampler),
                },
            ],
        });

        let level_groups: Vec<wgpu::BindGroup> = list
            .levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let coarser = level.coarser_normal_map.unwrap_or(&self.fallback_normals);
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("terrain_level_bind_group"),
                    layout: &self.level_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                                buffer: &self.level_buffer,
                                offset: i as u64 * UNIFORM_STRIDE,
                                size: NonZeroU64::new(std::mem::size_of::<LevelUniform>() as u64),
                            }),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&level.elevation.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::TextureView(&level.normal_map.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: wgpu::BindingResource::TextureView(&coarser.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: wgpu::BindingResource::Sampler(&self.normal_sampler),
                        },
                    ],
                })
            })
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("terrain_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(SKY_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth.view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_bind_group(0, &frame_group, &[]);

        let mut bound_topology = None;
        let mut bound_level = None;
        for (i, command) in list.commands.iter().enumerate() {
            let Some(level_group) = level_groups.get(command.level) else {
                continue;
            };

            if bound_topology != Some(command.mesh.topology) {
                pass.set_pipeline(match command.mesh.topology {
                    Topology::TriangleList => &self.list_pipeline,
                    Topology::TriangleStrip => &self.strip_pipeline,
                });
                bound_topology = Some(command.mesh.topology);
            }
            if bound_level != Some(command.level) {
                pass.set_bind_group(1, level_group, &[]);
                bound_level = Some(command.level);
            }

            pass.set_bind_group(2, &self.draw_bind_group, &[(i as u64 * UNIFORM_STRIDE) as u32]);
            pass.set_vertex_buffer(0, command.mesh.vertices.buffer.slice(..));
            pass.set_index_buffer(command.mesh.indices.buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..command.mesh.index_count, 0, 0..1);
        }
    }

    /// Grow the uniform arrays to hold this frame's levels and draws
    fn reserve(&mut self, device: &wgpu::Device, levels: u64, draws: u64) {
        if levels > self.level_capacity {
            self.level_capacity = levels.next_power_of_two();
            self.level_buffer = uniform_array(device, "terrain_level_uniforms", self.level_capacity);
        }
        if draws > self.draw_capacity {
            self.draw_capacity = draws.next_power_of_two();
            self.draw_buffer = uniform_array(device, "terrain_draw_uniforms", self.draw_capacity);
            self.draw_bind_group = draw_bind_group(device, &self.draw_layout, &self.draw_buffer);
            log::debug!("Terrain draw uniforms grown to {}", self.draw_capacity);
        }
    }
}

/// Lay uniforms out `UNIFORM_STRIDE` bytes apart
fn strided<T: bytemuck::Pod>(items: &[T]) -> Vec<u8> {
    let mut bytes = vec![0u8; items.len() * UNIFORM_STRIDE as usize];
    for (chunk, item) in bytes.chunks_mut(UNIFORM_STRIDE as usize).zip(items) {
        let src = bytemuck::bytes_of(item);
        chunk[..src.len()].copy_from_slice(src);
    }
    bytes
}

fn uniform_array(device: &wgpu::Device, label: &str, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: capacity.max(1) * UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn draw_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("terrain_draw_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
            }),
        }],
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages, dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages, filterable: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: Topology,
) -> wgpu::RenderPipeline {
    let (label, primitive) = match topology {
        Topology::TriangleList => (
            "terrain_list_pipeline",
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
        ),
        Topology::TriangleStrip => (
            "terrain_strip_pipeline",
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: Some(wgpu::IndexFormat::Uint16),
                ..Default::default()
            },
        ),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[TerrainVertex::desc()],
            compilation_options: Default::default(),
        },
        // Strips flip winding every triangle; no culling
        primitive,
        depth_stencil: Some(DepthTexture::stencil_state()),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniforms_fit_stride() {
        assert!(std::mem::size_of::<LevelUniform>() as u64 <= UNIFORM_STRIDE);
        assert!(std::mem::size_of::<DrawUniform>() as u64 <= UNIFORM_STRIDE);
    }

    #[test]
    fn test_strided_layout() {
        let uniforms = [DrawUniform::new([1.0; 4], [0.0; 4]), DrawUniform::new([2.0; 4], [0.0; 4])];
        let bytes = strided(&uniforms);
        assert_eq!(bytes.len(), 2 * UNIFORM_STRIDE as usize);

        let second: DrawUniform = bytemuck::pod_read_unaligned(&bytes[256..256 + std::mem::size_of::<DrawUniform>()]);
        assert_eq!(second.scale_factor, [2.0; 4]);
        assert!(bytes[64..256].iter().all(|&b| b == 0));
    }
}
