//! wgpu implementation of [`RenderDevice`]
//!
//! Level textures are regenerated with fullscreen-triangle passes: one for
//! elevation (scissored to the regions being rewritten) and one for the
//! normal map. Each update is submitted immediately so it lands before the
//! frame's main pass.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::terrain::elevation::ElevationData;
use crate::terrain::vertex::TerrainVertex;

use super::device::{ElevationUpdate, NormalMapUpdate, RenderDevice, TargetFormat};

pub const ELEVATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub const NORMAL_MAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;
pub const HEIGHTMAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Buffer plus its element count
pub struct WgpuBuffer {
    pub buffer: wgpu::Buffer,
    pub len: u32,
}

pub struct WgpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ElevationParams {
    position_min: [i32; 2],
    toroidal_origin: [i32; 2],
    grid_spacing: i32,
    texture_size: i32,
    height_scale: f32,
    _padding: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct NormalParams {
    toroidal_origin: [i32; 2],
    texture_size: i32,
    normal_scale: f32,
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    elevation_pipeline: wgpu::RenderPipeline,
    elevation_layout: wgpu::BindGroupLayout,
    normal_pipeline: wgpu::RenderPipeline,
    normal_layout: wgpu::BindGroupLayout,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let elevation_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("update_elevation_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/update_elevation.wgsl").into()),
        });
        let normal_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("compute_normals_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/compute_normals.wgsl").into()),
        });

        let elevation_layout = texture_pass_layout(&device, "update_elevation_bind_group_layout");
        let normal_layout = texture_pass_layout(&device, "compute_normals_bind_group_layout");

        let elevation_pipeline = fullscreen_pipeline(
            &device,
            "update_elevation_pipeline",
            &elevation_shader,
            &elevation_layout,
            ELEVATION_FORMAT,
        );
        let normal_pipeline = fullscreen_pipeline(
            &device,
            "compute_normals_pipeline",
            &normal_shader,
            &normal_layout,
            NORMAL_MAP_FORMAT,
        );

        Self {
            device,
            queue,
            elevation_pipeline,
            elevation_layout,
            normal_pipeline,
            normal_layout,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn create_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> WgpuTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        WgpuTexture { texture, view, format }
    }

    fn write_texture(&self, texture: &WgpuTexture, width: u32, height: u32, bytes_per_texel: u32, data: &[u8]) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * bytes_per_texel),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Run one fullscreen pass into `target`, once per scissor rectangle
    fn run_pass(
        &self,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        target: &WgpuTexture,
        scissors: &[(u32, u32, u32, u32)],
    ) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            for &(x, y, width, height) in scissors {
                pass.set_scissor_rect(x, y, width, height);
                pass.draw(0..3, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn bind_params(
        &self,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        params: &[u8],
        source: &WgpuTexture,
    ) -> wgpu::BindGroup {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: params,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
            ],
        })
    }
}

impl RenderDevice for WgpuDevice {
    type Buffer = WgpuBuffer;
    type Texture = WgpuTexture;

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[TerrainVertex]) -> Result<WgpuBuffer> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Ok(WgpuBuffer { buffer, len: vertices.len() as u32 })
    }

    fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> Result<WgpuBuffer> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Ok(WgpuBuffer { buffer, len: indices.len() as u32 })
    }

    fn create_heightmap(&mut self, elevation: &ElevationData) -> Result<WgpuTexture> {
        let (width, height) = (elevation.width(), elevation.height());
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(Error::Gpu(format!("heightmap {width}x{height} exceeds the {max} texture limit")));
        }

        let values: Vec<f32> = elevation.samples().iter().map(|&s| s as f32 / u16::MAX as f32).collect();
        let texture = self.create_texture(
            "heightmap",
            width,
            height,
            HEIGHTMAP_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        self.write_texture(&texture, width, height, 4, bytemuck::cast_slice(&values));
        log::info!("Uploaded heightmap texture {}x{}", width, height);
        Ok(texture)
    }

    fn create_color_texture(&mut self, label: &str, image: &image::RgbaImage) -> Result<WgpuTexture> {
        let (width, height) = image.dimensions();
        let texture = self.create_texture(
            label,
            width,
            height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        self.write_texture(&texture, width, height, 4, image.as_raw());
        Ok(texture)
    }

    fn create_render_target(&mut self, label: &str, size: u32, format: TargetFormat) -> Result<WgpuTexture> {
        if size == 0 {
            return Err(Error::Gpu(format!("render target {label} has size 0")));
        }
        let format = match format {
            TargetFormat::Elevation => ELEVATION_FORMAT,
            TargetFormat::NormalMap => NORMAL_MAP_FORMAT,
        };
        Ok(self.create_texture(
            label,
            size,
            size,
            format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        ))
    }

    fn render_elevation(&mut self, target: &WgpuTexture, heightmap: &WgpuTexture, update: &ElevationUpdate) -> Result<()> {
        if target.format != ELEVATION_FORMAT || heightmap.format != HEIGHTMAP_FORMAT {
            return Err(Error::Gpu("render_elevation called with mismatched textures".into()));
        }

        let params = ElevationParams {
            position_min: [update.position_min.x, update.position_min.y],
            toroidal_origin: [update.toroidal_origin.x, update.toroidal_origin.y],
            grid_spacing: update.grid_spacing,
            texture_size: update.texture_size as i32,
            height_scale: update.height_scale,
            _padding: 0.0,
        };
        let bind_group = self.bind_params(
            "update_elevation_bind_group",
            &self.elevation_layout,
            bytemuck::bytes_of(&params),
            heightmap,
        );

        let scissors: Vec<_> = update.regions.iter().map(|r| (r.x, r.y, r.width, r.height)).collect();
        self.run_pass("update_elevation_pass", &self.elevation_pipeline, &bind_group, target, &scissors);
        Ok(())
    }

    fn render_normal_map(&mut self, target: &WgpuTexture, elevation: &WgpuTexture, update: &NormalMapUpdate) -> Result<()> {
        if target.format != NORMAL_MAP_FORMAT || elevation.format != ELEVATION_FORMAT {
            return Err(Error::Gpu("render_normal_map called with mismatched textures".into()));
        }

        let params = NormalParams {
            toroidal_origin: [update.toroidal_origin.x, update.toroidal_origin.y],
            texture_size: update.texture_size as i32,
            normal_scale: update.normal_scale,
        };
        let bind_group = self.bind_params(
            "compute_normals_bind_group",
            &self.normal_layout,
            bytemuck::bytes_of(&params),
            elevation,
        );

        let size = update.texture_size;
        self.run_pass("compute_normals_pass", &self.normal_pipeline, &bind_group, target, &[(0, 0, size, size)]);
        Ok(())
    }
}

/// Uniform params plus one unfilterable source texture, fragment stage only
fn texture_pass_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
        ],
    })
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[], // Fullscreen triangle
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
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
