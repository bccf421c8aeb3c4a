//! Subdivided plane with the noise/distortion shader.

use bytemuck::{Pod, Zeroable};
use sdf_shading::PlaneUniforms;
use wgpu::util::DeviceExt;

use crate::camera::{Camera, CameraUniform, MeshTransform};
use crate::shader_asset::{ShaderAssetError, NOISE_PLANE_SHADER};
use crate::vertex::VertexLayout;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// CPU-side plane mesh.
#[derive(Clone, Debug, Default)]
pub struct PlaneGeometry {
    pub vertices: Vec<PlaneVertex>,
    pub indices: Vec<u32>,
}

/// Grid of `(segments_x + 1) * (segments_y + 1)` vertices centered on the origin in the XY
/// plane, top row first. `uv` is (0, 1) at the top-left corner.
pub fn plane_geometry(width: f32, height: f32, segments_x: u32, segments_y: u32) -> PlaneGeometry {
    let grid_x = segments_x.max(1);
    let grid_y = segments_y.max(1);
    let cols = grid_x + 1;
    let rows = grid_y + 1;

    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;

    let mut vertices = Vec::with_capacity((cols * rows) as usize);
    for iy in 0..rows {
        let y = height * 0.5 - iy as f32 * segment_height;
        for ix in 0..cols {
            let x = ix as f32 * segment_width - width * 0.5;
            vertices.push(PlaneVertex {
                position: [x, y, 0.0],
                uv: [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
            });
        }
    }

    let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + cols * iy;
            let b = ix + cols * (iy + 1);
            let c = (ix + 1) + cols * (iy + 1);
            let d = (ix + 1) + cols * iy;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    PlaneGeometry { vertices, indices }
}

pub struct PlaneRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    pub transform: MeshTransform,
}

impl PlaneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        geometry: &PlaneGeometry,
    ) -> Result<Self, ShaderAssetError> {
        NOISE_PLANE_SHADER.validate()?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Noise Plane Shader"),
            source: wgpu::ShaderSource::Wgsl(NOISE_PLANE_SHADER.source.into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Plane Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Plane Uniform Buffer"),
            size: std::mem::size_of::<PlaneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Plane Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Plane Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Plane Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Noise Plane Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[PlaneVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Plane Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Plane Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::info!(
            "✓ Noise plane ready ({} vertices, {} triangles)",
            geometry.vertices.len(),
            geometry.indices.len() / 3
        );

        Ok(Self {
            pipeline,
            camera_buffer,
            uniform_buffer,
            bind_group,
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            transform: MeshTransform::default(),
        })
    }

    pub fn prepare(&self, queue: &wgpu::Queue, camera: &Camera, uniforms: PlaneUniforms) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera.to_uniform(self.transform.matrix())]),
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_counts() {
        let plane = plane_geometry(1.5, 1.5, 300, 300);
        assert_eq!(plane.vertices.len(), 301 * 301);
        assert_eq!(plane.indices.len(), 300 * 300 * 6);
        let max = *plane.indices.iter().max().unwrap();
        assert_eq!(max as usize, plane.vertices.len() - 1);
    }

    #[test]
    fn test_plane_corners() {
        let plane = plane_geometry(2.0, 1.0, 2, 2);
        let first = plane.vertices[0];
        let last = *plane.vertices.last().unwrap();

        assert_eq!(first.position, [-1.0, 0.5, 0.0]);
        assert_eq!(first.uv, [0.0, 1.0]);
        assert_eq!(last.position, [1.0, -0.5, 0.0]);
        assert_eq!(last.uv, [1.0, 0.0]);
    }

    #[test]
    fn test_single_cell_winding() {
        let plane = plane_geometry(1.0, 1.0, 1, 1);
        assert_eq!(plane.indices, vec![0, 2, 1, 2, 3, 1]);
    }

    #[test]
    fn test_zero_segments_clamped() {
        let plane = plane_geometry(1.0, 1.0, 0, 0);
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.indices.len(), 6);
    }
}
