//! wgpu backend.
//!
//! [`GpuState`] owns the surface, device and pipelines and implements
//! [`Device`]. Dispatches and draws issued during a frame are recorded, then
//! [`GpuState::render`] encodes them into one command buffer: a compute pass,
//! a render pass clearing to the background, and the egui pass on top.

mod egui_integration;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

pub use egui_integration::{EguiFrame, EguiIntegration};

use crate::color::Color;
use crate::device::{BufferDesc, BufferUsage, ConstantSlot, Device, Topology};
use crate::error::GpuError;
use crate::params::SimUniforms;
use crate::camera::CameraUniforms;
use crate::particle::Particle;
use crate::shader::{COMPUTE_ENTRY, COMPUTE_SOURCE, FRAGMENT_ENTRY, RENDER_SOURCE, VERTEX_ENTRY};
use crate::step::WORKGROUP_SIZE;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const PARTICLE_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    wgpu::VertexAttribute {
        offset: Particle::POSITION_OFFSET,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3, // position
    },
    wgpu::VertexAttribute {
        offset: Particle::COLOR_OFFSET,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3, // color
    },
];

/// Work recorded between frames.
enum FrameCommand {
    Dispatch {
        bind_group: Arc<wgpu::BindGroup>,
        groups: [u32; 3],
    },
    Draw {
        buffer: Arc<wgpu::Buffer>,
        topology: Topology,
        vertex_count: u32,
    },
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    limits: wgpu::Limits,
    points_pipeline: wgpu::RenderPipeline,
    lines_pipeline: wgpu::RenderPipeline,
    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_group_layout: wgpu::BindGroupLayout,
    sim_uniform_buffer: wgpu::Buffer,
    camera_uniform_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    bound_view: Option<Arc<wgpu::BindGroup>>,
    bound_vertices: Option<(Arc<wgpu::Buffer>, Topology)>,
    commands: Vec<FrameCommand>,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let limits = adapter.limits();
        check_limit(
            "max_compute_invocations_per_workgroup",
            WORKGROUP_SIZE,
            limits.max_compute_invocations_per_workgroup,
        )?;
        check_limit(
            "max_compute_workgroup_size_x",
            WORKGROUP_SIZE,
            limits.max_compute_workgroup_size_x,
        )?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits.clone(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // egui-wgpu expects a linear target
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8Unorm);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let sim_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Simulation Uniform Buffer"),
            size: std::mem::size_of::<SimUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform Buffer"),
            size: std::mem::size_of::<CameraUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Render bind group layout
        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_uniform_buffer.as_entire_binding(),
            }],
        });

        // Compute bind group layout: particles, simulation uniforms
        let compute_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compute Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // Render pipelines
        let render_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Render Shader"),
            source: wgpu::ShaderSource::Wgsl(RENDER_SOURCE.into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let points_pipeline = create_render_pipeline(
            &device,
            &render_pipeline_layout,
            &render_shader,
            config.format,
            Topology::Points,
        );
        let lines_pipeline = create_render_pipeline(
            &device,
            &render_pipeline_layout,
            &render_shader,
            config.format,
            Topology::Lines,
        );

        // Compute pipeline
        let compute_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(COMPUTE_SOURCE.into()),
        });

        let compute_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compute Pipeline Layout"),
            bind_group_layouts: &[&compute_bind_group_layout],
            push_constant_ranges: &[],
        });

        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Compute Pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &compute_shader,
            entry_point: Some(COMPUTE_ENTRY),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            limits,
            points_pipeline,
            lines_pipeline,
            compute_pipeline,
            compute_bind_group_layout,
            sim_uniform_buffer,
            camera_uniform_buffer,
            camera_bind_group,
            depth_texture,
            bound_view: None,
            bound_vertices: None,
            commands: Vec::new(),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Encodes and presents everything recorded since the last call.
    pub fn render(
        &mut self,
        background: Color,
        egui: &mut EguiIntegration,
        egui_frame: &EguiFrame,
    ) -> Result<(), wgpu::SurfaceError> {
        let commands = std::mem::take(&mut self.commands);
        self.bound_view = None;
        self.bound_vertices = None;

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Compute pass
        if commands.iter().any(|c| matches!(c, FrameCommand::Dispatch { .. })) {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.compute_pipeline);
            for command in &commands {
                if let FrameCommand::Dispatch { bind_group, groups } = command {
                    compute_pass.set_bind_group(0, bind_group.as_ref(), &[]);
                    compute_pass.dispatch_workgroups(groups[0], groups[1], groups[2]);
                }
            }
        }

        // Render pass
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(background)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for command in &commands {
                if let FrameCommand::Draw { buffer, topology, vertex_count } = command {
                    let pipeline = match topology {
                        Topology::Points => &self.points_pipeline,
                        Topology::Lines => &self.lines_pipeline,
                    };
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_vertex_buffer(0, buffer.slice(..));
                    render_pass.draw(0..*vertex_count, 0..1);
                }
            }
        }

        egui.paint(
            &self.device,
            &self.queue,
            &mut encoder,
            &view,
            egui_frame,
            [self.config.width, self.config.height],
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl Device for GpuState {
    type Buffer = Arc<wgpu::Buffer>;
    type View = Arc<wgpu::BindGroup>;

    fn create_buffer(&mut self, desc: &BufferDesc<'_>, contents: &[u8]) -> Result<Self::Buffer, GpuError> {
        if contents.is_empty() {
            return Err(GpuError::EmptyBuffer {
                label: desc.label.to_string(),
            });
        }

        let size = contents.len() as u64;
        let usage = match desc.usage {
            BufferUsage::Particles => {
                wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST
            }
            BufferUsage::Vertices => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        };
        let limit = self.max_buffer_size(desc.usage);
        if size > limit {
            return Err(GpuError::BufferTooLarge {
                label: desc.label.to_string(),
                size,
                limit,
            });
        }

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label),
            contents,
            usage,
        });
        Ok(Arc::new(buffer))
    }

    fn max_buffer_size(&self, usage: BufferUsage) -> u64 {
        match usage {
            BufferUsage::Particles => self
                .limits
                .max_buffer_size
                .min(self.limits.max_storage_buffer_binding_size as u64),
            BufferUsage::Vertices => self.limits.max_buffer_size,
        }
    }

    fn create_compute_view(&mut self, buffer: &Self::Buffer) -> Result<Self::View, GpuError> {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compute Bind Group"),
            layout: &self.compute_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.sim_uniform_buffer.as_entire_binding(),
                },
            ],
        });
        Ok(Arc::new(bind_group))
    }

    fn buffer_size(&self, buffer: &Self::Buffer) -> u64 {
        buffer.size()
    }

    fn bind_constants(&mut self, slot: ConstantSlot, data: &[u8]) {
        let target = match slot {
            ConstantSlot::Simulation => &self.sim_uniform_buffer,
            ConstantSlot::Camera => &self.camera_uniform_buffer,
        };
        self.queue.write_buffer(target, 0, data);
    }

    fn bind_compute_view(&mut self, view: &Self::View) {
        self.bound_view = Some(Arc::clone(view));
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        match &self.bound_view {
            Some(bind_group) => self.commands.push(FrameCommand::Dispatch {
                bind_group: Arc::clone(bind_group),
                groups: [x, y, z],
            }),
            None => log::warn!("Compute dispatch without a bound view skipped"),
        }
    }

    fn bind_vertices(&mut self, buffer: &Self::Buffer, topology: Topology) {
        self.bound_vertices = Some((Arc::clone(buffer), topology));
    }

    fn draw(&mut self, vertex_count: u32) {
        match &self.bound_vertices {
            Some((buffer, topology)) if vertex_count > 0 => self.commands.push(FrameCommand::Draw {
                buffer: Arc::clone(buffer),
                topology: *topology,
                vertex_count,
            }),
            Some(_) => {}
            None => log::warn!("Draw without bound vertices skipped"),
        }
    }
}

fn check_limit(name: &'static str, required: u32, available: u32) -> Result<(), GpuError> {
    if available < required {
        return Err(GpuError::MissingLimits {
            name,
            required,
            available,
        });
    }
    Ok(())
}

fn clear_color(color: Color) -> wgpu::Color {
    let c = color.to_vec3().as_dvec3();
    wgpu::Color {
        r: c.x,
        g: c.y,
        b: c.z,
        a: 1.0,
    }
}

fn create_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: Topology,
) -> wgpu::RenderPipeline {
    let (label, topology) = match topology {
        Topology::Points => ("Points Pipeline", wgpu::PrimitiveTopology::PointList),
        Topology::Lines => ("Lines Pipeline", wgpu::PrimitiveTopology::LineList),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(VERTEX_ENTRY),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: Particle::STRIDE,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &PARTICLE_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
