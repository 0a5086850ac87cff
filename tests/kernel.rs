//! Runs the compute kernel on a real adapter and compares it with
//! [`step::integrate`].
//!
//! Machines without a usable adapter skip the test.

use particle_renderer::camera::Ray;
use particle_renderer::params::{SimUniforms, SimulationParameters};
use particle_renderer::shader::{COMPUTE_ENTRY, COMPUTE_SOURCE};
use particle_renderer::step::{self, WORKGROUP_SIZE};
use particle_renderer::{Particle, Vec3};
use wgpu::util::DeviceExt;

fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;

    let limits = adapter.limits();
    if limits.max_compute_invocations_per_workgroup < WORKGROUP_SIZE
        || limits.max_compute_workgroup_size_x < WORKGROUP_SIZE
    {
        return None;
    }

    pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("Kernel Test Device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::default(),
        },
        None,
    ))
    .ok()
}

/// One dispatch of the kernel over `particles`; returns the buffer afterwards.
fn run_kernel(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    particles: &[Particle],
    uniforms: &SimUniforms,
) -> Vec<Particle> {
    let size = std::mem::size_of_val(particles) as u64;
    let storage = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Particles"),
        contents: bytemuck::cast_slice(particles),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
    });
    let constants = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Sim Params"),
        contents: bytemuck::bytes_of(uniforms),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Compute Shader"),
        source: wgpu::ShaderSource::Wgsl(COMPUTE_SOURCE.into()),
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Compute Pipeline"),
        layout: None,
        module: &module,
        entry_point: Some(COMPUTE_ENTRY),
        compilation_options: Default::default(),
        cache: None,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Compute Bind Group"),
        layout: &pipeline.get_bind_group_layout(0),
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: storage.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: constants.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Kernel Test Encoder"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Compute Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(step::workgroup_count(particles.len() as u32), 1, 1);
    }
    encoder.copy_buffer_to_buffer(&storage, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| {});
    device.poll(wgpu::Maintain::Wait);
    let result = bytemuck::pod_collect_to_vec(&slice.get_mapped_range()[..]);
    staging.unmap();
    result
}

fn at(position: Vec3, home: Vec3, velocity: Vec3) -> Particle {
    let mut p = Particle::new(home, velocity, Vec3::ONE);
    p.position = position;
    p
}

fn assert_close(gpu: &Particle, cpu: &Particle) {
    assert!((gpu.position - cpu.position).length() < 1e-4, "{:?} vs {:?}", gpu, cpu);
    assert!((gpu.velocity - cpu.velocity).length() < 1e-4, "{:?} vs {:?}", gpu, cpu);
    assert_eq!(gpu.home, cpu.home);
    assert_eq!(gpu.color, cpu.color);
}

#[test]
fn test_kernel_matches_cpu_step() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no compute adapter, skipping");
        return;
    };

    let particles = vec![
        at(Vec3::new(2.0, 0.0, 5.0), Vec3::ZERO, Vec3::ZERO),
        at(Vec3::new(0.01, 0.0, 1.0), Vec3::ZERO, Vec3::ZERO),
        at(Vec3::new(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0)),
        at(Vec3::new(0.9, 0.0, -0.9), Vec3::ZERO, Vec3::new(20.0, 0.0, -20.0)),
        at(Vec3::new(0.0, 0.0, 0.0), Vec3::ONE, Vec3::new(0.0, 80.0, 0.0)),
    ];

    let ray = Ray {
        origin: Vec3::ZERO,
        direction: Vec3::Z,
    };
    let cases = [
        SimulationParameters::builder(particles.len() as u32)
            .with_time(1.0, 0.1)
            .with_ray(Some(ray))
            .with_container(Vec3::new(1.0, 0.0, 6.0))
            .with_energy(1.5, 0.7)
            .build(),
        SimulationParameters::builder(particles.len() as u32)
            .with_time(1.0, 0.05)
            .with_return_home(true)
            .with_container(Vec3::new(1.0, 0.0, 1.0))
            .with_energy(2.0, 0.5)
            .build(),
    ];

    for params in cases {
        let uniforms = params.to_uniforms();
        let result = run_kernel(&device, &queue, &particles, &uniforms);
        for (gpu, original) in result.iter().zip(&particles) {
            assert_close(gpu, &step::integrate(original, &uniforms));
        }
    }
}

#[test]
fn test_kernel_leaves_entries_past_count() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no compute adapter, skipping");
        return;
    };

    let particles = vec![at(Vec3::ZERO, Vec3::ZERO, Vec3::X); 4];
    let uniforms = SimulationParameters::builder(2)
        .with_time(1.0, 0.1)
        .build()
        .to_uniforms();
    let result = run_kernel(&device, &queue, &particles, &uniforms);

    let mut expected = particles.clone();
    step::simulate(&mut expected, &uniforms);
    assert!((result[0].position.x - 0.1).abs() < 1e-5);
    assert!((result[1].position.x - 0.1).abs() < 1e-5);
    assert_eq!(result[2], particles[2]);
    assert_eq!(result[3], particles[3]);
    for (gpu, cpu) in result.iter().zip(&expected) {
        assert_close(gpu, cpu);
    }
}
