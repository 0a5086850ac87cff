//! One compute dispatch per frame over the whole particle buffer.
//!
//! [`integrate`] is a CPU rendition of `shaders/compute.wgsl`, kept line for
//! line in step with the kernel so its rules can be checked without a GPU.

use crate::device::{ConstantSlot, Device};
use crate::params::{SimUniforms, SimulationParameters};
use crate::particle::Particle;
use crate::store::ParticleStore;
use glam::{Vec2, Vec3};

/// Closest the ray force treats a particle as being to the ray.
pub const MIN_RAY_DISTANCE: f32 = 0.05;

/// Threads per workgroup; must match `@workgroup_size` in the compute shader.
pub const WORKGROUP_SIZE: u32 = 1024;

/// Workgroups needed to cover `particle_count`. The kernel discards the overshoot.
pub fn workgroup_count(particle_count: u32) -> u32 {
    particle_count.div_ceil(WORKGROUP_SIZE)
}

/// Uploads `params` and dispatches the kernel. Returns the workgroup count,
/// zero when there is nothing to simulate.
pub fn dispatch<D: Device>(device: &mut D, store: &ParticleStore<D>, params: &SimulationParameters) -> u32 {
    device.bind_constants(ConstantSlot::Simulation, bytemuck::bytes_of(&params.to_uniforms()));

    let Some(view) = store.view() else {
        return 0;
    };
    let groups = workgroup_count(params.particle_count);
    if groups == 0 {
        return 0;
    }
    device.bind_compute_view(view);
    device.dispatch_compute(groups, 1, 1);
    groups
}

/// Keeps one axis inside `[-extent, extent]`, reflecting velocity inward.
fn bounce_axis(position: f32, velocity: f32, extent: f32, retain: f32) -> Vec2 {
    if extent <= 0.0 || position.abs() <= extent {
        return Vec2::new(position, velocity);
    }
    let side = position.signum();
    Vec2::new(side * extent, -side * velocity.abs() * retain)
}

/// Advances one particle by one step, exactly as the kernel does.
pub fn integrate(particle: &Particle, uniforms: &SimUniforms) -> Particle {
    let mut p = *particle;
    let dt = uniforms.delta_time;
    let strength = uniforms.energy_info[0];
    let retain = uniforms.energy_info[1].clamp(0.0, 1.0);

    if uniforms.force_ray_origin[3] > 0.5 {
        let origin = Vec3::from_slice(&uniforms.force_ray_origin[..3]);
        let direction = Vec3::from_slice(&uniforms.force_ray_direction[..3]);
        let along = (p.position - origin).dot(direction).max(0.0);
        let to_ray = origin + direction * along - p.position;
        let dist = to_ray.length();
        if dist > 0.0001 {
            p.velocity += (to_ray / dist) * strength * dt / dist.max(MIN_RAY_DISTANCE);
        }
    } else if uniforms.force_ray_direction[3] > 0.5 {
        p.velocity += (p.home - p.position) * strength * dt;
    }

    p.velocity *= retain;
    p.position += p.velocity * dt;

    let bounds = Vec3::from_slice(&uniforms.container_scale[..3]);
    let x = bounce_axis(p.position.x, p.velocity.x, bounds.x, retain);
    let y = bounce_axis(p.position.y, p.velocity.y, bounds.y, retain);
    let z = bounce_axis(p.position.z, p.velocity.z, bounds.z, retain);
    p.position = Vec3::new(x.x, y.x, z.x);
    p.velocity = Vec3::new(x.y, y.y, z.y);
    p
}

/// Runs one step over a buffer. Entries at or past `particle_count` are left
/// alone, as the kernel's overshoot threads are.
pub fn simulate(particles: &mut [Particle], uniforms: &SimUniforms) {
    let count = uniforms.particle_count as usize;
    for particle in particles.iter_mut().take(count) {
        *particle = integrate(particle, uniforms);
    }
}
