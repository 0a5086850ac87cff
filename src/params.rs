//! Per-frame simulation parameters and their GPU constant block.
//!
//! The ray force and the return-home pull are never active together. A frame
//! that casts a ray resolves to [`ForceMode::Ray`] even if return home was
//! requested; the caller is expected to clear its return-home toggle when that
//! happens (see [`SimulationParameters::ray_overrode_return_home`]).

use crate::camera::Ray;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Which force acts on the particles this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ForceMode {
    /// Particles coast, subject only to damping and the container.
    #[default]
    Idle,
    /// Attraction toward (or repulsion from) a world-space ray.
    Ray(Ray),
    /// Pull toward each particle's home position.
    ReturnHome,
}

impl ForceMode {
    /// Ray beats return home.
    pub fn resolve(ray: Option<Ray>, return_home: bool) -> Self {
        match ray {
            Some(ray) => ForceMode::Ray(ray),
            None if return_home => ForceMode::ReturnHome,
            None => ForceMode::Idle,
        }
    }

    pub fn ray(&self) -> Option<Ray> {
        match self {
            ForceMode::Ray(ray) => Some(*ray),
            _ => None,
        }
    }
}

/// Everything the compute kernel needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParameters {
    pub particle_count: u32,
    pub elapsed: f32,
    pub delta_time: f32,
    pub force: ForceMode,
    pub container_scale: Vec3,
    pub force_strength: f32,
    pub energy_retain: f32,
    /// Return home was requested but the ray took precedence.
    pub ray_overrode_return_home: bool,
}

impl SimulationParameters {
    pub fn builder(particle_count: u32) -> ParameterBuilder {
        ParameterBuilder::new(particle_count)
    }

    /// Packs the parameters into the kernel's constant layout.
    pub fn to_uniforms(&self) -> SimUniforms {
        let (ray_origin, ray_direction, use_ray) = match self.force {
            ForceMode::Ray(ray) => (ray.origin, ray.direction, 1.0),
            _ => (Vec3::ZERO, Vec3::ZERO, 0.0),
        };
        let return_home = if self.force == ForceMode::ReturnHome { 1.0 } else { 0.0 };

        SimUniforms {
            particle_count: self.particle_count,
            elapsed: self.elapsed,
            delta_time: self.delta_time,
            _padding: 0.0,
            force_ray_origin: ray_origin.extend(use_ray).to_array(),
            force_ray_direction: ray_direction.extend(return_home).to_array(),
            container_scale: self.container_scale.extend(0.0).to_array(),
            energy_info: [self.force_strength, self.energy_retain, 0.0, 0.0],
        }
    }
}

/// Builder for [`SimulationParameters`].
#[derive(Debug, Clone)]
pub struct ParameterBuilder {
    particle_count: u32,
    elapsed: f32,
    delta_time: f32,
    ray: Option<Ray>,
    return_home: bool,
    container_scale: Vec3,
    force_strength: f32,
    energy_retain: f32,
}

impl ParameterBuilder {
    pub fn new(particle_count: u32) -> Self {
        Self {
            particle_count,
            elapsed: 0.0,
            delta_time: 0.0,
            ray: None,
            return_home: false,
            container_scale: Vec3::ONE,
            force_strength: 1.0,
            energy_retain: 1.0,
        }
    }

    pub fn with_time(mut self, elapsed: f32, delta_time: f32) -> Self {
        self.elapsed = elapsed;
        self.delta_time = delta_time;
        self
    }

    pub fn with_ray(mut self, ray: Option<Ray>) -> Self {
        self.ray = ray;
        self
    }

    pub fn with_return_home(mut self, return_home: bool) -> Self {
        self.return_home = return_home;
        self
    }

    pub fn with_container(mut self, half_extents: Vec3) -> Self {
        self.container_scale = half_extents;
        self
    }

    /// `energy_retain` is clamped to `[0, 1]`.
    pub fn with_energy(mut self, force_strength: f32, energy_retain: f32) -> Self {
        self.force_strength = force_strength;
        self.energy_retain = energy_retain.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> SimulationParameters {
        SimulationParameters {
            particle_count: self.particle_count,
            elapsed: self.elapsed,
            delta_time: self.delta_time,
            force: ForceMode::resolve(self.ray, self.return_home),
            container_scale: self.container_scale,
            force_strength: self.force_strength,
            energy_retain: self.energy_retain,
            ray_overrode_return_home: self.ray.is_some() && self.return_home,
        }
    }
}

/// Compute-stage constant block, 80 bytes.
///
/// `force_ray_origin.w` flags the ray force, `force_ray_direction.w` flags
/// return home, `energy_info` is `(force_strength, energy_retain, 0, 0)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SimUniforms {
    pub particle_count: u32,
    pub elapsed: f32,
    pub delta_time: f32,
    pub _padding: f32,
    pub force_ray_origin: [f32; 4],
    pub force_ray_direction: [f32; 4],
    pub container_scale: [f32; 4],
    pub energy_info: [f32; 4],
}
