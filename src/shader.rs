//! WGSL sources for the compute kernel and the point/line renderer.
//!
//! The compute kernel's `SimParams` mirrors [`crate::params::SimUniforms`] and
//! its `Particle` mirrors [`crate::particle::Particle`].

pub const COMPUTE_SOURCE: &str = include_str!("shaders/compute.wgsl");
pub const RENDER_SOURCE: &str = include_str!("shaders/render.wgsl");

pub const COMPUTE_ENTRY: &str = "main";
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";
