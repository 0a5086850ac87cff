//! # Particle Renderer
//!
//! An interactive GPU particle simulation seeded from triangle meshes.
//!
//! Particles are sampled on the CPU from a mesh (along its edges, across its
//! faces, or scattered through a box), uploaded once, then advanced every
//! frame by a compute kernel and drawn as points inside a wire container.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particle_renderer::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let settings = Settings::discover(None)?;
//!     particle_renderer::app::run(settings)
//! }
//! ```
//!
//! ## Generation
//!
//! [`sampler::generate`] picks one of three [`GenerationMode`]s:
//!
//! - **Wireframe**: walks every triangle edge at a fixed step.
//! - **Surface**: walks lines between two edges of each face, filling it.
//! - **Random volume**: scatters particles uniformly inside the container.
//!
//! Colors come from the texture at the interpolated UV when one is loaded,
//! otherwise from the particle position.
//!
//! ## Simulation
//!
//! Each frame the [`Scene`] builds [`SimulationParameters`] from the timer,
//! the pointer ray and the panel controls, then [`step::dispatch`] launches
//! one invocation per particle. Holding the left mouse button pushes
//! particles toward the ray under the cursor; "return home" pulls them back
//! to where they were generated.
//!
//! ## Headless use
//!
//! Everything above the window talks to the GPU through the [`Device`]
//! trait. [`MemoryDevice`](device::MemoryDevice) records the calls instead,
//! which is how the tests run whole frames without a GPU.

pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod container;
pub mod controller;
pub mod device;
pub mod error;
pub mod gpu;
pub mod input;
pub mod mesh;
pub mod panel;
pub mod params;
pub mod particle;
pub mod sampler;
pub mod scene;
pub mod shader;
pub mod step;
pub mod store;
pub mod texture;
pub mod time;

pub use bytemuck;
pub use glam::{Vec2, Vec3};

pub use camera::{Camera, Ray};
pub use color::Color;
pub use config::Settings;
pub use controller::{DragState, InteractionController};
pub use device::{Device, MemoryDevice};
pub use error::{AppError, ConfigError, GpuError, ResourceError};
pub use mesh::{Mesh, Triangle};
pub use params::{ForceMode, SimulationParameters};
pub use particle::Particle;
pub use sampler::{GenerationMode, GenerationParams};
pub use scene::Scene;
pub use store::ParticleStore;
pub use texture::Texture;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::camera::{Camera, Ray};
    pub use crate::color::Color;
    pub use crate::config::Settings;
    pub use crate::device::{Device, MemoryDevice};
    pub use crate::error::{AppError, ConfigError, GpuError, ResourceError};
    pub use crate::mesh::{Mesh, Triangle};
    pub use crate::particle::Particle;
    pub use crate::sampler::{GenerationMode, GenerationParams};
    pub use crate::scene::Scene;
    pub use crate::store::ParticleStore;
    pub use crate::texture::Texture;
    pub use glam::{Vec2, Vec3};
}
