//! The GPU particle record.
//!
//! Each particle occupies 64 bytes: four `vec3<f32>` slots padded to 16 bytes,
//! matching WGSL storage layout rules so the same buffer can be bound as a
//! compute storage buffer and as a vertex buffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::mem::{offset_of, size_of};

/// A single simulated point.
///
/// `home` is the rest position the particle was sampled at. `color` is RGB in `[0, 1]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub home: Vec3,
    _pad0: f32,
    pub position: Vec3,
    _pad1: f32,
    pub velocity: Vec3,
    _pad2: f32,
    pub color: Vec3,
    _pad3: f32,
}

impl Particle {
    /// Bytes between consecutive particles in a buffer.
    pub const STRIDE: u64 = size_of::<Particle>() as u64;
    /// Byte offset of `position`, bound as vertex attribute 0.
    pub const POSITION_OFFSET: u64 = offset_of!(Particle, position) as u64;
    /// Byte offset of `color`, bound as vertex attribute 1.
    pub const COLOR_OFFSET: u64 = offset_of!(Particle, color) as u64;

    /// A particle resting at its home position.
    pub fn new(home: Vec3, velocity: Vec3, color: Vec3) -> Self {
        Self {
            home,
            position: home,
            velocity,
            color,
            ..Self::zeroed()
        }
    }

    /// A render-only vertex; home and velocity stay zero.
    pub fn vertex(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            ..Self::zeroed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_wgsl() {
        assert_eq!(Particle::STRIDE, 64);
        assert_eq!(offset_of!(Particle, home), 0);
        assert_eq!(Particle::POSITION_OFFSET, 16);
        assert_eq!(offset_of!(Particle, velocity), 32);
        assert_eq!(Particle::COLOR_OFFSET, 48);
    }

    #[test]
    fn test_new_starts_at_home() {
        let p = Particle::new(Vec3::new(1.0, 2.0, 3.0), Vec3::X, Vec3::ONE);
        assert_eq!(p.position, p.home);
        assert_eq!(p.velocity, Vec3::X);
    }

    #[test]
    fn test_bytes_roundtrip_through_slice() {
        let particles = [Particle::vertex(Vec3::splat(0.5), Vec3::Y); 3];
        let bytes: &[u8] = bytemuck::cast_slice(&particles);
        assert_eq!(bytes.len() as u64, 3 * Particle::STRIDE);
        let back: &[Particle] = bytemuck::cast_slice(bytes);
        assert_eq!(back[2].color, Vec3::Y);
    }
}
