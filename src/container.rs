//! The container's orientation gizmo: three lines out of the `-extent` corner.

use crate::color::Color;
use crate::device::{BufferDesc, BufferUsage, Device};
use crate::error::GpuError;
use crate::particle::Particle;
use glam::Vec3;

pub const CONTAINER_VERTEX_COUNT: u32 = 6;

/// Line-list vertices for the X, Y and Z edges leaving the `-half_extents` corner.
///
/// Corner ends take the background color. Far ends take the inverted
/// single-channel accent of the background (red for X, green for Y, blue for Z).
pub fn build_container(half_extents: Vec3, background: Color) -> [Particle; CONTAINER_VERTEX_COUNT as usize] {
    let corner = -half_extents;
    let base = background.to_vec3();
    let accents = [
        Color::new(background.r, 0, 0).inverted(),
        Color::new(0, background.g, 0).inverted(),
        Color::new(0, 0, background.b).inverted(),
    ];
    let far_ends = [
        Vec3::new(half_extents.x, corner.y, corner.z),
        Vec3::new(corner.x, half_extents.y, corner.z),
        Vec3::new(corner.x, corner.y, half_extents.z),
    ];

    let mut vertices = [Particle::default(); CONTAINER_VERTEX_COUNT as usize];
    for (axis, (far, accent)) in far_ends.into_iter().zip(accents).enumerate() {
        vertices[axis * 2] = Particle::vertex(corner, base);
        vertices[axis * 2 + 1] = Particle::vertex(far, accent.to_vec3());
    }
    vertices
}

/// Device buffer for the container, rebuilt only when its inputs change.
pub struct ContainerMesh<D: Device> {
    buffer: Option<D::Buffer>,
    built_for: Option<(Vec3, Color)>,
}

impl<D: Device> Default for ContainerMesh<D> {
    fn default() -> Self {
        Self {
            buffer: None,
            built_for: None,
        }
    }
}

impl<D: Device> ContainerMesh<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the buffer if `half_extents` or `background` differ from the
    /// last build. Returns whether a rebuild happened.
    pub fn sync(&mut self, device: &mut D, half_extents: Vec3, background: Color) -> Result<bool, GpuError> {
        if self.buffer.is_some() && self.built_for == Some((half_extents, background)) {
            return Ok(false);
        }

        let vertices = build_container(half_extents, background);
        let desc = BufferDesc {
            label: "Container Buffer",
            usage: BufferUsage::Vertices,
        };
        self.buffer = Some(device.create_buffer(&desc, bytemuck::cast_slice(&vertices))?);
        self.built_for = Some((half_extents, background));
        log::debug!("Rebuilt container for extents {half_extents} and background {background:?}");
        Ok(true)
    }

    pub fn buffer(&self) -> Option<&D::Buffer> {
        self.buffer.as_ref()
    }
}
