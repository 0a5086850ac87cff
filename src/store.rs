//! The particle array and its device mirror.

use crate::device::{BufferDesc, BufferUsage, Device};
use crate::error::GpuError;
use crate::particle::Particle;
use crate::sampler::{self, GenerationMode, GenerationParams};

const PARTICLE_BUFFER: &str = "Particle Buffer";

/// Owns the CPU particles, the device buffer holding them and the compute view.
///
/// Regeneration replaces all three at once; there are no partial updates.
pub struct ParticleStore<D: Device> {
    particles: Vec<Particle>,
    buffer: Option<D::Buffer>,
    view: Option<D::View>,
}

impl<D: Device> Default for ParticleStore<D> {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            buffer: None,
            view: None,
        }
    }
}

impl<D: Device> ParticleStore<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples a fresh particle set and uploads it, replacing the old buffer.
    pub fn regenerate(
        &mut self,
        device: &mut D,
        mode: GenerationMode,
        params: &GenerationParams<'_>,
    ) -> Result<(), GpuError> {
        let particles = sampler::generate(mode, params);
        self.replace(device, particles)?;
        log::info!(
            "Generated {} particles ({:?}, {:.2} MB)",
            self.particles.len(),
            mode,
            self.byte_size() as f64 / (1024.0 * 1024.0)
        );
        Ok(())
    }

    /// Uploads `particles` into a new buffer and view.
    ///
    /// On failure the previous buffer stays bound. An empty set drops the buffer.
    pub fn replace(&mut self, device: &mut D, particles: Vec<Particle>) -> Result<(), GpuError> {
        if particles.is_empty() {
            self.particles = particles;
            self.buffer = None;
            self.view = None;
            return Ok(());
        }

        let desc = BufferDesc {
            label: PARTICLE_BUFFER,
            usage: BufferUsage::Particles,
        };
        let buffer = device.create_buffer(&desc, bytemuck::cast_slice(&particles))?;
        let view = device.create_compute_view(&buffer)?;

        self.particles = particles;
        self.buffer = Some(buffer);
        self.view = Some(view);
        Ok(())
    }

    /// Particles the device will simulate, derived from the buffer size.
    pub fn particle_count(&self, device: &D) -> u32 {
        self.buffer
            .as_ref()
            .map_or(0, |buffer| (device.buffer_size(buffer) / Particle::STRIDE) as u32)
    }

    /// Particles as generated; the device copy moves on from here.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn byte_size(&self) -> usize {
        self.particles.len() * Particle::STRIDE as usize
    }

    pub fn buffer(&self) -> Option<&D::Buffer> {
        self.buffer.as_ref()
    }

    pub fn view(&self) -> Option<&D::View> {
        self.view.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryDevice;
    use crate::mesh::{Mesh, Triangle};
    use glam::Vec3;

    fn params(mesh: &Mesh, random_count: usize) -> GenerationParams<'_> {
        GenerationParams {
            mesh,
            texture: None,
            precision: 0.5,
            exploded: false,
            container_scale: Vec3::ONE,
            random_count,
        }
    }

    #[test]
    fn test_regenerate_sets_count() {
        let mut device = MemoryDevice::new();
        let mut store = ParticleStore::new();
        let mesh = Mesh::default();

        store
            .regenerate(&mut device, GenerationMode::RandomVolume, &params(&mesh, 1500))
            .unwrap();
        assert_eq!(store.particle_count(&device), 1500);
        assert_eq!(store.particles().len(), 1500);
    }

    #[test]
    fn test_shrinking_replaces_buffer_wholesale() {
        let mut device = MemoryDevice::new();
        let mut store = ParticleStore::new();
        let mesh = Mesh::new(vec![Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)]);

        store
            .regenerate(&mut device, GenerationMode::RandomVolume, &params(&mesh, 5000))
            .unwrap();
        let first_id = store.buffer().unwrap().id();

        store
            .regenerate(&mut device, GenerationMode::Wireframe, &params(&mesh, 5000))
            .unwrap();
        let buffer = store.buffer().unwrap();
        assert_ne!(buffer.id(), first_id);
        assert_eq!(store.particle_count(&device), 9);
        assert_eq!(buffer.bytes().len(), 9 * 64);
        assert_eq!(store.view().unwrap().buffer_id(), buffer.id());

        let uploaded: Vec<Particle> = bytemuck::pod_collect_to_vec(buffer.bytes());
        assert_eq!(uploaded, store.particles());
    }

    #[test]
    fn test_empty_generation_drops_buffer() {
        let mut device = MemoryDevice::new();
        let mut store = ParticleStore::new();
        let mesh = Mesh::default();

        store
            .regenerate(&mut device, GenerationMode::RandomVolume, &params(&mesh, 10))
            .unwrap();
        store
            .regenerate(&mut device, GenerationMode::Wireframe, &params(&mesh, 10))
            .unwrap();
        assert!(store.buffer().is_none());
        assert_eq!(store.particle_count(&device), 0);
    }

    #[test]
    fn test_failed_upload_keeps_previous_buffer() {
        let mut device = MemoryDevice::new().with_max_buffer_size(64 * 100);
        let mut store = ParticleStore::new();
        let mesh = Mesh::default();

        store
            .regenerate(&mut device, GenerationMode::RandomVolume, &params(&mesh, 100))
            .unwrap();
        let result = store.regenerate(&mut device, GenerationMode::RandomVolume, &params(&mesh, 101));

        assert!(matches!(result, Err(GpuError::BufferTooLarge { .. })));
        assert_eq!(store.particle_count(&device), 100);
        assert_eq!(store.particles().len(), 100);
    }
}
