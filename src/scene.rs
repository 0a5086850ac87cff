//! The application state object.
//!
//! A [`Scene`] owns every core subsystem (camera, controller, timer, mesh,
//! texture, particle store and container) and is driven once per frame through
//! [`Scene::update`]. It only talks to the graphics backend through a
//! [`Device`], so the whole frame can run headless on a
//! [`MemoryDevice`](crate::device::MemoryDevice).

use crate::camera::Camera;
use crate::config::Settings;
use crate::container::{ContainerMesh, CONTAINER_VERTEX_COUNT};
use crate::controller::InteractionController;
use crate::device::{ConstantSlot, Device, Topology};
use crate::error::GpuError;
use crate::input::{Input, KeyCode};
use crate::mesh::Mesh;
use crate::params::SimulationParameters;
use crate::sampler::{GenerationMode, GenerationParams};
use crate::step;
use crate::store::ParticleStore;
use crate::texture::Texture;
use crate::time::Time;
use glam::Vec3;

/// Operator-tunable values, edited live by the control panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    // Mesh
    pub mesh_path: String,
    pub mesh_scaling: f32,
    pub mesh_offset: Vec3,

    // Texture
    pub texture_path: String,

    // Generation
    pub precision: f32,
    pub wireframe: bool,
    pub exploded: bool,
    pub random_volume: bool,
    pub random_count: usize,

    // Simulation
    pub container_scale: Vec3,
    pub force_strength: f32,
    pub energy_retain: f32,
    pub return_home: bool,
}

impl Controls {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mesh_path: settings.mesh.path.clone(),
            mesh_scaling: settings.mesh.scaling,
            mesh_offset: settings.mesh.offset,
            texture_path: settings.texture.path.clone(),
            precision: settings.generation.precision,
            wireframe: settings.generation.wireframe,
            exploded: settings.generation.exploded,
            random_volume: settings.generation.random_volume,
            random_count: settings.generation.random_count,
            container_scale: settings.scene.container_scale,
            force_strength: settings.scene.force_strength,
            energy_retain: settings.scene.energy_retain,
            return_home: settings.scene.return_home,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Discrete requests raised by the control panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneActions {
    pub generate: bool,
    pub reload_mesh: bool,
    pub reload_texture: bool,
}

pub struct Scene<D: Device> {
    pub controls: Controls,
    pub camera: Camera,
    controller: InteractionController,
    time: Time,
    mesh: Mesh,
    texture: Texture,
    particles: ParticleStore<D>,
    container: ContainerMesh<D>,
    last_parameters: Option<SimulationParameters>,
}

impl<D: Device> Scene<D> {
    /// Loads configured resources, builds the container and generates the
    /// first particle set.
    pub fn new(device: &mut D, settings: &Settings) -> Result<Self, GpuError> {
        let mut camera = Camera::new(&settings.camera);
        camera.update_aspect_ratio(settings.window.width, settings.window.height);

        let mut scene = Self {
            controls: Controls::from_settings(settings),
            camera,
            controller: InteractionController::new(),
            time: Time::new(),
            mesh: Mesh::default(),
            texture: Texture::default(),
            particles: ParticleStore::new(),
            container: ContainerMesh::new(),
            last_parameters: None,
        };

        if !scene.controls.mesh_path.is_empty() {
            scene.reload_mesh();
        }
        if !scene.controls.texture_path.is_empty() {
            scene.reload_texture();
        }
        scene.sync_container(device)?;
        scene.generate(device)?;
        Ok(scene)
    }

    // ========== Resources ==========

    /// Reloads the mesh from `controls.mesh_path`. An empty path clears it.
    ///
    /// On failure the current mesh stays and the error is logged. Particles are
    /// not touched until the next generate.
    pub fn reload_mesh(&mut self) -> bool {
        let path = self.controls.mesh_path.trim();
        if path.is_empty() {
            self.mesh = Mesh::default();
            log::info!("Mesh cleared");
            return true;
        }
        match Mesh::load(path, self.controls.mesh_scaling, self.controls.mesh_offset) {
            Ok(mesh) => {
                log::info!(
                    "Loaded mesh {} ({} triangles, {:.2} MB)",
                    path,
                    mesh.len(),
                    mesh.byte_size() as f64 / (1024.0 * 1024.0)
                );
                self.mesh = mesh;
                true
            }
            Err(e) => {
                log::warn!("Keeping previous mesh, could not load {}: {}", path, e);
                false
            }
        }
    }

    /// Reloads the texture from `controls.texture_path`. An empty path clears it.
    pub fn reload_texture(&mut self) -> bool {
        let path = self.controls.texture_path.trim();
        if path.is_empty() {
            self.texture = Texture::default();
            log::info!("Texture cleared");
            return true;
        }
        match Texture::load(path) {
            Ok(texture) => {
                log::info!("Loaded texture {} ({}x{})", path, texture.width(), texture.height());
                self.texture = texture;
                true
            }
            Err(e) => {
                log::warn!("Keeping previous texture, could not load {}: {}", path, e);
                false
            }
        }
    }

    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = mesh;
    }

    // ========== Generation ==========

    /// Random volume without a mesh or when requested, else wireframe or surface.
    pub fn generation_mode(&self) -> GenerationMode {
        if self.mesh.is_empty() || self.controls.random_volume {
            GenerationMode::RandomVolume
        } else if self.controls.wireframe {
            GenerationMode::Wireframe
        } else {
            GenerationMode::Surface
        }
    }

    /// Replaces all particles. Also switches return home off.
    ///
    /// The random count is held to what one device buffer can take. A mesh
    /// that samples past that limit fails with [`GpuError::BufferTooLarge`]
    /// and leaves the previous particles in place.
    pub fn generate(&mut self, device: &mut D) -> Result<(), GpuError> {
        let max_particles = device.max_particles();
        if self.controls.random_count > max_particles {
            log::warn!(
                "Random count {} exceeds the device limit, using {}",
                self.controls.random_count,
                max_particles
            );
            self.controls.random_count = max_particles;
        }

        let mode = self.generation_mode();
        let params = GenerationParams {
            mesh: &self.mesh,
            texture: Some(&self.texture),
            precision: self.controls.precision,
            exploded: self.controls.exploded,
            container_scale: self.controls.container_scale,
            random_count: self.controls.random_count,
        };
        self.particles.regenerate(device, mode, &params)?;
        self.controls.return_home = false;
        Ok(())
    }

    /// Rebuilds the container if its extents or the background changed.
    pub fn sync_container(&mut self, device: &mut D) -> Result<(), GpuError> {
        self.container
            .sync(device, self.controls.container_scale, self.camera.background)?;
        Ok(())
    }

    /// Handles panel requests: reloads first, then generation.
    pub fn apply(&mut self, device: &mut D, actions: SceneActions) -> Result<(), GpuError> {
        if actions.reload_mesh {
            self.reload_mesh();
        }
        if actions.reload_texture {
            self.reload_texture();
        }
        if actions.generate {
            self.generate_or_keep(device)?;
        }
        Ok(())
    }

    /// Generates, but keeps the current particles when the new set does not
    /// fit on the device.
    fn generate_or_keep(&mut self, device: &mut D) -> Result<(), GpuError> {
        match self.generate(device) {
            Err(error @ GpuError::BufferTooLarge { .. }) => {
                log::warn!("Keeping previous particles: {}", error);
                Ok(())
            }
            result => result,
        }
    }

    // ========== Frame ==========

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.update_aspect_ratio(width, height);
    }

    /// Runs one frame: input, parameters, compute dispatch, then draws for
    /// the particles and the container.
    pub fn update(&mut self, device: &mut D, input: &Input) -> Result<(), GpuError> {
        let (elapsed, delta) = self.time.update();

        if input.key_pressed(KeyCode::H) {
            self.controls.return_home = !self.controls.return_home;
        }
        if input.key_pressed(KeyCode::Space) {
            self.generate_or_keep(device)?;
        }

        self.controller.update(input, &mut self.camera);
        let ray = self.controller.force_ray(input, &self.camera);

        let params = SimulationParameters::builder(self.particles.particle_count(device))
            .with_time(elapsed, delta)
            .with_ray(ray)
            .with_return_home(self.controls.return_home)
            .with_container(self.controls.container_scale)
            .with_energy(self.controls.force_strength, self.controls.energy_retain)
            .build();
        if params.ray_overrode_return_home {
            log::debug!("Force ray active, return home switched off");
            self.controls.return_home = false;
        }

        step::dispatch(device, &self.particles, &params);

        self.sync_container(device)?;
        device.bind_constants(ConstantSlot::Camera, bytemuck::bytes_of(&self.camera.uniforms()));
        if let Some(buffer) = self.particles.buffer() {
            device.bind_vertices(buffer, Topology::Points);
            device.draw(params.particle_count);
        }
        if let Some(buffer) = self.container.buffer() {
            device.bind_vertices(buffer, Topology::Lines);
            device.draw(CONTAINER_VERTEX_COUNT);
        }

        self.last_parameters = Some(params);
        Ok(())
    }

    // ========== Accessors ==========

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn particles(&self) -> &ParticleStore<D> {
        &self.particles
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Parameters sent to the kernel on the last frame.
    pub fn last_parameters(&self) -> Option<&SimulationParameters> {
        self.last_parameters.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Command, MemoryDevice};
    use crate::input::MouseButton;
    use crate::mesh::Triangle;
    use crate::params::ForceMode;
    use crate::particle::Particle;

    fn small_settings() -> Settings {
        let mut settings = Settings::default();
        settings.generation.random_count = 2000;
        settings
    }

    #[test]
    fn test_new_generates_random_volume() {
        let mut device = MemoryDevice::new();
        let scene = Scene::new(&mut device, &small_settings()).unwrap();
        assert_eq!(scene.generation_mode(), GenerationMode::RandomVolume);
        assert_eq!(scene.particles().particle_count(&device), 2000);
    }

    #[test]
    fn test_random_count_held_to_device_limit() {
        let mut device = MemoryDevice::new().with_max_buffer_size(1000 * Particle::STRIDE);
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        assert_eq!(scene.controls.random_count, 1000);
        assert_eq!(scene.particles().particle_count(&device), 1000);

        scene.controls.random_count = 4_000_000;
        scene.generate(&mut device).unwrap();
        assert_eq!(scene.controls.random_count, 1000);
        assert_eq!(scene.particles().particle_count(&device), 1000);
    }

    #[test]
    fn test_oversized_mesh_generation_is_not_fatal() {
        let mut device = MemoryDevice::new().with_max_buffer_size(1000 * Particle::STRIDE);
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        scene.set_mesh(Mesh::new(vec![Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)]));
        scene.controls.wireframe = true;
        scene.controls.precision = 0.001;
        let before = scene.particles().buffer().map(|b| b.id());

        assert!(matches!(scene.generate(&mut device), Err(GpuError::BufferTooLarge { .. })));
        let actions = SceneActions {
            generate: true,
            ..Default::default()
        };
        scene.apply(&mut device, actions).unwrap();

        let mut input = Input::new();
        input.set_key(KeyCode::Space, true);
        scene.update(&mut device, &input).unwrap();

        assert_eq!(scene.particles().buffer().map(|b| b.id()), before);
        assert_eq!(scene.particles().particle_count(&device), 1000);
    }

    #[test]
    fn test_missing_mesh_keeps_previous() {
        let mut device = MemoryDevice::new();
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        let mesh = Mesh::new(vec![Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)]);
        scene.set_mesh(mesh.clone());

        scene.controls.mesh_path = "no/such/mesh.obj".into();
        assert!(!scene.reload_mesh());
        assert_eq!(scene.mesh(), &mesh);
    }

    #[test]
    fn test_mode_selection() {
        let mut device = MemoryDevice::new();
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        scene.set_mesh(Mesh::new(vec![Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y)]));

        assert_eq!(scene.generation_mode(), GenerationMode::Surface);
        scene.controls.wireframe = true;
        assert_eq!(scene.generation_mode(), GenerationMode::Wireframe);
        scene.controls.random_volume = true;
        assert_eq!(scene.generation_mode(), GenerationMode::RandomVolume);
    }

    #[test]
    fn test_generate_clears_return_home() {
        let mut device = MemoryDevice::new();
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        scene.controls.return_home = true;
        scene
            .apply(&mut device, SceneActions { generate: true, ..Default::default() })
            .unwrap();
        assert!(!scene.controls.return_home);
    }

    #[test]
    fn test_ray_clears_return_home() {
        let mut device = MemoryDevice::new();
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        scene.controls.return_home = true;

        let mut input = Input::new();
        scene.update(&mut device, &input).unwrap();
        assert_eq!(scene.last_parameters().unwrap().force, ForceMode::ReturnHome);

        input.set_mouse_button(MouseButton::Left, true);
        scene.update(&mut device, &input).unwrap();
        assert!(matches!(scene.last_parameters().unwrap().force, ForceMode::Ray(_)));
        assert!(!scene.controls.return_home);
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut device = MemoryDevice::new();
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        let before = device.buffers_created();

        let mut input = Input::new();
        input.set_key(KeyCode::H, true);
        input.set_key(KeyCode::Space, true);
        scene.update(&mut device, &input).unwrap();

        // Space regenerated, which also cleared the toggle H just set
        assert_eq!(device.buffers_created(), before + 1);
        assert!(!scene.controls.return_home);
    }

    #[test]
    fn test_frame_order() {
        let mut device = MemoryDevice::new();
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        device.take_commands();

        scene.update(&mut device, &Input::new()).unwrap();
        let commands = device.take_commands();
        let kinds: Vec<&str> = commands
            .iter()
            .map(|c| match c {
                Command::Constants { slot: ConstantSlot::Simulation, .. } => "sim",
                Command::Constants { slot: ConstantSlot::Camera, .. } => "camera",
                Command::Dispatch { .. } => "dispatch",
                Command::Draw { topology: Topology::Points, .. } => "points",
                Command::Draw { topology: Topology::Lines, .. } => "lines",
            })
            .collect();
        assert_eq!(kinds, ["sim", "dispatch", "camera", "points", "lines"]);

        let Command::Dispatch { groups, .. } = &commands[1] else {
            unreachable!()
        };
        assert_eq!(groups[0], 2);
    }

    #[test]
    fn test_container_follows_controls() {
        let mut device = MemoryDevice::new();
        let mut scene = Scene::new(&mut device, &small_settings()).unwrap();
        let before = device.buffers_created();

        scene.update(&mut device, &Input::new()).unwrap();
        assert_eq!(device.buffers_created(), before);

        scene.controls.container_scale = Vec3::splat(3.0);
        scene.update(&mut device, &Input::new()).unwrap();
        assert_eq!(device.buffers_created(), before + 1);
    }
}
