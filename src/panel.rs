//! The egui control panel.
//!
//! Edits [`Controls`](crate::scene::Controls) and the camera background in place and reports
//! discrete button presses as [`SceneActions`]. Container edits need no
//! action; the scene notices changed extents or background on its own.

use crate::color::Color;
use crate::device::Device;
use crate::particle::Particle;
use crate::scene::{Scene, SceneActions};
use glam::Vec3;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
/// Upper end of the random-count slider on devices that allow more.
const MAX_RANDOM_COUNT: usize = 4_000_000;

/// Random counts the device can hold in one particle buffer.
fn random_count_range<D: Device>(device: &D) -> std::ops::RangeInclusive<usize> {
    1..=device.max_particles().clamp(1, MAX_RANDOM_COUNT)
}

pub fn show<D: Device>(ctx: &egui::Context, scene: &mut Scene<D>, device: &D) -> SceneActions {
    let mut actions = SceneActions::default();

    egui::Window::new("Scene")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            mesh_section(ui, scene, &mut actions);
            ui.separator();
            texture_section(ui, scene, &mut actions);
            ui.separator();
            generation_section(ui, scene, device, &mut actions);
            ui.separator();
            simulation_section(ui, scene);
            ui.separator();
            camera_section(ui, scene);
        });

    actions
}

fn mesh_section<D: Device>(ui: &mut egui::Ui, scene: &mut Scene<D>, actions: &mut SceneActions) {
    ui.heading("Mesh");
    let mesh = scene.mesh();
    ui.label(format!(
        "Vertices: {} ({:.2} MB)",
        mesh.len() * 3,
        mesh.byte_size() as f64 / BYTES_PER_MB
    ));

    let controls = &mut scene.controls;
    ui.horizontal(|ui| {
        ui.label("Scaling");
        ui.add(egui::DragValue::new(&mut controls.mesh_scaling).speed(0.1).range(-1e6..=1e6));
    });
    drag_vec3(ui, "Offset", &mut controls.mesh_offset, 0.1, -1e6..=1e6);
    ui.horizontal(|ui| {
        ui.label("Path");
        ui.text_edit_singleline(&mut controls.mesh_path);
    });
    if ui.button("Reload mesh").clicked() {
        actions.reload_mesh = true;
    }
}

fn texture_section<D: Device>(ui: &mut egui::Ui, scene: &mut Scene<D>, actions: &mut SceneActions) {
    ui.heading("Texture");
    let texture = scene.texture();
    ui.label(format!(
        "Size: {}x{} ({:.2} MB)",
        texture.width(),
        texture.height(),
        texture.byte_size() as f64 / BYTES_PER_MB
    ));

    ui.horizontal(|ui| {
        ui.label("Path");
        ui.text_edit_singleline(&mut scene.controls.texture_path);
    });
    if ui.button("Reload texture").clicked() {
        actions.reload_texture = true;
    }
}

fn generation_section<D: Device>(
    ui: &mut egui::Ui,
    scene: &mut Scene<D>,
    device: &D,
    actions: &mut SceneActions,
) {
    ui.heading("Particles");
    let store = scene.particles();
    let cpu_count = store.particles().len();
    let gpu_count = store.particle_count(device);
    ui.label(format!(
        "CPU: {} ({:.2} MB)",
        cpu_count,
        store.byte_size() as f64 / BYTES_PER_MB
    ));
    ui.label(format!(
        "GPU: {} ({:.2} MB)",
        gpu_count,
        gpu_count as f64 * Particle::STRIDE as f64 / BYTES_PER_MB
    ));
    ui.label(format!("Mode: {:?}", scene.generation_mode()));
    let scatters = scene.mesh().is_empty();

    let controls = &mut scene.controls;
    ui.horizontal(|ui| {
        ui.label("Precision");
        ui.add(
            egui::DragValue::new(&mut controls.precision)
                .speed(0.0001)
                .range(0.0001..=0.1)
                .fixed_decimals(4),
        );
    });
    ui.checkbox(&mut controls.wireframe, "Wireframe");
    ui.checkbox(&mut controls.exploded, "Exploded");
    ui.horizontal(|ui| {
        ui.checkbox(&mut controls.random_volume, "Random volume");
        ui.add_enabled(
            controls.random_volume || scatters,
            egui::DragValue::new(&mut controls.random_count)
                .speed(1000.0)
                .range(random_count_range(device)),
        );
    });
    if ui.button("Generate").clicked() {
        actions.generate = true;
    }
}

fn simulation_section<D: Device>(ui: &mut egui::Ui, scene: &mut Scene<D>) {
    ui.heading("Simulation");
    let controls = &mut scene.controls;
    drag_vec3(ui, "Container", &mut controls.container_scale, 0.1, 0.0..=1e6);
    ui.horizontal(|ui| {
        ui.label("Force strength");
        ui.add(egui::DragValue::new(&mut controls.force_strength).speed(0.1));
    });
    ui.horizontal(|ui| {
        ui.label("Energy retain");
        ui.add(egui::DragValue::new(&mut controls.energy_retain).speed(0.01).range(0.0..=1.0));
    });
    ui.checkbox(&mut controls.return_home, "Return home");
}

fn camera_section<D: Device>(ui: &mut egui::Ui, scene: &mut Scene<D>) {
    ui.heading("Camera");
    let mut background = scene.camera.background.to_array();
    ui.horizontal(|ui| {
        ui.label("Background");
        if ui.color_edit_button_srgb(&mut background).changed() {
            scene.camera.background = Color::from_array(background);
        }
    });

    let origin = scene.camera.origin;
    let forward = scene.camera.forward();
    ui.label(format!("Origin: {:.2} {:.2} {:.2}", origin.x, origin.y, origin.z));
    ui.label(format!("Direction: {:.2} {:.2} {:.2}", forward.x, forward.y, forward.z));
    ui.label(format!("Distance: {:.2}", scene.camera.speed));
    ui.label(format!("FPS: {:.0}", scene.time().fps()));
}

fn drag_vec3(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut Vec3,
    speed: f64,
    range: std::ops::RangeInclusive<f32>,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        for component in [&mut value.x, &mut value.y, &mut value.z] {
            ui.add(egui::DragValue::new(component).speed(speed).range(range.clone()));
        }
    });
}
