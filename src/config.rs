//! Start-up settings, stored as JSON.
//!
//! Every section falls back to its defaults, so a settings file only needs
//! the values it changes:
//!
//! ```json
//! { "mesh": { "path": "assets/bunny.obj", "scaling": 5.0 } }
//! ```

use crate::color::Color;
use crate::error::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "particle-renderer.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Particle Renderer".into(),
            width: 1600,
            height: 900,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    /// Wavefront OBJ file; empty means no mesh.
    pub path: String,
    pub scaling: f32,
    pub offset: Vec3,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            scaling: 1.0,
            offset: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    /// PNG or JPEG file; empty means position coloring.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Initial distance from the origin.
    pub speed: f32,
    /// Radians per dragged pixel.
    pub sensitivity: f32,
    pub background: Color,
    /// Vertical, in degrees.
    pub field_of_view: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            speed: 3.0,
            sensitivity: 0.01,
            background: Color::new(50, 50, 50),
            field_of_view: 75.0,
            near_plane: 0.01,
            far_plane: 500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub precision: f32,
    pub wireframe: bool,
    pub exploded: bool,
    /// Scatter through the container even when a mesh is loaded.
    pub random_volume: bool,
    pub random_count: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            precision: 0.005,
            wireframe: false,
            exploded: false,
            random_volume: false,
            random_count: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub container_scale: Vec3,
    pub force_strength: f32,
    pub energy_retain: f32,
    pub return_home: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            container_scale: Vec3::ONE,
            force_strength: 1.0,
            energy_retain: 0.7,
            return_home: false,
        }
    }
}

/// All start-up settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub mesh: MeshSettings,
    pub texture: TextureSettings,
    pub camera: CameraSettings,
    pub generation: GenerationSettings,
    pub scene: SceneSettings,
}

impl Settings {
    /// Save the settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values that parse but cannot drive generation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let precision = self.generation.precision;
        if !precision.is_finite() || precision <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "generation.precision",
                message: format!("must be a positive step distance, got {}", precision),
            });
        }
        Ok(())
    }

    /// Loads `explicit` if given, else [`DEFAULT_SETTINGS_FILE`] if present, else defaults.
    pub fn discover(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                log::info!("Loading settings from {}", path.display());
                Self::load(path)
            }
            None if Path::new(DEFAULT_SETTINGS_FILE).is_file() => {
                log::info!("Loading settings from {}", DEFAULT_SETTINGS_FILE);
                Self::load(DEFAULT_SETTINGS_FILE)
            }
            None => {
                log::info!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }
}
