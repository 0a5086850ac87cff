//! Error types for the particle renderer.
//!
//! Three families, matching how the application reacts to them:
//!
//! - [`GpuError`]: device or resource creation failed. Fatal, the frame loop stops.
//! - [`ResourceError`]: a mesh or texture could not be loaded. The previous
//!   resource stays in place and the failure is logged.
//! - [`ConfigError`]: the settings file could not be read, parsed or used.

use std::fmt;

/// Errors that can occur during GPU initialization or resource creation.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The adapter does not meet a limit the pipeline depends on.
    MissingLimits {
        name: &'static str,
        required: u32,
        available: u32,
    },
    /// A buffer exceeds what the device can bind.
    BufferTooLarge {
        label: String,
        size: u64,
        limit: u64,
    },
    /// A buffer was requested with no contents.
    EmptyBuffer { label: String },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::MissingLimits { name, required, available } => write!(
                f,
                "GPU limit '{}' is {} but {} is required",
                name, available, required
            ),
            GpuError::BufferTooLarge { label, size, limit } => write!(
                f,
                "Buffer '{}' needs {} bytes, device limit is {} bytes",
                label, size, limit
            ),
            GpuError::EmptyBuffer { label } => write!(f, "Buffer '{}' has no contents", label),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while loading a mesh or texture.
#[derive(Debug)]
pub enum ResourceError {
    /// Failed to read file from disk.
    Io(std::io::Error),
    /// Failed to decode an image file.
    Image(image::ImageError),
    /// A Wavefront OBJ line could not be understood.
    ObjParse { line: usize, message: String },
    /// The file parsed but contained no triangles.
    EmptyMesh,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Io(e) => write!(f, "Failed to read resource file: {}", e),
            ResourceError::Image(e) => write!(f, "Failed to load image: {}", e),
            ResourceError::ObjParse { line, message } => {
                write!(f, "OBJ parse error on line {}: {}", line, message)
            }
            ResourceError::EmptyMesh => write!(f, "Mesh contains no faces"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Io(e) => Some(e),
            ResourceError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ResourceError {
    fn from(e: std::io::Error) -> Self {
        ResourceError::Io(e)
    }
}

impl From<image::ImageError> for ResourceError {
    fn from(e: image::ImageError) -> Self {
        ResourceError::Image(e)
    }
}

/// Errors that can occur while reading or writing the settings file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A field parsed but holds a value the program cannot use.
    Invalid { field: &'static str, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access settings file: {}", e),
            ConfigError::Json(e) => write!(f, "Invalid settings file: {}", e),
            ConfigError::Invalid { field, message } => write!(f, "Invalid setting '{}': {}", field, message),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Errors that can occur when running the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization or resource creation failed.
    Gpu(GpuError),
    /// Settings could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            AppError::Window(e) => write!(f, "Failed to create window: {}", e),
            AppError::Gpu(e) => write!(f, "GPU error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Gpu(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(e: winit::error::OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<GpuError> for AppError {
    fn from(e: GpuError) -> Self {
        AppError::Gpu(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}
