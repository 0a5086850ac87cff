//! CPU-side image used to color mesh-sampled particles.

use crate::error::ResourceError;
use glam::{Vec2, Vec3};
use std::path::Path;

/// An RGB image sampled with nearest-neighbour lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl Texture {
    /// Builds a texture from row-major pixels. Extra pixels are dropped, missing ones are black.
    pub fn from_rgb(width: u32, height: u32, mut pixels: Vec<[u8; 3]>) -> Self {
        pixels.resize(width as usize * height as usize, [0, 0, 0]);
        Self { width, height, pixels }
    }

    /// Decodes a PNG or JPEG from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let image = image::open(path)?.into_rgb8();
        let (width, height) = image.dimensions();
        let pixels = image.pixels().map(|p| p.0).collect();
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn byte_size(&self) -> usize {
        self.pixels.len() * 3
    }

    /// Color at `uv` with the origin in the top-left corner, in `[0, 1]` per channel.
    ///
    /// Coordinates outside `[0, 1]` clamp to the edge. An empty texture samples black.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        let x = texel(uv.x, self.width);
        let y = texel(uv.y, self.height);
        let [r, g, b] = self.pixels[y * self.width as usize + x];
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }
}

fn texel(coord: f32, extent: u32) -> usize {
    let scaled = (coord * extent as f32).floor();
    if scaled.is_nan() {
        return 0;
    }
    (scaled.max(0.0) as usize).min(extent as usize - 1)
}
