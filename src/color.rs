//! 8-bit RGB colors used for the background and container edges.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Complement of every channel (`255 - c`).
    pub const fn inverted(self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Channels scaled to `[0, 1]`.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted() {
        assert_eq!(Color::new(50, 0, 255).inverted(), Color::new(205, 255, 0));
        assert_eq!(Color::BLACK.inverted().inverted(), Color::BLACK);
    }

    #[test]
    fn test_to_vec3() {
        assert_eq!(Color::new(255, 0, 255).to_vec3(), Vec3::new(1.0, 0.0, 1.0));
    }
}
