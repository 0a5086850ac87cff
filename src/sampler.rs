//! Geometry sampling: turns a mesh (or an empty box) into particles.
//!
//! Everything is built on [`edge_walk`], which steps along a segment at a fixed
//! distance. Wireframe mode walks every triangle edge. Surface mode walks two
//! rails of each triangle in lockstep and edge-walks a scan line between them.
//! Random-volume mode ignores the mesh and scatters particles through the
//! container in parallel.
//!
//! Sampled count is never requested directly; it falls out of mesh size and
//! the step distance.

use crate::mesh::{Mesh, Triangle};
use crate::particle::Particle;
use crate::texture::Texture;
use glam::{Vec2, Vec3};
use rand::Rng;
use rayon::prelude::*;

/// Per-axis velocity range given to mesh particles in exploded mode.
pub const EXPLODED_SCATTER: f32 = 0.25;
/// Per-axis velocity range given to random-volume particles.
pub const RANDOM_DRIFT: f32 = 0.1;
/// Most steps taken along one segment, whatever its length.
pub const MAX_WALK_STEPS: usize = 1 << 24;

/// How particles are seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Uniform scatter inside the container, no mesh needed.
    #[default]
    RandomVolume,
    /// Points along every triangle edge.
    Wireframe,
    /// Scan lines sweeping every triangle's interior.
    Surface,
}

/// Inputs to [`generate`].
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams<'a> {
    pub mesh: &'a Mesh,
    pub texture: Option<&'a Texture>,
    /// Step distance between neighbouring samples.
    pub precision: f32,
    pub exploded: bool,
    pub container_scale: Vec3,
    pub random_count: usize,
}

/// Color source for mesh-sampled particles.
#[derive(Debug, Clone, Copy)]
pub enum Coloring<'a> {
    /// `(position + 1) / 2`, clamped to `[0, 1]`.
    Position,
    /// Texture sample at the barycentric texture coordinate, V flipped.
    Texture(&'a Texture),
}

impl<'a> Coloring<'a> {
    /// Texture coloring when a non-empty texture is present.
    pub fn from_texture(texture: Option<&'a Texture>) -> Self {
        match texture {
            Some(texture) if !texture.is_empty() => Coloring::Texture(texture),
            _ => Coloring::Position,
        }
    }

    fn color(&self, triangle: &Triangle, point: Vec3) -> Vec3 {
        match self {
            Coloring::Position => position_color(point),
            Coloring::Texture(texture) => {
                let uv = triangle.texture_at(point);
                texture.sample(Vec2::new(uv.x, 1.0 - uv.y))
            }
        }
    }
}

/// Maps `[-1, 1]` world coordinates onto `[0, 1]` color channels.
pub fn position_color(point: Vec3) -> Vec3 {
    ((point + Vec3::ONE) * 0.5).clamp(Vec3::ZERO, Vec3::ONE)
}

/// `floor(distance / step)` capped at [`MAX_WALK_STEPS`], or 0 when the step
/// is unusable.
pub fn step_count(distance: f32, step: f32) -> usize {
    if !step.is_finite() || step <= 0.0 {
        return 0;
    }
    let steps = (distance / step).floor();
    if steps.is_finite() && steps > 0.0 {
        (steps as usize).min(MAX_WALK_STEPS)
    } else {
        0
    }
}

/// Points from `start` toward `end`, spaced `step` apart, `start` included.
///
/// Yields `floor(|end - start| / step) + 1` points. The last one may fall
/// short of `end` by less than `step`. A zero-length segment yields `start` once.
/// Segments longer than [`MAX_WALK_STEPS`] steps stop after that many.
pub fn edge_walk(start: Vec3, end: Vec3, step: f32) -> EdgeWalk {
    let offset = end - start;
    EdgeWalk {
        start,
        stride: offset.normalize_or_zero() * step.max(0.0),
        index: 0,
        count: step_count(offset.length(), step).saturating_add(1),
    }
}

/// Iterator returned by [`edge_walk`].
#[derive(Debug, Clone)]
pub struct EdgeWalk {
    start: Vec3,
    stride: Vec3,
    index: usize,
    count: usize,
}

impl Iterator for EdgeWalk {
    type Item = Vec3;

    fn next(&mut self) -> Option<Vec3> {
        if self.index >= self.count {
            return None;
        }
        let point = self.start + self.stride * self.index as f32;
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EdgeWalk {}

/// Accumulates particles for walks over one mesh.
struct LineSampler<'a, R> {
    precision: f32,
    exploded: bool,
    coloring: Coloring<'a>,
    rng: R,
    particles: Vec<Particle>,
}

impl<'a, R: Rng> LineSampler<'a, R> {
    fn new(precision: f32, exploded: bool, coloring: Coloring<'a>, rng: R) -> Self {
        Self {
            precision,
            exploded,
            coloring,
            rng,
            particles: Vec::new(),
        }
    }

    fn walk(&mut self, triangle: &Triangle, start: Vec3, end: Vec3) {
        let points = edge_walk(start, end, self.precision);
        self.particles.reserve(points.len());
        for home in points {
            let velocity = if self.exploded {
                scatter(&mut self.rng, EXPLODED_SCATTER)
            } else {
                Vec3::ZERO
            };
            let color = self.coloring.color(triangle, home);
            self.particles.push(Particle::new(home, velocity, color));
        }
    }

    fn wireframe(&mut self, triangle: &Triangle) {
        let (a, b, c) = (triangle.a.world, triangle.b.world, triangle.c.world);
        self.walk(triangle, a, b);
        self.walk(triangle, b, c);
        self.walk(triangle, c, a);
    }

    fn surface(&mut self, triangle: &Triangle) {
        let [left, right, apex] = rails(triangle);
        let left_offset = apex - left;
        let right_offset = apex - right;
        let left_dir = left_offset.normalize_or_zero();
        let right_dir = right_offset.normalize_or_zero();

        let steps = step_count(left_offset.length(), self.precision)
            .min(step_count(right_offset.length(), self.precision));
        for i in 0..=steps {
            let travelled = i as f32 * self.precision;
            self.walk(triangle, left + left_dir * travelled, right + right_dir * travelled);
        }
    }
}

/// Rail starts and shared apex: the apex sits opposite the shortest edge,
/// so the two rails are the longer edges. Ties keep AB, BC, CA order.
fn rails(triangle: &Triangle) -> [Vec3; 3] {
    let (a, b, c) = (triangle.a.world, triangle.b.world, triangle.c.world);
    let candidates = [[a, b, c], [b, c, a], [c, a, b]];
    let mut best = candidates[0];
    let mut best_len = a.distance_squared(b);
    for candidate in &candidates[1..] {
        let len = candidate[0].distance_squared(candidate[1]);
        if len < best_len {
            best = *candidate;
            best_len = len;
        }
    }
    best
}

fn scatter(rng: &mut impl Rng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..=extent),
        rng.gen_range(-extent..=extent),
        rng.gen_range(-extent..=extent),
    )
}

/// Points along every edge of every triangle.
pub fn sample_wireframe(triangles: &[Triangle], precision: f32, exploded: bool, coloring: Coloring<'_>) -> Vec<Particle> {
    let mut sampler = LineSampler::new(precision, exploded, coloring, rand::thread_rng());
    for triangle in triangles {
        sampler.wireframe(triangle);
    }
    sampler.particles
}

/// Scan lines covering every triangle's interior.
pub fn sample_surface(triangles: &[Triangle], precision: f32, exploded: bool, coloring: Coloring<'_>) -> Vec<Particle> {
    let mut sampler = LineSampler::new(precision, exploded, coloring, rand::thread_rng());
    for triangle in triangles {
        sampler.surface(triangle);
    }
    sampler.particles
}

/// `count` particles uniform in `[-scale, scale]` per axis, colored by where
/// they sit in the box. Runs on the rayon pool.
pub fn random_volume(count: usize, scale: Vec3) -> Vec<Particle> {
    let extent = scale.abs();
    (0..count)
        .into_par_iter()
        .map_init(rand::thread_rng, |rng, _| {
            let home = Vec3::new(
                uniform(rng, extent.x),
                uniform(rng, extent.y),
                uniform(rng, extent.z),
            );
            Particle::new(home, scatter(rng, RANDOM_DRIFT), box_color(home, extent))
        })
        .collect()
}

fn uniform(rng: &mut impl Rng, extent: f32) -> f32 {
    if extent > 0.0 && extent.is_finite() {
        rng.gen_range(-extent..=extent)
    } else {
        0.0
    }
}

fn box_color(home: Vec3, extent: Vec3) -> Vec3 {
    let channel = |p: f32, s: f32| if s > 0.0 { (p + s) / (2.0 * s) } else { 0.5 };
    Vec3::new(
        channel(home.x, extent.x),
        channel(home.y, extent.y),
        channel(home.z, extent.z),
    )
}

/// Produces a fresh particle array for `mode`.
pub fn generate(mode: GenerationMode, params: &GenerationParams<'_>) -> Vec<Particle> {
    let coloring = Coloring::from_texture(params.texture);
    let triangles = params.mesh.triangles();
    match mode {
        GenerationMode::RandomVolume => random_volume(params.random_count, params.container_scale),
        GenerationMode::Wireframe => sample_wireframe(triangles, params.precision, params.exploded, coloring),
        GenerationMode::Surface => sample_surface(triangles, params.precision, params.exploded, coloring),
    }
}
