//! Benchmarks for CPU-side particle generation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use particle_renderer::mesh::{Mesh, Triangle};
use particle_renderer::sampler::{self, Coloring};
use particle_renderer::texture::Texture;

/// A flat grid of `n * n * 2` triangles covering `[-1, 1]` in x and y.
fn grid_mesh(n: usize) -> Mesh {
    let step = 2.0 / n as f32;
    let mut triangles = Vec::with_capacity(n * n * 2);
    for i in 0..n {
        for j in 0..n {
            let x = -1.0 + i as f32 * step;
            let y = -1.0 + j as f32 * step;
            let a = Vec3::new(x, y, 0.0);
            let b = Vec3::new(x + step, y, 0.0);
            let c = Vec3::new(x, y + step, 0.0);
            let d = Vec3::new(x + step, y + step, 0.0);
            triangles.push(Triangle::new(a, b, c));
            triangles.push(Triangle::new(b, d, c));
        }
    }
    Mesh::new(triangles)
}

fn checker_texture(size: u32) -> Texture {
    let pixels = (0..size * size)
        .map(|i| if (i / size + i % size) % 2 == 0 { [255, 255, 255] } else { [0, 0, 0] })
        .collect();
    Texture::from_rgb(size, size, pixels)
}

fn bench_wireframe(c: &mut Criterion) {
    let mut group = c.benchmark_group("wireframe");
    let mesh = grid_mesh(32);

    for precision in [0.01f32, 0.005] {
        group.bench_with_input(BenchmarkId::from_parameter(precision), &precision, |b, &d| {
            b.iter(|| {
                black_box(sampler::sample_wireframe(
                    mesh.triangles(),
                    d,
                    false,
                    Coloring::Position,
                ))
            })
        });
    }

    group.finish();
}

fn bench_surface(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface");
    group.sample_size(20);
    let mesh = grid_mesh(8);
    let texture = checker_texture(256);

    for precision in [0.01f32, 0.005] {
        group.bench_with_input(BenchmarkId::new("position", precision), &precision, |b, &d| {
            b.iter(|| {
                black_box(sampler::sample_surface(
                    mesh.triangles(),
                    d,
                    false,
                    Coloring::Position,
                ))
            })
        });
        group.bench_with_input(BenchmarkId::new("texture", precision), &precision, |b, &d| {
            b.iter(|| {
                black_box(sampler::sample_surface(
                    mesh.triangles(),
                    d,
                    true,
                    Coloring::Texture(&texture),
                ))
            })
        });
    }

    group.finish();
}

fn bench_random_volume(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_volume");
    group.sample_size(20);

    for count in [10_000usize, 100_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
            b.iter(|| black_box(sampler::random_volume(n, Vec3::ONE)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_wireframe, bench_surface, bench_random_volume);
criterion_main!(benches);
