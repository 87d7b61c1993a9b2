//! Simple render example.
//!
//! Renders a small scene with spheres, a triangle mesh and both kinds of
//! lights, then saves the result.
//!
//! ```text
//! cargo run --release --example simple_render -- [config.json] [output.png]
//! ```
//!
//! Without a config file the scene is rendered in path-traced mode at a
//! modest sample count.

use anyhow::{Context, Result};
use lux_core::TriangleMesh;
use lux_renderer::{
    BackgroundConfig, Color, Dielectric, IntegratorMode, Lambertian, Light, Mesh, Metal, Plane,
    Quad, RenderConfig, Renderer, Scene, Sphere, Vec3,
};
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {path}"))?;
            RenderConfig::from_json_str(&json).with_context(|| format!("Invalid config {path}"))?
        }
        None => default_config(),
    };
    let output = args.next().unwrap_or_else(|| "output.png".to_string());

    let start = std::time::Instant::now();
    let scene = build_scene().context("Failed to build scene")?;
    log::info!("Scene built in {:?}", start.elapsed());

    let renderer = Renderer::new(config)?;
    let result = renderer.render_multithreaded(&scene)?;

    for failure in &result.failures {
        log::error!("Row {} was not rendered: {}", failure.row, failure.message);
    }

    result.image.save(&output)?;
    log::info!("Rendered in {:.2?}, saved to {}", result.elapsed, output);

    Ok(())
}

fn default_config() -> RenderConfig {
    RenderConfig {
        image_width: 400,
        samples_per_pixel: 64,
        max_depth: 8,
        mode: IntegratorMode::PathTraced,
        light_sampling: true,
        importance_sampling: true,
        look_from: Vec3::new(0.0, 1.5, 4.0),
        look_at: Vec3::new(0.0, 0.8, 0.0),
        background: BackgroundConfig::Solid {
            color: Color::new(0.05, 0.07, 0.1),
        },
        ..RenderConfig::default()
    }
}

fn build_scene() -> Result<Scene> {
    let mut scene = Scene::new();

    // Ground
    scene.add_surface(
        Plane::new(Vec3::ZERO, Vec3::Y),
        Arc::new(Lambertian::new(lux_core::Texture::Checkerboard {
            even: Color::splat(0.7),
            odd: Color::splat(0.2),
        })),
    )?;

    // Three main spheres
    scene.add_surface(
        Sphere::new(Vec3::new(-1.2, 0.5, 0.0), 0.5),
        Arc::new(Lambertian::new(Color::new(0.6, 0.2, 0.1))),
    )?;
    scene.add_surface(
        Sphere::new(Vec3::new(0.0, 0.5, -0.5), 0.5),
        Arc::new(Dielectric::new(1.5).with_absorption(0.2)),
    )?;
    scene.add_surface(
        Sphere::new(Vec3::new(1.2, 0.5, 0.0), 0.5),
        Arc::new(Metal::new(Color::new(0.8, 0.7, 0.6), 0.05)),
    )?;

    // Octahedron mesh in front
    let mut octahedron = octahedron();
    octahedron.place(Vec3::new(0.0, 0.35, 0.9), 0.35);
    scene.add_surface(
        Mesh::new(&octahedron),
        Arc::new(Lambertian::new(Color::new(0.2, 0.4, 0.7))),
    )?;

    // Emissive panel for the path tracer, matching area light for the
    // direct tracer
    let panel = Quad::new(Vec3::new(-0.75, 3.0, -0.75), Vec3::X * 1.5, Vec3::Z * 1.5);
    scene.add_surface(
        panel.clone(),
        Arc::new(Lambertian::new(Color::ONE).with_emission(Color::splat(6.0))),
    )?;
    scene.add_light(Light::area(panel, Color::splat(0.8)));
    scene.add_light(Light::point(Vec3::new(3.0, 4.0, 3.0), Color::splat(0.3)));

    Ok(scene)
}

/// Unit octahedron centered at the origin.
fn octahedron() -> TriangleMesh {
    let positions = vec![
        Vec3::X,
        -Vec3::X,
        Vec3::Y,
        -Vec3::Y,
        Vec3::Z,
        -Vec3::Z,
    ];
    let indices = vec![
        0, 2, 4, 4, 2, 1, 1, 2, 5, 5, 2, 0, // top
        4, 3, 0, 1, 3, 4, 5, 3, 1, 0, 3, 5, // bottom
    ];
    TriangleMesh::new(positions, indices, None)
}
