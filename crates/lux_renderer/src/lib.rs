//! Lux renderer - offline CPU ray tracing.
//!
//! Scenes are built from [`Shape`]s paired with [`Material`]s plus a set of
//! [`Light`]s. A [`Renderer`] turns a scene into an [`ImageBuffer`] using one
//! of three integrators:
//!
//! - a recursive Blinn-Phong tracer with shadow rays (direct lighting)
//! - an iterative Monte Carlo path tracer
//! - a normal visualizer for debugging geometry
//!
//! Triangle meshes are accelerated by a kd-tree ([`kdtree::TriangleTree`]).
//! Rendering is parallel over scanlines on a rayon pool.

mod camera;
mod config;
mod error;
mod hit;
mod image;
mod integrator;
pub mod kdtree;
mod light;
mod material;
mod mesh;
mod plane;
mod quad;
mod renderer;
pub mod sampling;
mod scanline;
mod scene;
mod shape;
mod sphere;
mod triangle;

pub use camera::Camera;
pub use config::{BackgroundConfig, IntegratorMode, RenderConfig};
pub use error::{RenderError, RenderResult};
pub use hit::{HitRecord, SurfaceId};
pub use self::image::{color_to_rgba, linear_to_gamma, ImageBuffer, PpmFormat};
pub use integrator::Tracer;
pub use light::{AreaLight, Light};
pub use material::{
    reflectance, Color, Dielectric, Lambertian, Material, MaterialProperties, Metal, Phong,
    PhongParams, ScatterError, ScatterSample, ScatterSettings,
};
pub use mesh::Mesh;
pub use plane::Plane;
pub use quad::Quad;
pub use renderer::{render_pixel, Renderer};
pub use scanline::{RenderOutput, RowFailure};
pub use scene::{Scene, SceneError, Surface};
pub use shape::{Shape, ShapeHit, SurfaceSample};
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from lux_math
pub use lux_math::{Aabb, Interval, Ray, Vec2, Vec3};
