//! Material trait and the scatter protocol.
//!
//! `scatter` draws an outgoing direction with its BRDF value and the pdf it
//! was drawn with; integrators weight the sample by `brdf · |cos| / pdf`.
//! A sample whose pdf is not strictly positive is never returned: it comes
//! back as [`ScatterError::Degenerate`] and the caller drops it.

use crate::sampling::{gen_f32, random_unit_vector, spherical_direction, Frame};
use crate::HitRecord;
use lux_core::Texture;
use lux_math::{can_refract, reflect, refract, Ray, Vec3};
use rand::RngCore;
use std::f32::consts::PI;
use thiserror::Error;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Why a material could not produce a sample.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterError {
    /// pdf <= 0, a zero-length direction, or a non-finite weight.
    #[error("degenerate sample: {0}")]
    Degenerate(&'static str),

    /// The material has no sampling BRDF.
    #[error("material does not support scattering")]
    Unsupported,
}

/// One sampled outgoing direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterSample {
    /// Unit outgoing direction
    pub direction: Vec3,
    pub brdf: Color,
    /// Strictly positive
    pub pdf: f32,
}

impl ScatterSample {
    /// Validate and normalize a sample.
    pub fn new(direction: Vec3, brdf: Color, pdf: f32) -> Result<Self, ScatterError> {
        if !(pdf > 0.0) || !pdf.is_finite() {
            return Err(ScatterError::Degenerate("pdf is not positive"));
        }
        let Some(direction) = direction.try_normalize() else {
            return Err(ScatterError::Degenerate("zero-length direction"));
        };
        if !brdf.is_finite() {
            return Err(ScatterError::Degenerate("non-finite brdf"));
        }
        Ok(Self {
            direction,
            brdf,
            pdf,
        })
    }

    /// Monte Carlo weight of this bounce: `brdf · |cos θ| / pdf`.
    #[inline]
    pub fn throughput(&self, normal: Vec3) -> Color {
        self.brdf * self.direction.dot(normal).abs() / self.pdf
    }
}

/// Options that change how materials sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScatterSettings {
    /// Cosine-weighted instead of uniform hemisphere sampling for diffuse
    /// surfaces.
    pub importance_sampling: bool,
}

/// Coefficients for the Blinn-Phong direct-lighting model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongParams {
    /// Ambient
    pub ra: f32,
    /// Diffuse
    pub rd: f32,
    /// Specular
    pub rs: f32,
    /// Secondary (mirror) reflection
    pub rg: f32,
    pub shininess: f32,
    /// Opacity; 1 is fully opaque
    pub gamma: f32,
    /// Index of refraction
    pub mu: f32,
    /// Base color at the hit point
    pub color: Color,
}

/// Material properties for optimization hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialProperties {
    /// True if `scatter` can produce samples
    pub can_scatter: bool,
    /// True if explicit light sampling applies (diffuse surfaces)
    pub can_use_light_sampling: bool,
    /// True if the material emits light
    pub is_emissive: bool,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Sample an outgoing direction for light arriving along `ray`.
    fn scatter(
        &self,
        ray: &Ray,
        hit: &HitRecord,
        settings: &ScatterSettings,
        rng: &mut dyn RngCore,
    ) -> Result<ScatterSample, ScatterError>;

    /// Coefficients for the direct-lighting integrator.
    fn phong(&self, hit: &HitRecord) -> PhongParams;

    /// Base color at the hit point.
    fn color(&self, hit: &HitRecord) -> Color;

    /// Get emitted light from this material.
    ///
    /// Most materials return black (no emission).
    fn emission(&self) -> Color {
        Color::ZERO
    }

    fn properties(&self) -> MaterialProperties;
}

/// Schlick's approximation for Fresnel reflectance.
///
/// `cosine` is the cosine of the incident angle and `eta` the ratio of
/// refractive indices.
pub fn reflectance(cosine: f32, eta: f32) -> f32 {
    let r0 = ((1.0 - eta) / (1.0 + eta)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

/// Lambertian (diffuse) material, optionally emissive.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Texture,
    emission: Color,
}

impl Lambertian {
    /// Ambient term used when shaded by the direct integrator.
    const AMBIENT: f32 = 0.05;

    /// Create a new Lambertian material with the given albedo.
    pub fn new(albedo: impl Into<Texture>) -> Self {
        Self {
            albedo: albedo.into(),
            emission: Color::ZERO,
        }
    }

    /// Make the surface emit `emission` (turning it into an area light for
    /// the path tracer).
    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }
}

impl Material for Lambertian {
    fn scatter(
        &self,
        _ray: &Ray,
        hit: &HitRecord,
        settings: &ScatterSettings,
        rng: &mut dyn RngCore,
    ) -> Result<ScatterSample, ScatterError> {
        let theta = 2.0 * PI * gen_f32(rng);
        let u = gen_f32(rng);

        let (phi, pdf) = if settings.importance_sampling {
            let phi = u.sqrt().acos();
            (phi, phi.cos() / PI)
        } else {
            // Uniform in solid angle: cos(phi) is uniform on [0, 1]
            (u.acos(), 1.0 / (2.0 * PI))
        };

        let frame = Frame::new(hit.tangent, hit.normal);
        let direction = frame.to_world(spherical_direction(theta, phi));

        ScatterSample::new(direction, self.color(hit) / PI, pdf)
    }

    fn phong(&self, hit: &HitRecord) -> PhongParams {
        PhongParams {
            ra: Self::AMBIENT,
            rd: 1.0,
            rs: 0.0,
            rg: 0.0,
            shininess: 1.0,
            gamma: 1.0,
            mu: 1.0,
            color: self.color(hit),
        }
    }

    fn color(&self, hit: &HitRecord) -> Color {
        self.albedo.value(hit.uv, hit.point)
    }

    fn emission(&self) -> Color {
        self.emission
    }

    fn properties(&self) -> MaterialProperties {
        MaterialProperties {
            can_scatter: true,
            can_use_light_sampling: true,
            is_emissive: self.emission.length_squared() > 0.0,
        }
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    color: Texture,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `color`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(color: impl Into<Texture>, fuzz: f32) -> Self {
        Self {
            color: color.into(),
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(
        &self,
        ray: &Ray,
        hit: &HitRecord,
        _settings: &ScatterSettings,
        rng: &mut dyn RngCore,
    ) -> Result<ScatterSample, ScatterError> {
        let reflected = reflect(ray.direction().normalize_or_zero(), hit.normal);
        let direction = (reflected + self.fuzz * random_unit_vector(rng)).normalize_or_zero();

        let cos = direction.dot(hit.normal);
        if cos <= 0.0 {
            return Err(ScatterError::Degenerate("reflection below the surface"));
        }

        // Dividing by the cosine cancels the caller's Lambert term
        ScatterSample::new(direction, self.color(hit) / cos, 1.0)
    }

    fn phong(&self, hit: &HitRecord) -> PhongParams {
        PhongParams {
            ra: 0.0,
            rd: 0.0,
            rs: 1.0,
            rg: 1.0,
            shininess: 64.0,
            gamma: 1.0,
            mu: 1.0,
            color: self.color(hit),
        }
    }

    fn color(&self, hit: &HitRecord) -> Color {
        self.color.value(hit.uv, hit.point)
    }

    fn properties(&self) -> MaterialProperties {
        MaterialProperties {
            can_scatter: true,
            can_use_light_sampling: false,
            is_emissive: false,
        }
    }
}

/// Dielectric (glass) material with Beer-Lambert absorption inside.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
    /// Absorption coefficient per unit distance travelled inside
    absorption: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self {
            ior,
            absorption: 0.0,
        }
    }

    pub fn with_absorption(mut self, absorption: f32) -> Self {
        self.absorption = absorption.max(0.0);
        self
    }

    pub fn ior(&self) -> f32 {
        self.ior
    }
}

impl Material for Dielectric {
    fn scatter(
        &self,
        ray: &Ray,
        hit: &HitRecord,
        _settings: &ScatterSettings,
        rng: &mut dyn RngCore,
    ) -> Result<ScatterSample, ScatterError> {
        let ratio = if hit.front_face { 1.0 / self.ior } else { self.ior };
        let unit_direction = ray.direction().normalize_or_zero();
        let cos_theta = (-unit_direction).dot(hit.normal).min(1.0);

        // Leaving the medium: absorb over the distance travelled inside
        let attenuation = if hit.front_face {
            1.0
        } else {
            let distance = (hit.t * ray.direction()).length();
            (-self.absorption * distance).exp()
        };

        let (direction, pdf) = if !can_refract(unit_direction, hit.normal, ratio) {
            (reflect(unit_direction, hit.normal), 1.0)
        } else {
            let r = reflectance(cos_theta, ratio);
            if gen_f32(rng) < r {
                (reflect(unit_direction, hit.normal), r)
            } else {
                (refract(unit_direction, hit.normal, ratio), 1.0 - r)
            }
        };

        let cos = direction.normalize_or_zero().dot(hit.normal).abs();
        let brdf = Color::splat(attenuation * pdf / cos);
        ScatterSample::new(direction, brdf, pdf)
    }

    fn phong(&self, _hit: &HitRecord) -> PhongParams {
        PhongParams {
            ra: 0.0,
            rd: 0.0,
            rs: 1.0,
            rg: 1.0,
            shininess: 128.0,
            gamma: 0.0,
            mu: self.ior,
            color: Color::ONE,
        }
    }

    fn color(&self, _hit: &HitRecord) -> Color {
        Color::ONE
    }

    fn properties(&self) -> MaterialProperties {
        MaterialProperties {
            can_scatter: true,
            can_use_light_sampling: false,
            is_emissive: false,
        }
    }
}

/// Phong-style material for the direct-lighting integrator only.
#[derive(Debug, Clone)]
pub struct Phong {
    params: PhongParams,
    texture: Texture,
}

impl Phong {
    /// `params.color` is ignored; the texture supplies the base color.
    pub fn new(params: PhongParams, texture: impl Into<Texture>) -> Self {
        Self {
            params,
            texture: texture.into(),
        }
    }
}

impl Material for Phong {
    fn scatter(
        &self,
        _ray: &Ray,
        _hit: &HitRecord,
        _settings: &ScatterSettings,
        _rng: &mut dyn RngCore,
    ) -> Result<ScatterSample, ScatterError> {
        Err(ScatterError::Unsupported)
    }

    fn phong(&self, hit: &HitRecord) -> PhongParams {
        PhongParams {
            color: self.color(hit),
            ..self.params
        }
    }

    fn color(&self, hit: &HitRecord) -> Color {
        self.texture.value(hit.uv, hit.point)
    }

    fn properties(&self) -> MaterialProperties {
        MaterialProperties {
            can_scatter: false,
            can_use_light_sampling: false,
            is_emissive: false,
        }
    }
}

impl Default for PhongParams {
    fn default() -> Self {
        Self {
            ra: 0.1,
            rd: 0.7,
            rs: 0.3,
            rg: 0.0,
            shininess: 32.0,
            gamma: 1.0,
            mu: 1.0,
            color: Color::ONE,
        }
    }
}
