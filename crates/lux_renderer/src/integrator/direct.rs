//! Recursive Blinn-Phong tracer with shadow rays.

use super::Tracer;
use crate::material::reflectance;
use crate::sampling::gen_f32;
use crate::{Color, HitRecord, PhongParams};
use lux_math::{can_refract, reflect, refract, Ray, Vec3};
use rand::RngCore;

impl Tracer<'_> {
    /// Color along `ray` with `depth` bounces of mirror reflection and
    /// refraction left.
    pub(crate) fn trace_direct(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        let Some(hit) = self.scene.hit(ray) else {
            return self.background(ray.direction()).clamp(Vec3::ZERO, Vec3::ONE);
        };

        let params = hit.material.phong(&hit);
        if depth == 0 {
            return params.color;
        }

        let mut color = self.shade(&hit, &params, rng) * params.gamma;

        let unit = ray.direction().normalize_or_zero();
        let reflected = Ray::new(hit.point, reflect(unit, hit.normal), ray.time()).nudge_forward();

        if params.gamma < 1.0 {
            let eta = if hit.front_face {
                1.0 / params.mu
            } else {
                params.mu
            };

            if can_refract(unit, hit.normal, eta) {
                let cos_theta = (-unit).dot(hit.normal).min(1.0);
                if gen_f32(rng) < reflectance(cos_theta, eta) {
                    color += self.trace_direct(&reflected, depth - 1, rng) * params.rg;
                } else {
                    let refracted =
                        Ray::new(hit.point, refract(unit, hit.normal, eta), ray.time())
                            .nudge_forward();
                    color += self.trace_direct(&refracted, depth - 1, rng) * (1.0 - params.gamma);
                }
            } else {
                color += self.trace_direct(&reflected, depth - 1, rng) * params.rg;
            }
        } else if params.rg > 0.0 {
            color += self.trace_direct(&reflected, depth - 1, rng) * params.rg;
        }

        color.clamp(Vec3::ZERO, Vec3::ONE)
    }

    /// Ambient plus diffuse and specular light from every visible light
    /// sample.
    fn shade(&self, hit: &HitRecord, params: &PhongParams, rng: &mut dyn RngCore) -> Color {
        let to_eye = (self.eye - hit.point).normalize_or_zero();
        let mut diffuse = Color::ZERO;
        let mut specular = Color::ZERO;

        for light in self.scene.lights() {
            let count = light.sample_count(self.config.area_light_samples);
            let weight = 1.0 / count as f32;

            for i in 0..count {
                let point = light.sample_point(i, count, rng);
                if !self.scene.has_path(hit.point, point) {
                    continue;
                }

                let to_light = (point - hit.point).normalize_or_zero();
                diffuse += weight * light.diffuse_intensity(point) * to_light.dot(hit.normal).max(0.0);

                let half = (to_light + to_eye).normalize_or_zero();
                specular += weight
                    * light.specular_intensity(point)
                    * half.dot(hit.normal).max(0.0).powf(params.shininess);
            }
        }

        params.ra * params.color + diffuse * params.rd * params.color + specular * params.rs
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{IntegratorMode, RenderConfig};
    use crate::integrator::Tracer;
    use crate::{Color, Dielectric, Lambertian, Light, Metal, Plane, Quad, Scene, Sphere};
    use lux_core::Texture;
    use lux_math::{Ray, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn config() -> RenderConfig {
        RenderConfig {
            mode: IntegratorMode::Direct,
            max_depth: 4,
            area_light_samples: 16,
            ..RenderConfig::default()
        }
    }

    /// Grey floor at y = 0 with a small sphere resting above it.
    fn floor_scene() -> Scene {
        let mut scene = Scene::new();
        scene
            .add_surface(
                Plane::new(Vec3::ZERO, Vec3::Y),
                Arc::new(Lambertian::new(Color::splat(0.5))),
            )
            .unwrap();
        scene
            .add_surface(
                Sphere::new(Vec3::new(0.0, 1.0, 0.0), 0.5),
                Arc::new(Lambertian::new(Color::splat(0.5))),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_depth_zero_returns_base_color() {
        let scene = floor_scene();
        let background = Texture::Solid(Color::ONE);
        let config = config();
        let tracer = Tracer::new(&scene, &background, Vec3::ZERO, &config);
        let mut rng = StdRng::seed_from_u64(1);

        let ray = Ray::new_simple(Vec3::new(3.0, 1.0, 0.0), -Vec3::Y);
        assert_eq!(tracer.trace_direct(&ray, 0, &mut rng), Color::splat(0.5));
    }

    #[test]
    fn test_point_light_shadow() {
        let mut scene = floor_scene();
        scene.add_light(Light::point(Vec3::new(0.0, 4.0, 0.0), Color::ONE));
        let background = Texture::Solid(Color::ZERO);
        let config = config();
        let eye = Vec3::new(0.0, 2.0, 4.0);
        let tracer = Tracer::new(&scene, &background, eye, &config);
        let mut rng = StdRng::seed_from_u64(2);

        // Floor directly under the sphere is in shadow: ambient only
        let shadowed = tracer.trace_direct(&Ray::new_simple(eye, -eye), 4, &mut rng);
        assert!((shadowed - Color::splat(0.05 * 0.5)).length() < 1e-5);

        // Floor off to the side is lit
        let target = Vec3::new(2.0, 0.0, 0.0);
        let lit = tracer.trace_direct(&Ray::new_simple(eye, target - eye), 4, &mut rng);
        assert!(lit.x > shadowed.x + 0.1);
    }

    #[test]
    fn test_area_light_soft_shadow() {
        let quad = Quad::new(Vec3::new(-1.0, 3.0, -1.0), Vec3::X * 2.0, Vec3::Z * 2.0);
        let mut scene = floor_scene();
        scene.add_light(Light::area(quad.clone(), Color::ONE));

        let mut open_scene = Scene::new();
        open_scene
            .add_surface(
                Plane::new(Vec3::ZERO, Vec3::Y),
                Arc::new(Lambertian::new(Color::splat(0.5))),
            )
            .unwrap();
        open_scene.add_light(Light::area(quad, Color::ONE));

        let background = Texture::Solid(Color::ZERO);
        let config = config();
        let eye = Vec3::new(0.0, 2.0, 4.0);
        let tracer = Tracer::new(&scene, &background, eye, &config);
        let open_tracer = Tracer::new(&open_scene, &background, eye, &config);
        let mut rng = StdRng::seed_from_u64(3);

        let umbra = tracer.trace_direct(&Ray::new_simple(eye, -eye), 4, &mut rng);
        let target = Vec3::new(0.8, 0.0, 0.0);
        let ray = Ray::new_simple(eye, target - eye);
        let penumbra = tracer.trace_direct(&ray, 4, &mut rng);
        let open = open_tracer.trace_direct(&ray, 4, &mut rng);

        assert!((umbra - Color::splat(0.05 * 0.5)).length() < 1e-5);
        assert!(umbra.x < penumbra.x);
        assert!(penumbra.x < open.x);
    }

    #[test]
    fn test_mirror_reflects_background() {
        let mut scene = Scene::new();
        scene
            .add_surface(Plane::new(Vec3::ZERO, Vec3::Y), Arc::new(Metal::new(Color::ONE, 0.0)))
            .unwrap();
        let background = Texture::Solid(Color::new(0.1, 0.6, 0.9));
        let config = config();
        let tracer = Tracer::new(&scene, &background, Vec3::new(0.0, 1.0, 1.0), &config);
        let mut rng = StdRng::seed_from_u64(4);

        let ray = Ray::new_simple(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, -1.0, -1.0));
        let color = tracer.trace_direct(&ray, 4, &mut rng);
        // No lights: the mirror shows exactly the reflected sky
        assert!((color - Color::new(0.1, 0.6, 0.9)).length() < 1e-5);
    }

    #[test]
    fn test_glass_transmits_background() {
        let mut scene = Scene::new();
        scene
            .add_surface(Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0), Arc::new(Dielectric::new(1.5)))
            .unwrap();
        let background = Texture::Solid(Color::splat(0.8));
        let config = config();
        let tracer = Tracer::new(&scene, &background, Vec3::ZERO, &config);
        let mut rng = StdRng::seed_from_u64(5);

        // Head-on, both interfaces usually refract straight through to
        // the background
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        let mut transmitted = 0;
        for _ in 0..100 {
            let color = tracer.trace_direct(&ray, 4, &mut rng);
            assert!(color.min_element() >= 0.0 && color.max_element() <= 1.0);
            if (color - Color::splat(0.8)).length() < 1e-4 {
                transmitted += 1;
            }
        }
        assert!(transmitted >= 80, "transmitted = {transmitted}");
    }
}
