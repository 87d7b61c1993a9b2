//! Iterative Monte Carlo path tracer.
//!
//! The loop keeps the running product of bounce throughputs, so the result
//! is `Σᵢ radianceᵢ · Πⱼ<ᵢ throughputⱼ` without recursion.

use super::Tracer;
use crate::{Color, HitRecord, SurfaceId};
use lux_math::Ray;
use rand::RngCore;
use std::f32::consts::PI;

impl Tracer<'_> {
    pub(crate) fn trace_path(&self, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        let mut ray = *ray;
        let mut hit = self.scene.hit(&ray);
        let mut total = Color::ZERO;
        let mut throughput = Color::ONE;

        for _ in 0..self.config.max_depth {
            let Some(record) = hit else {
                total += throughput * self.background(ray.direction());
                break;
            };

            let material = record.material;
            let properties = material.properties();
            let mut radiance = material.emission();

            let sample = match material.scatter(&ray, &record, &self.settings, rng) {
                Ok(sample) => sample,
                Err(err) => {
                    log::trace!("Path absorbed at {}: {}", record.surface, err);
                    total += throughput * radiance;
                    break;
                }
            };

            let next_ray = Ray::new(record.point, sample.direction, ray.time()).nudge_forward();
            let next_hit = self.scene.hit(&next_ray);

            if self.config.light_sampling && properties.can_use_light_sampling {
                if let Some((light, contribution)) = self.sample_light(&record, rng) {
                    // Skip when the bounce itself reaches the light, which
                    // would count it twice
                    if next_hit.map_or(true, |next| next.surface != light) {
                        radiance += contribution;
                    }
                }
            }

            total += throughput * radiance;
            if properties.is_emissive {
                break;
            }

            throughput *= sample.throughput(record.normal);
            ray = next_ray;
            hit = next_hit;
        }

        total
    }

    /// Direct light from one random point on one random emissive surface.
    ///
    /// The probability that a uniform hemisphere bounce would have hit the
    /// light is approximated by its projected solid angle over 2π.
    fn sample_light(&self, record: &HitRecord, rng: &mut dyn RngCore) -> Option<(SurfaceId, Color)> {
        let id = self.scene.random_emissive(rng)?;
        let light = self.scene.surface(id);
        let area = light.shape.area()?;
        let point = light.shape.sample(rng)?;

        if !self.scene.has_path(record.point, point.point) {
            return None;
        }

        let to_light = point.point - record.point;
        let distance_squared = to_light.length_squared();
        if distance_squared <= 0.0 {
            return None;
        }
        let direction = to_light / distance_squared.sqrt();

        let projected_area = direction.dot(point.normal).abs() * area;
        let probability = projected_area / distance_squared / (2.0 * PI);

        let contribution = light.material.emission()
            * (probability * direction.dot(record.normal)).max(0.0)
            * record.material.color(record);
        Some((id, contribution))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{IntegratorMode, RenderConfig};
    use crate::integrator::Tracer;
    use crate::{Color, Lambertian, Metal, Plane, Quad, Scene, Sphere};
    use lux_core::Texture;
    use lux_math::{Ray, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn config() -> RenderConfig {
        RenderConfig {
            mode: IntegratorMode::PathTraced,
            max_depth: 8,
            importance_sampling: true,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_diffuse_floor_under_sky() {
        // With cosine sampling every bounce off an upward-facing floor
        // escapes, carrying exactly albedo · sky.
        let mut scene = Scene::new();
        scene
            .add_surface(
                Plane::new(Vec3::ZERO, Vec3::Y),
                Arc::new(Lambertian::new(Color::new(0.5, 0.25, 1.0))),
            )
            .unwrap();
        let background = Texture::Solid(Color::splat(0.8));
        let config = config();
        let tracer = Tracer::new(&scene, &background, Vec3::Y, &config);
        let mut rng = StdRng::seed_from_u64(1);

        let ray = Ray::new_simple(Vec3::Y, Vec3::new(0.3, -1.0, 0.2));
        for _ in 0..50 {
            let color = tracer.trace(&ray, &mut rng);
            assert!((color - Color::new(0.4, 0.2, 0.8)).length() < 1e-4, "{color}");
        }
    }

    #[test]
    fn test_emissive_hit_stops_path() {
        let mut scene = Scene::new();
        scene
            .add_surface(
                Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0),
                Arc::new(Lambertian::new(Color::ONE).with_emission(Color::splat(3.0))),
            )
            .unwrap();
        let background = Texture::Solid(Color::splat(100.0));
        let config = config();
        let tracer = Tracer::new(&scene, &background, Vec3::ZERO, &config);
        let mut rng = StdRng::seed_from_u64(2);

        let color = tracer.trace(&Ray::new_simple(Vec3::ZERO, -Vec3::Z), &mut rng);
        assert_eq!(color, Color::splat(3.0));
    }

    #[test]
    fn test_zero_depth_is_black() {
        let scene = Scene::new();
        let background = Texture::Solid(Color::ONE);
        let config = RenderConfig {
            max_depth: 0,
            ..config()
        };
        let tracer = Tracer::new(&scene, &background, Vec3::ZERO, &config);
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(tracer.trace(&Ray::new_simple(Vec3::ZERO, Vec3::Z), &mut rng), Color::ZERO);
    }

    #[test]
    fn test_absorbed_path_keeps_emission_so_far() {
        // A grazing ray off a fully fuzzy metal often scatters below the
        // surface; those paths end black.
        let mut scene = Scene::new();
        scene
            .add_surface(Plane::new(Vec3::ZERO, Vec3::Y), Arc::new(Metal::new(Color::ONE, 1.0)))
            .unwrap();
        let background = Texture::Solid(Color::ONE);
        let config = config();
        let tracer = Tracer::new(&scene, &background, Vec3::ZERO, &config);
        let mut rng = StdRng::seed_from_u64(4);

        let ray = Ray::new_simple(Vec3::new(-1.0, 0.01, 0.0), Vec3::new(1.0, -0.01, 0.0));
        let mut absorbed = 0;
        for _ in 0..200 {
            let color = tracer.trace(&ray, &mut rng);
            assert!(color.is_finite());
            if color == Color::ZERO {
                absorbed += 1;
            }
        }
        assert!(absorbed > 0);
    }

    #[test]
    fn test_light_sampling_brightens_small_light() {
        // Floor lit by a small emitter overhead, black sky
        let build = |light_sampling: bool| {
            let mut scene = Scene::new();
            scene
                .add_surface(
                    Plane::new(Vec3::ZERO, Vec3::Y),
                    Arc::new(Lambertian::new(Color::splat(0.5))),
                )
                .unwrap();
            scene
                .add_surface(
                    Quad::new(Vec3::new(-0.25, 2.0, -0.25), Vec3::Z * 0.5, Vec3::X * 0.5),
                    Arc::new(Lambertian::new(Color::ONE).with_emission(Color::splat(10.0))),
                )
                .unwrap();
            let config = RenderConfig {
                light_sampling,
                max_depth: 2,
                ..config()
            };
            (scene, config)
        };
        let background = Texture::Solid(Color::ZERO);
        let ray = Ray::new_simple(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, -1.0, -1.0));

        let mean = |light_sampling: bool| {
            let (scene, config) = build(light_sampling);
            let tracer = Tracer::new(&scene, &background, Vec3::ZERO, &config);
            let mut rng = StdRng::seed_from_u64(5);
            let n = 20_000;
            let mut sum = Color::ZERO;
            for _ in 0..n {
                sum += tracer.trace(&ray, &mut rng);
            }
            sum / n as f32
        };

        let without = mean(false);
        let with = mean(true);
        assert!(with.x > 0.0);
        assert!(with.x > without.x);
    }
}
