//! Parallel scanline scheduler.
//!
//! Each image row is one unit of work on a bounded rayon pool. Rows own
//! disjoint slices of the output buffer, so workers write without locks.
//! A panic inside a row is caught and reported; that row stays black and
//! the rest of the image is still produced.

use crate::error::RenderResult;
use crate::{Color, ImageBuffer, Renderer, Scene};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A row whose rendering panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub row: u32,
    pub message: String,
}

/// Result of a parallel render.
#[derive(Debug)]
pub struct RenderOutput {
    pub image: ImageBuffer,
    /// Sorted by row
    pub failures: Vec<RowFailure>,
    pub elapsed: Duration,
}

impl RenderOutput {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Renderer {
    /// Render with one task per scanline on `max_threads` workers.
    pub fn render_multithreaded(&self, scene: &Scene) -> RenderResult<RenderOutput> {
        let config = self.config();
        scene.validate(config.mode)?;

        let threads = config.thread_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lux-scanline-{i}"))
            .build()?;

        let camera = self.camera();
        let mut image = ImageBuffer::new(camera.image_width, camera.image_height);
        let width = image.width as usize;
        let tracer = self.tracer(scene);

        log::info!(
            "Rendering {}x{} image ({} spp, {:?}) on {} threads",
            image.width,
            image.height,
            config.samples_per_pixel,
            config.mode,
            threads
        );
        let start = Instant::now();

        let (tx, rx) = mpsc::channel();
        let progress = spawn_progress(image.height, config.show_progress, rx);

        let mut failures: Vec<RowFailure> = pool.install(|| {
            image
                .pixels
                .par_chunks_mut(width)
                .enumerate()
                .map_with(tx, |tx, (row, pixels)| {
                    let row = row as u32;
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        self.render_row(&tracer, row, pixels)
                    }));
                    // The progress thread only goes away once every sender
                    // is dropped, so this cannot fail in practice
                    let _ = tx.send(());

                    result.err().map(|payload| {
                        pixels.fill(Color::ZERO);
                        let failure = RowFailure {
                            row,
                            message: panic_message(payload.as_ref()),
                        };
                        log::error!("Row {} failed: {}", failure.row, failure.message);
                        failure
                    })
                })
                .flatten()
                .collect()
        });
        failures.sort_by_key(|f| f.row);

        if progress.join().is_err() {
            log::warn!("Progress thread panicked");
        }

        let elapsed = start.elapsed();
        if failures.is_empty() {
            log::info!("Render finished in {:.2?}", elapsed);
        } else {
            log::warn!(
                "Render finished in {:.2?} with {} failed rows",
                elapsed,
                failures.len()
            );
        }

        Ok(RenderOutput {
            image,
            failures,
            elapsed,
        })
    }
}

/// Drain one message per finished row into a progress bar.
fn spawn_progress(rows: u32, visible: bool, rx: Receiver<()>) -> JoinHandle<()> {
    thread::spawn(move || {
        let bar = if visible {
            ProgressBar::new(rows as u64)
        } else {
            ProgressBar::hidden()
        };
        match ProgressStyle::default_bar().template("{elapsed_precise} {bar:40} {pos}/{len} rows ETA: {eta}") {
            Ok(style) => bar.set_style(style),
            Err(err) => log::debug!("Falling back to the default progress style: {err}"),
        }

        for () in rx {
            bar.inc(1);
        }
        bar.finish();
    })
}

/// Text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackgroundConfig, IntegratorMode};
    use crate::{
        Dielectric, HitRecord, Lambertian, Material, MaterialProperties, Metal, PhongParams,
        Plane, Quad, RenderConfig, ScatterError, ScatterSample, ScatterSettings, Sphere,
    };
    use lux_math::{Ray, Vec3};
    use rand::RngCore;
    use std::sync::Arc;

    fn config(mode: IntegratorMode) -> RenderConfig {
        RenderConfig {
            image_width: 24,
            aspect_ratio: 1.5,
            look_from: Vec3::new(0.0, 1.0, 3.0),
            look_at: Vec3::new(0.0, 0.5, 0.0),
            samples_per_pixel: 4,
            max_depth: 5,
            mode,
            light_sampling: true,
            importance_sampling: true,
            background: BackgroundConfig::Solid {
                color: Color::new(0.5, 0.7, 1.0),
            },
            max_threads: Some(4),
            seed: 99,
            show_progress: false,
            ..RenderConfig::default()
        }
    }

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene
            .add_surface(
                Plane::new(Vec3::ZERO, Vec3::Y),
                Arc::new(Lambertian::new(Color::splat(0.5))),
            )
            .unwrap();
        scene
            .add_surface(
                Sphere::new(Vec3::new(-0.6, 0.5, 0.0), 0.5),
                Arc::new(Metal::new(Color::new(0.8, 0.6, 0.2), 0.1)),
            )
            .unwrap();
        scene
            .add_surface(Sphere::new(Vec3::new(0.6, 0.5, 0.0), 0.5), Arc::new(Dielectric::new(1.5)))
            .unwrap();
        scene
            .add_surface(
                Quad::new(Vec3::new(-0.5, 2.5, -0.5), Vec3::X, Vec3::Z),
                Arc::new(Lambertian::new(Color::ONE).with_emission(Color::splat(4.0))),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_parallel_matches_single_threaded() {
        let scene = scene();
        for mode in [IntegratorMode::PathTraced, IntegratorMode::Direct, IntegratorMode::Normals] {
            let renderer = Renderer::new(config(mode)).unwrap();

            let single = renderer.render(&scene).unwrap();
            let output = renderer.render_multithreaded(&scene).unwrap();

            assert!(output.is_complete());
            assert_eq!(output.image, single, "{mode:?}");
        }
    }

    /// Panics whenever it is shaded.
    struct Faulty;

    impl Material for Faulty {
        fn scatter(
            &self,
            _ray: &Ray,
            _hit: &HitRecord,
            _settings: &ScatterSettings,
            _rng: &mut dyn RngCore,
        ) -> Result<ScatterSample, ScatterError> {
            panic!("faulty material");
        }

        fn phong(&self, _hit: &HitRecord) -> PhongParams {
            panic!("faulty material");
        }

        fn color(&self, _hit: &HitRecord) -> Color {
            Color::ONE
        }

        fn properties(&self) -> MaterialProperties {
            MaterialProperties {
                can_scatter: true,
                ..MaterialProperties::default()
            }
        }
    }

    #[test]
    fn test_failed_rows_are_reported() {
        // A faulty sphere covering the top of the frame only
        let mut scene = Scene::new();
        scene
            .add_surface(Sphere::new(Vec3::new(0.0, 3.0, -6.0), 1.0), Arc::new(Faulty))
            .unwrap();
        let config = RenderConfig {
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            samples_per_pixel: 1,
            ..config(IntegratorMode::Direct)
        };
        let renderer = Renderer::new(config).unwrap();
        let output = renderer.render_multithreaded(&scene).unwrap();
        let image = &output.image;

        assert!(!output.is_complete());
        assert!(output.failures.windows(2).all(|w| w[0].row < w[1].row));
        for failure in &output.failures {
            assert_eq!(failure.message, "faulty material");
            for x in 0..image.width {
                assert_eq!(image.get(x, failure.row), Color::ZERO);
            }
        }

        // The bottom row never sees the sphere
        let last = image.height - 1;
        assert!(output.failures.iter().all(|f| f.row != last));
        assert_eq!(image.get(0, last), Color::new(0.5, 0.7, 1.0));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
