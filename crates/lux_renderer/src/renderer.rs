//! Renderer: configuration, camera and background bound together.
//!
//! [`Renderer::render`] is a single-threaded reference renderer; the
//! parallel scanline scheduler lives in [`crate::scanline`]. Both seed one
//! random stream per row, so they produce identical images.

use crate::error::RenderResult;
use crate::integrator::Tracer;
use crate::sampling::row_seed;
use crate::{Camera, Color, ImageBuffer, RenderConfig, Scene};
use lux_core::Texture;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Everything needed to turn a [`Scene`] into an image.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    camera: Camera,
    background: Texture,
}

impl Renderer {
    /// Validate `config`, load its background and set up the camera.
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        config.validate()?;
        let background = config.background.load()?;
        let camera = Camera::from_config(&config);

        Ok(Self {
            config,
            camera,
            background,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Integrator bound to `scene`.
    pub fn tracer<'a>(&'a self, scene: &'a Scene) -> Tracer<'a> {
        Tracer::new(scene, &self.background, self.camera.center(), &self.config)
    }

    /// Render the entire scene on the calling thread.
    pub fn render(&self, scene: &Scene) -> RenderResult<ImageBuffer> {
        scene.validate(self.config.mode)?;

        let mut image = ImageBuffer::new(self.camera.image_width, self.camera.image_height);
        let tracer = self.tracer(scene);
        let width = image.width as usize;

        for (row, pixels) in image.pixels.chunks_mut(width).enumerate() {
            self.render_row(&tracer, row as u32, pixels);
        }

        Ok(image)
    }

    /// Fill one scanline. The row's random stream depends only on the seed
    /// and the row index.
    pub(crate) fn render_row(&self, tracer: &Tracer, row: u32, pixels: &mut [Color]) {
        let mut rng = StdRng::seed_from_u64(row_seed(self.config.seed, row));

        for (x, pixel) in pixels.iter_mut().enumerate() {
            *pixel = render_pixel(
                &self.camera,
                tracer,
                x as u32,
                row,
                self.config.samples_per_pixel,
                &mut rng,
            );
        }
    }
}

/// Render a single pixel with multi-sampling.
///
/// Non-finite samples are dropped and the rest averaged; a pixel whose
/// samples were all dropped is black.
pub fn render_pixel(
    camera: &Camera,
    tracer: &Tracer,
    x: u32,
    y: u32,
    samples: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;
    let mut accepted = 0u32;

    for _ in 0..samples {
        // Camera.get_ray already adds random offset for anti-aliasing
        let ray = camera.get_ray(x, y, rng);
        let sample = tracer.trace(&ray, rng);
        if sample.is_finite() {
            pixel_color += sample;
            accepted += 1;
        }
    }

    if accepted < samples {
        log::trace!("Pixel ({x}, {y}): dropped {} non-finite samples", samples - accepted);
    }
    if accepted == 0 {
        return Color::ZERO;
    }
    pixel_color / accepted as f32
}
