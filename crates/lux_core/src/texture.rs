//! Textures sampled by materials and the environment.
//!
//! Image textures are decoded once at startup into linear RGB floats; a
//! failed load is fatal before rendering begins.

use std::path::Path;
use std::sync::Arc;

use lux_math::{Vec2, Vec3};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("texture {path} has zero size")]
    Empty { path: String },

    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A color source evaluated at a surface's uv coordinates (or, for procedural
/// patterns, its world-space point).
#[derive(Clone, Debug)]
pub enum Texture {
    /// The same color everywhere.
    Solid(Vec3),
    /// A 3D checker pattern of unit cells in world space.
    Checkerboard { even: Vec3, odd: Vec3 },
    /// A decoded image, shared between every surface that uses it.
    Image(Arc<ImageTexture>),
}

impl Texture {
    /// Evaluate the texture at `uv` / world point `p`.
    pub fn value(&self, uv: Vec2, p: Vec3) -> Vec3 {
        match self {
            Texture::Solid(color) => *color,
            Texture::Checkerboard { even, odd } => {
                let cell = p.floor();
                let sum = (cell.x + cell.y + cell.z) as i64;
                if sum.rem_euclid(2) == 0 {
                    *even
                } else {
                    *odd
                }
            }
            Texture::Image(image) => image.sample(uv.x, uv.y),
        }
    }

    /// Load an image texture from disk.
    pub fn open(path: impl AsRef<Path>) -> TextureResult<Self> {
        Ok(Texture::Image(Arc::new(ImageTexture::open(path)?)))
    }
}

impl Default for Texture {
    fn default() -> Self {
        Texture::Solid(Vec3::ZERO)
    }
}

impl From<Vec3> for Texture {
    fn from(color: Vec3) -> Self {
        Texture::Solid(color)
    }
}

/// A loaded image with linear RGB pixel data.
///
/// `(u, v) = (0, 0)` is the top-left pixel; both wrap around.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    /// Row-major, linear 0-1 range
    pixels: Vec<Vec3>,
    path: String,
}

impl ImageTexture {
    /// Create a texture from linear pixel data.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> TextureResult<Self> {
        let expected = width as usize * height as usize;
        if expected == 0 {
            return Err(TextureError::Empty {
                path: "<memory>".to_string(),
            });
        }
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            path: "<memory>".to_string(),
        })
    }

    /// Decode an image file, converting sRGB values to linear.
    pub fn open(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let img = image::open(path).map_err(|source| TextureError::Load {
            path: display.clone(),
            source,
        })?;

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { path: display });
        }

        let pixels = rgb
            .pixels()
            .map(|p| {
                Vec3::new(
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                )
            })
            .collect();

        log::debug!("Loaded texture: {} ({}x{})", display, width, height);

        Ok(Self {
            width,
            height,
            pixels,
            path: display,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Original file path (for diagnostics).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sample the texture at uv with bilinear filtering.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = u * (self.width as f32 - 1.0);
        let y = v * (self.height as f32 - 1.0);

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let top = self.pixel(x0, y0).lerp(self.pixel(x1, y0), fx);
        let bottom = self.pixel(x0, y1).lerp(self.pixel(x1, y1), fx);

        top.lerp(bottom, fy)
    }

    fn pixel(&self, x: u32, y: u32) -> Vec3 {
        let idx = (y * self.width + x) as usize;
        self.pixels.get(idx).copied().unwrap_or(Vec3::ZERO)
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
