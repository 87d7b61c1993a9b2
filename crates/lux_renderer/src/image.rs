//! Linear-color image buffer and its encoders.

use crate::error::RenderResult;
use crate::Color;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// PPM flavour written by [`ImageBuffer::write_ppm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpmFormat {
    /// P3, one text line per pixel
    Ascii,
    /// P6, raw bytes
    Binary,
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 && linear.is_finite() {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGB: gamma 2, clamped, non-finite
/// channels written as 0.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let encode = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [encode(color.x), encode(color.y), encode(color.z)]
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let [r, g, b] = color_to_rgb(color);
    [r, g, b, 255]
}

/// Row-major buffer of linear RGB pixels; row 0 is the top of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Number of pixels with a NaN or infinite channel.
    pub fn non_finite_count(&self) -> usize {
        self.pixels.iter().filter(|c| !c.is_finite()).count()
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }

    /// Convert to packed 8-bit RGB triples.
    pub fn to_rgb8(&self) -> Vec<[u8; 3]> {
        self.pixels.iter().map(|c| color_to_rgb(*c)).collect()
    }

    pub fn write_ppm<W: Write>(&self, mut writer: W, format: PpmFormat) -> RenderResult<()> {
        let rgb = self.to_rgb8();
        match format {
            PpmFormat::Ascii => {
                writeln!(writer, "P3\n{} {}\n255", self.width, self.height)?;
                for [r, g, b] in rgb {
                    writeln!(writer, "{r} {g} {b}")?;
                }
            }
            PpmFormat::Binary => {
                writeln!(writer, "P6\n{} {}\n255", self.width, self.height)?;
                writer.write_all(bytemuck::cast_slice(&rgb))?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Save to `path`. `.ppm` is written as binary PPM; anything else goes
    /// through the `image` crate, which picks the format from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        let is_ppm = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));

        if is_ppm {
            let writer = BufWriter::new(File::create(path)?);
            self.write_ppm(writer, PpmFormat::Binary)?;
        } else {
            let rgb = self.to_rgb8();
            ::image::save_buffer(
                path,
                bytemuck::cast_slice(&rgb),
                self.width,
                self.height,
                ::image::ColorType::Rgb8,
            )?;
        }
        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}
