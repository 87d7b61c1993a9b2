//! Render configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! { "image_width": 320, "mode": "path_traced", "samples_per_pixel": 64 }
//! ```

use crate::error::{RenderError, RenderResult};
use lux_core::{Texture, TextureResult};
use lux_math::Vec3;
use serde::{Deserialize, Serialize};

/// Which light-transport algorithm computes pixel radiance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorMode {
    /// Recursive Blinn-Phong tracer with shadow rays to scene lights
    #[default]
    Direct,
    /// Iterative Monte Carlo path tracer
    PathTraced,
    /// Surface normals mapped to colors
    Normals,
}

/// What rays that escape the scene see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackgroundConfig {
    Solid { color: Vec3 },
    Checkerboard { even: Vec3, odd: Vec3 },
    /// Equirectangular environment image
    Image { path: String },
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        BackgroundConfig::Solid { color: Vec3::ZERO }
    }
}

impl BackgroundConfig {
    /// Build the texture; image backgrounds are read from disk.
    pub fn load(&self) -> TextureResult<Texture> {
        match self {
            BackgroundConfig::Solid { color } => Ok(Texture::Solid(*color)),
            BackgroundConfig::Checkerboard { even, odd } => Ok(Texture::Checkerboard {
                even: *even,
                odd: *odd,
            }),
            BackgroundConfig::Image { path } => Texture::open(path),
        }
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub image_width: u32,
    /// Width over height; the image height is derived from it
    pub aspect_ratio: f32,
    /// Vertical field of view in degrees
    pub vfov: f32,
    /// Variation angle of rays through each pixel
    pub defocus_angle: f32,
    /// Distance from camera to plane of perfect focus
    pub focus_dist: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vup: Vec3,

    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Shadow samples per area light in direct mode
    pub area_light_samples: u32,
    pub mode: IntegratorMode,
    /// Explicit emissive-surface sampling in path-traced mode
    pub light_sampling: bool,
    /// Cosine-weighted diffuse sampling
    pub importance_sampling: bool,
    pub background: BackgroundConfig,

    /// Worker threads; `None` uses every available core
    pub max_threads: Option<usize>,
    /// Base seed for the per-row random streams
    pub seed: u64,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_width: 600,
            aspect_ratio: 16.0 / 9.0,
            vfov: 60.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            look_from: Vec3::new(0.0, 1.0, 1.0),
            look_at: Vec3::new(0.0, 1.0, -1.0),
            vup: Vec3::Y,
            samples_per_pixel: 1000,
            max_depth: 8,
            area_light_samples: 10,
            mode: IntegratorMode::Direct,
            light_sampling: false,
            importance_sampling: false,
            background: BackgroundConfig::default(),
            max_threads: None,
            seed: 0,
            show_progress: true,
        }
    }
}

impl RenderConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> RenderResult<Self> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Image height derived from width and aspect ratio (at least 1).
    pub fn image_height(&self) -> u32 {
        ((self.image_width as f32 / self.aspect_ratio) as u32).max(1)
    }

    /// Worker count, resolving `None` to the machine's parallelism.
    pub fn thread_count(&self) -> usize {
        self.max_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn validate(&self) -> RenderResult<()> {
        let invalid = |msg: &str| Err(RenderError::InvalidConfig(msg.to_string()));

        if self.image_width == 0 {
            return invalid("image_width must be positive");
        }
        if !(self.aspect_ratio > 0.0) || !self.aspect_ratio.is_finite() {
            return invalid("aspect_ratio must be positive");
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return invalid("vfov must be in (0, 180) degrees");
        }
        if self.defocus_angle < 0.0 {
            return invalid("defocus_angle must not be negative");
        }
        if !(self.focus_dist > 0.0) {
            return invalid("focus_dist must be positive");
        }
        if self.samples_per_pixel == 0 {
            return invalid("samples_per_pixel must be positive");
        }
        if self.max_threads == Some(0) {
            return invalid("max_threads must be positive");
        }

        let forward = self.look_at - self.look_from;
        if forward.length_squared() == 0.0 {
            return invalid("look_from and look_at must differ");
        }
        if forward.cross(self.vup).length_squared() == 0.0 {
            return invalid("vup must not be parallel to the view direction");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.image_width, 600);
        assert_eq!(config.image_height(), 337);
        assert_eq!(config.samples_per_pixel, 1000);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.area_light_samples, 10);
        assert_eq!(config.mode, IntegratorMode::Direct);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = RenderConfig::from_json_str(
            r#"{
                "image_width": 64,
                "aspect_ratio": 1.0,
                "mode": "path_traced",
                "light_sampling": true,
                "background": { "type": "checkerboard", "even": [1, 1, 1], "odd": [0, 0, 0] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.image_height(), 64);
        assert_eq!(config.mode, IntegratorMode::PathTraced);
        assert!(config.light_sampling);
        assert_eq!(config.vfov, 60.0);
        assert_eq!(
            config.background,
            BackgroundConfig::Checkerboard {
                even: Vec3::ONE,
                odd: Vec3::ZERO
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            RenderConfig::from_json_str(r#"{ "samples_per_pixel": 0 }"#),
            Err(RenderError::InvalidConfig(_))
        ));
        assert!(matches!(
            RenderConfig::from_json_str(r#"{ "look_at": [0, 1, 1] }"#),
            Err(RenderError::InvalidConfig(_))
        ));
        assert!(matches!(
            RenderConfig::from_json_str(r#"{ "mode": "wireframe" }"#),
            Err(RenderError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_tiny_image_height_is_at_least_one() {
        let config = RenderConfig {
            image_width: 1,
            aspect_ratio: 4.0,
            ..RenderConfig::default()
        };
        assert_eq!(config.image_height(), 1);
    }

    #[test]
    fn test_missing_background_image() {
        let background = BackgroundConfig::Image {
            path: "does/not/exist.png".to_string(),
        };
        assert!(background.load().is_err());
    }
}
