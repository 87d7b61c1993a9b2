//! Renderer error types.

use crate::scene::SceneError;
use lux_core::TextureError;
use thiserror::Error;

/// Errors that stop a render before (or instead of) producing an image.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse render configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("failed to load background: {0}")]
    Texture(#[from] TextureError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode image: {0}")]
    Image(#[from] ::image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;
