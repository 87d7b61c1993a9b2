//! Lux Core - geometry and texture data for the renderer.
//!
//! This crate provides:
//!
//! - **Mesh data**: `TriangleMesh`, an indexed triangle list that scene
//!   builders fill from whatever file format they read
//! - **Textures**: solid, checkerboard and image textures sampled by uv
//!
//! Nothing here knows about rays or materials; the renderer turns these
//! into intersectable surfaces.

pub mod mesh;
pub mod texture;

// Re-export commonly used types
pub use mesh::{MeshTriangle, TriangleMesh};
pub use texture::{ImageTexture, Texture, TextureError, TextureResult};
