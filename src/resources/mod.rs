//! Asynchronous asset loading: fetch and decode external files into the
//! scene-side data model.
//!
//! Fetching and decoding are split so the decode paths can be exercised on
//! in-memory bytes. A load either produces a complete value or an error;
//! nothing downstream sees a partially decoded asset.

use std::path::Path;

pub mod environment;
pub mod model;

pub use environment::{decode_environment, load_environment};
pub use model::{decode_gltf, load_model_gltf};

/// Failure of an asynchronous asset fetch or decode.
///
/// Surfaces to the caller that initiated the load; the scene and the
/// updatable registry stay exactly as they were.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF parse error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read a whole file. Paths are taken as given; callers decide where their
/// assets live.
pub async fn load_binary(file_name: &str) -> Result<Vec<u8>, LoadError> {
    let data = tokio::fs::read(Path::new(file_name)).await?;
    Ok(data)
}
