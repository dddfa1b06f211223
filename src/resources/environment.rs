//! Environment-map decoding: turns an equirectangular image (HDR or LDR)
//! into scene-wide lighting state.

use crate::{
    resources::{LoadError, load_binary},
    scene::Environment,
};

/// Decode an environment map from in-memory image bytes.
///
/// The average radiance of the map becomes the scene's ambient tint.
pub fn decode_environment(bytes: &[u8]) -> Result<Environment, LoadError> {
    let image = image::load_from_memory(bytes)?;
    let pixels = image.to_rgb32f();
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(LoadError::Decode("environment map has zero extent".into()));
    }

    let mut sum = [0.0f64; 3];
    for pixel in pixels.pixels() {
        sum[0] += pixel.0[0] as f64;
        sum[1] += pixel.0[1] as f64;
        sum[2] += pixel.0[2] as f64;
    }
    let count = width as f64 * height as f64;

    Ok(Environment {
        width,
        height,
        ambient: [
            (sum[0] / count) as f32,
            (sum[1] / count) as f32,
            (sum[2] / count) as f32,
        ],
    })
}

/// Fetch and decode an environment map from disk.
pub async fn load_environment(file_name: &str) -> Result<Environment, LoadError> {
    let bytes = load_binary(file_name).await?;
    decode_environment(&bytes)
}
