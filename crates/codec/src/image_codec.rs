//! Compressed-image decoding.

use contracts::{ImageData, PipelineError};
use ndarray::Array3;

/// Decode a compressed image payload to an `H x W x 3` u8 pixel array.
///
/// The container format (JPEG/PNG/...) is sniffed from the payload; the
/// recorded `format` string is only used for error context. The first
/// decoded shape of a run fixes the dataset's image shape.
pub fn decode_image(image: &ImageData) -> Result<Array3<u8>, PipelineError> {
    let decoded = image::load_from_memory(&image.data).map_err(|e| {
        PipelineError::decode(
            format!("camera image ({})", image.format),
            e.to_string(),
        )
    })?;

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    Array3::from_shape_vec((height as usize, width as usize, 3), rgb.into_raw())
        .map_err(|e| PipelineError::decode("camera image", e.to_string()))
}
