//! Image decoding with content-based format detection.
//!
//! Decoding is CPU-bound and runs on the blocking pool so the caller only
//! suspends. No size cap and no timeout are applied here.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::PipelineError;
use crate::intake::ImageResource;

use super::validate;

/// Decodes [`ImageResource`]s into pixel data.
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder;

/// Result of decoding an image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Size of the encoded input in bytes
    pub byte_size: u64,
}

impl DecodedImage {
    /// Wrap an in-memory image (used by tests and benches).
    pub fn from_image(image: DynamicImage, format: ImageFormat) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            format,
            width,
            height,
            byte_size: 0,
        }
    }
}

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a resource. Completes exactly once, with pixels or a `Decode` error.
    pub async fn decode(&self, resource: &ImageResource) -> Result<DecodedImage, PipelineError> {
        let start = std::time::Instant::now();
        let bytes = resource.shared_bytes();
        let source_name = resource.display_name().to_string();
        let task_name = source_name.clone();

        let decoded = tokio::task::spawn_blocking(move || Self::decode_bytes_sync(&bytes, &task_name))
            .await
            .map_err(|e| PipelineError::Decode {
                source_name: source_name.clone(),
                message: format!("Task join error: {}", e),
            })??;

        tracing::debug!(
            "Decoded {} as {} {}x{} in {:?}",
            source_name,
            format_to_string(decoded.format),
            decoded.width,
            decoded.height,
            start.elapsed()
        );
        Ok(decoded)
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    pub(crate) fn decode_bytes_sync(
        bytes: &Arc<[u8]>,
        source_name: &str,
    ) -> Result<DecodedImage, PipelineError> {
        let format = validate::check(bytes, source_name)?;

        let byte_size = bytes.len() as u64;
        let reader = image::ImageReader::with_format(Cursor::new(&bytes[..]), format);
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            byte_size,
        })
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
