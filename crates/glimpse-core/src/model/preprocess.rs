//! Image preprocessing for classification.
//!
//! - Resize so the shortest edge is `resize_size`
//! - Center crop to `input_size × input_size`
//! - Normalize per channel: `(pixel/255 - mean) / std`
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

use crate::config::ModelConfig;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// Preprocess an image into a `[1, 3, input_size, input_size]` tensor.
pub fn preprocess(image: &DynamicImage, config: &ModelConfig) -> Array4<f32> {
    let crop = config.input_size;
    let (w, h) = (image.width().max(1), image.height().max(1));
    let short = config.resize_size as f32;
    let (new_w, new_h) = if w < h {
        (config.resize_size, ((h as f32 / w as f32) * short).round() as u32)
    } else {
        (((w as f32 / h as f32) * short).round() as u32, config.resize_size)
    };
    let resized = image.resize_exact(
        new_w.max(crop),
        new_h.max(crop),
        image::imageops::FilterType::Triangle,
    );

    let crop_x = resized.width().saturating_sub(crop) / 2;
    let crop_y = resized.height().saturating_sub(crop) / 2;
    let rgb = resized.crop_imm(crop_x, crop_y, crop, crop).to_rgb8();

    let size = crop as usize;
    Array4::from_shape_fn((1, CHANNELS, size, size), |(_, c, y, x)| {
        let val = rgb.get_pixel(x as u32, y as u32)[c];
        (val as f32 / 255.0 - config.mean[c]) / config.std[c]
    })
}
