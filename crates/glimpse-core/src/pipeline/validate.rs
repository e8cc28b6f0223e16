//! Signature sniffing before a full decode.
//!
//! The declared MIME type of a submission is advisory; what the bytes start
//! with decides whether the decoder is worth running at all.

use image::ImageFormat;

use crate::error::PipelineError;

/// Shortest buffer that can carry any of the signatures below.
const MIN_SIGNATURE_LEN: usize = 4;

/// Leading bytes of each supported container, with the offset they sit at.
const SIGNATURES: &[(ImageFormat, usize, &[u8])] = &[
    (ImageFormat::Jpeg, 0, &[0xFF, 0xD8, 0xFF]),
    (ImageFormat::Png, 0, &[0x89, b'P', b'N', b'G']),
    (ImageFormat::Gif, 0, b"GIF8"),
    (ImageFormat::WebP, 8, b"WEBP"),
    (ImageFormat::Bmp, 0, b"BM"),
    (ImageFormat::Tiff, 0, &[b'I', b'I', 0x2A, 0x00]),
    (ImageFormat::Tiff, 0, &[b'M', b'M', 0x00, 0x2A]),
];

/// Identify the container from its leading bytes.
///
/// WebP additionally needs the `RIFF` wrapper at offset 0.
pub fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
    SIGNATURES
        .iter()
        .find(|(format, offset, magic)| {
            let matches = bytes
                .get(*offset..*offset + magic.len())
                .is_some_and(|window| window == *magic);
            matches && (*format != ImageFormat::WebP || bytes.starts_with(b"RIFF"))
        })
        .map(|(format, _, _)| *format)
}

/// Reject buffers that cannot be an image; returns the sniffed format.
pub fn check(bytes: &[u8], source_name: &str) -> Result<ImageFormat, PipelineError> {
    let reject = |message: &str| PipelineError::Decode {
        source_name: source_name.to_string(),
        message: message.to_string(),
    };

    if bytes.is_empty() {
        return Err(reject("File is empty (0 bytes)"));
    }
    if bytes.len() < MIN_SIGNATURE_LEN {
        return Err(reject("File too small to be a valid image"));
    }
    sniff(bytes).ok_or_else(|| reject("Unrecognized image format (invalid magic bytes)"))
}
