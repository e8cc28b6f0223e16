//! Image decoding stages.
//!
//! - **validate**: cheap header sniffing before a full decode
//! - **decode**: async decode of an [`ImageResource`](crate::intake::ImageResource)
//!   into a pixel-addressable image

pub mod decode;
pub mod validate;

pub use decode::{DecodedImage, ImageDecoder};
pub use validate::sniff;
