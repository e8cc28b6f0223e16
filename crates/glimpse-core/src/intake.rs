//! Image intake: turns a picked file or a drop payload into an [`ImageResource`].
//!
//! The adapter only produces resources. Handing them to the session is the
//! caller's job, so nothing here touches shared state.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// MIME prefix every acceptable drop item must carry.
const IMAGE_MIME_PREFIX: &str = "image/";

/// Where a resource came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Picked,
    Dropped,
}

/// A file delivered by a file picker.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub name: Option<String>,
}

/// One entry of a drag-and-drop payload.
#[derive(Debug, Clone)]
pub struct DroppedItem {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub name: Option<String>,
}

impl PickedFile {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a file from disk the way a picker would hand it over.
    ///
    /// The MIME type is inferred from the extension.
    pub fn from_path(path: &Path, limits: &LimitsConfig) -> PipelineResult<Self> {
        let (bytes, mime_type, name) = read_with_limits(path, limits)?;
        Ok(Self {
            bytes,
            mime_type,
            name,
        })
    }
}

impl DroppedItem {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a file from disk as if it had been dropped onto the window.
    pub fn from_path(path: &Path, limits: &LimitsConfig) -> PipelineResult<Self> {
        let (bytes, mime_type, name) = read_with_limits(path, limits)?;
        Ok(Self {
            bytes,
            mime_type,
            name,
        })
    }

    /// Whether the declared type is in the image category.
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime_type)
    }
}

/// Raw, not-yet-decoded image bytes plus their declared type.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone)]
pub struct ImageResource {
    bytes: Arc<[u8]>,
    mime_type: String,
    origin: ImageOrigin,
    name: Option<String>,
    content_hash: String,
}

impl ImageResource {
    fn new(bytes: Vec<u8>, mime_type: String, origin: ImageOrigin, name: Option<String>) -> Self {
        let content_hash = blake3::hash(&bytes).to_hex().to_string();
        Self {
            bytes: bytes.into(),
            mime_type,
            origin,
            name,
            content_hash,
        }
    }

    /// Build a resource from a picker selection.
    ///
    /// `None` means the picker closed without a file.
    pub fn from_pick(file: Option<PickedFile>) -> PipelineResult<Self> {
        let file = file.ok_or(PipelineError::NoImageSelected)?;
        tracing::debug!(
            "Picked {} ({}, {} bytes)",
            file.name.as_deref().unwrap_or("<unnamed>"),
            file.mime_type,
            file.bytes.len()
        );
        Ok(Self::new(
            file.bytes,
            file.mime_type,
            ImageOrigin::Picked,
            file.name,
        ))
    }

    /// Build a resource from the first image item of a drop payload.
    ///
    /// Items whose type is not `image/*` are skipped.
    pub fn from_drop(items: Vec<DroppedItem>) -> PipelineResult<Self> {
        let rejected = items
            .first()
            .map(|item| item.mime_type.clone())
            .unwrap_or_else(|| "empty payload".to_string());

        let item = items
            .into_iter()
            .find(DroppedItem::is_image)
            .ok_or(PipelineError::UnsupportedDropItem {
                mime_type: rejected,
            })?;

        tracing::debug!(
            "Dropped {} ({}, {} bytes)",
            item.name.as_deref().unwrap_or("<unnamed>"),
            item.mime_type,
            item.bytes.len()
        );
        Ok(Self::new(
            item.bytes,
            item.mime_type,
            ImageOrigin::Dropped,
            item.name,
        ))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for logs and error messages.
    pub fn display_name(&self) -> &str {
        match (&self.name, self.origin) {
            (Some(name), _) => name,
            (None, ImageOrigin::Picked) => "picked image",
            (None, ImageOrigin::Dropped) => "dropped image",
        }
    }

    /// BLAKE3 hex digest of the bytes.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:` URL suitable for handing to a renderer.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

impl std::fmt::Debug for ImageResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResource")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("origin", &self.origin)
            .field("len", &self.bytes.len())
            .field("content_hash", &self.content_hash)
            .finish()
    }
}

/// Whether a declared MIME type is in the image category.
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .to_ascii_lowercase()
        .starts_with(IMAGE_MIME_PREFIX)
}

/// Guess a MIME type from a file extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("txt") | Some("md") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn read_with_limits(
    path: &Path,
    limits: &LimitsConfig,
) -> PipelineResult<(Vec<u8>, String, Option<String>)> {
    let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let max_bytes = limits.max_file_size_mb.saturating_mul(1024 * 1024);
    if metadata.len() > max_bytes {
        return Err(PipelineError::FileTooLarge {
            path: path.to_path_buf(),
            size_mb: metadata.len() / (1024 * 1024),
            max_mb: limits.max_file_size_mb,
        });
    }

    let bytes = std::fs::read(path).map_err(|e| PipelineError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);
    Ok((bytes, mime_from_path(path).to_string(), name))
}
