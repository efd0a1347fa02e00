//! Resolution of image references to bytes.

use crate::context::ImageRef;
use crate::errors::ResourceError;
use async_trait::async_trait;
use std::io::ErrorKind;
use tracing::debug;

/// Turns an [`ImageRef`] into raw image bytes.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    /// Resolves the reference.
    ///
    /// # Errors
    ///
    /// Returns a `ResourceError` if the image is missing, unreadable, empty
    /// or not an image.
    async fn resolve(&self, image: &ImageRef) -> Result<Vec<u8>, ResourceError>;
}

/// Names the image format from its leading bytes.
///
/// Recognizes PNG, JPEG, GIF, WebP and BMP.
#[must_use]
pub fn sniff_format(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', ..] => Some("png"),
        [0xff, 0xd8, 0xff, ..] => Some("jpeg"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        [b'B', b'M', ..] => Some("bmp"),
        _ => None,
    }
}

/// Reads images from the local filesystem.
///
/// Payloads whose leading bytes match no known image format are rejected
/// before they reach the vision model.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageResolver;

impl FileImageResolver {
    /// Creates a new resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageResolver for FileImageResolver {
    async fn resolve(&self, image: &ImageRef) -> Result<Vec<u8>, ResourceError> {
        let bytes = tokio::fs::read(image.as_path()).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ResourceError::not_found(image.as_str()),
            _ => ResourceError::new(image.as_str(), e.to_string()),
        })?;

        if bytes.is_empty() {
            return Err(ResourceError::empty(image.as_str()));
        }
        match sniff_format(&bytes) {
            Some(format) => {
                debug!(image = %image, format, bytes = bytes.len(), "image resolved");
                Ok(bytes)
            }
            None => Err(ResourceError::unrecognized(image.as_str())),
        }
    }
}
