//! Thumbnail generation for uploaded media
//!
//! Thumbnails are decoration. Anything that cannot be decoded or encoded
//! yields no thumbnail instead of an error.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use tracing::debug;

/// Default thumbnail bounds in pixels
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 100;

/// Whether a content type is worth attempting a thumbnail for
pub fn is_media(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type.starts_with("video/")
}

/// Produces bounded-size, base64-encoded previews
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailGenerator {
    max_width: u32,
    max_height: u32,
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_SIZE, DEFAULT_THUMBNAIL_SIZE)
    }
}

impl ThumbnailGenerator {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }

    /// Scale `bytes` to fit the bounds and re-encode in the source format
    ///
    /// Returns `None` for anything that is not a decodable image.
    pub fn generate(&self, bytes: &[u8]) -> Option<String> {
        let format = match image::guess_format(bytes) {
            Ok(format) => format,
            Err(e) => {
                debug!(error = %e, "Unrecognized image format, skipping thumbnail");
                return None;
            }
        };

        let source = match image::load_from_memory_with_format(bytes, format) {
            Ok(img) => img,
            Err(e) => {
                debug!(error = %e, ?format, "Failed to decode image, skipping thumbnail");
                return None;
            }
        };

        let scaled = self.fit(source);

        let mut encoded = Vec::new();
        if let Err(e) = scaled.write_to(&mut Cursor::new(&mut encoded), format) {
            debug!(error = %e, ?format, "Failed to encode thumbnail");
            return None;
        }

        Some(STANDARD.encode(encoded))
    }

    /// Shrink to fit within the bounds, keeping aspect ratio; never enlarges
    fn fit(&self, img: DynamicImage) -> DynamicImage {
        if img.width() <= self.max_width && img.height() <= self.max_height {
            return img;
        }
        img.thumbnail(self.max_width, self.max_height)
    }
}
