//! Screenshot upload validation

use thiserror::Error;

use crate::models::Issue;

pub const MIN_IMAGE_BYTES: usize = 1;
/// Below MongoDB's 16 MB document limit
pub const MAX_IMAGE_BYTES: usize = 13_631_488;

pub const SUPPORTED_IMAGE_TYPES: [&str; 7] = [
    "image/bmp",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/webp",
    "image/tiff",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error(
        "Upload limit must be between {min} and {max} bytes, got {0}",
        min = MIN_IMAGE_BYTES,
        max = MAX_IMAGE_BYTES
    )]
    InvalidLimit(usize),

    #[error("Image must be between {min} and {limit} bytes, got {size}", min = MIN_IMAGE_BYTES)]
    InvalidSize { size: usize, limit: usize },

    #[error("File type must be an image (e.g. bmp, gif, jpeg, png, svg, webp, tiff)")]
    UnsupportedType(String),
}

/// Accepted image, ready to attach to an issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageUpload {
    pub fn attach_to(self, issue: &mut Issue) {
        issue.image = Some(self.bytes);
        issue.content_type = Some(self.content_type);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageValidator {
    max_bytes: usize,
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self {
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl ImageValidator {
    /// A configured upload limit, which may only tighten the hard limit
    pub fn new(max_bytes: usize) -> Result<Self, ImageError> {
        if !(MIN_IMAGE_BYTES..=MAX_IMAGE_BYTES).contains(&max_bytes) {
            return Err(ImageError::InvalidLimit(max_bytes));
        }
        Ok(Self { max_bytes })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn is_size_valid(&self, size: usize) -> bool {
        (MIN_IMAGE_BYTES..=self.max_bytes).contains(&size)
    }

    pub fn is_type_valid(content_type: &str) -> bool {
        SUPPORTED_IMAGE_TYPES.contains(&content_type)
    }

    pub fn validate(&self, bytes: Vec<u8>, content_type: &str) -> Result<ImageUpload, ImageError> {
        if !self.is_size_valid(bytes.len()) {
            return Err(ImageError::InvalidSize {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        if !Self::is_type_valid(content_type) {
            return Err(ImageError::UnsupportedType(content_type.to_string()));
        }
        Ok(ImageUpload {
            bytes,
            content_type: content_type.to_string(),
        })
    }
}
