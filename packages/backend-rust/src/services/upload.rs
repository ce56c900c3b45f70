use std::path::Path;

use bytes::Bytes;
use image::ImageFormat;
use thiserror::Error;

const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("missing image file")]
    Missing,
    #[error("unsupported file type: only .png, .jpg and .jpeg images are accepted")]
    UnsupportedExtension,
    #[error("uploaded file is not a PNG or JPEG image")]
    UnrecognizedContent,
}

/// An uploaded image held in memory for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    file_name: String,
    kind: ImageKind,
    bytes: Bytes,
}

impl ImageUpload {
    /// Accepts the upload when its extension is an image type and its
    /// leading bytes really are PNG or JPEG.
    pub fn new(file_name: impl Into<String>, bytes: Bytes) -> Result<Self, UploadError> {
        let file_name = file_name.into();

        let extension = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or(UploadError::UnsupportedExtension)?;
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::UnsupportedExtension);
        }

        let kind = match image::guess_format(&bytes) {
            Ok(ImageFormat::Png) => ImageKind::Png,
            Ok(ImageFormat::Jpeg) => ImageKind::Jpeg,
            _ => return Err(UploadError::UnrecognizedContent),
        };

        Ok(Self {
            file_name,
            kind,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
