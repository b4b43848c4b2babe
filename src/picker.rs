// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image selection: media type check, async read and data-URL preview

use base64::{engine::general_purpose, Engine as _};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{MammoscanError, Result};

/// A user-picked image plus its inline preview
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub path: PathBuf,
    pub file_name: String,
    /// Media type declared by the file name, e.g. `image/png`
    pub media_type: String,
    pub bytes: Vec<u8>,
    /// `data:<media type>;base64,<payload>`
    pub preview: String,
    /// Pixel size, when the header could be read
    pub dimensions: Option<(u32, u32)>,
}

impl SelectedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Media type a file declares through its extension
pub fn declared_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "dcm" => "application/dicom",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

pub fn is_image_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// Encode bytes as an inline data URL
pub fn data_url(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, general_purpose::STANDARD.encode(bytes))
}

/// Pixel size read from the image header, if the format is recognised
pub fn read_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Validate and load an image for analysis
///
/// The media type is checked before anything is read, so a rejected file
/// costs no I/O.
pub async fn select_image(path: &Path) -> Result<SelectedImage> {
    let media_type = declared_media_type(path);
    if !is_image_type(media_type) {
        debug!("Rejected {:?}: declared type {}", path, media_type);
        return Err(MammoscanError::InvalidInput(media_type.to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    let preview = data_url(media_type, &bytes);

    let dimensions = read_dimensions(&bytes);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    info!("Selected {} ({}, {} bytes)", file_name, media_type, bytes.len());

    Ok(SelectedImage {
        path: path.to_path_buf(),
        file_name,
        media_type: media_type.to_string(),
        bytes,
        preview,
        dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_media_type() {
        assert_eq!(declared_media_type(Path::new("scan.PNG")), "image/png");
        assert_eq!(declared_media_type(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(declared_media_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(declared_media_type(Path::new("no_extension")), "application/octet-stream");
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_read_dimensions_from_memory() {
        let mut png = Vec::new();
        image::RgbImage::new(5, 2)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        assert_eq!(read_dimensions(&png), Some((5, 2)));
        assert_eq!(read_dimensions(b"not an image"), None);
    }

    #[tokio::test]
    async fn test_select_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mammogram.png");
        image::RgbImage::new(4, 3).save(&path).unwrap();

        let selected = select_image(&path).await.unwrap();
        assert_eq!(selected.file_name, "mammogram.png");
        assert_eq!(selected.media_type, "image/png");
        assert!(selected.preview.starts_with("data:image/png;base64,"));
        assert_eq!(selected.dimensions, Some((4, 3)));
        assert!(!selected.is_empty());
    }

    #[tokio::test]
    async fn test_select_undecodable_image_still_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let selected = select_image(&path).await.unwrap();
        assert_eq!(selected.media_type, "image/jpeg");
        assert!(selected.dimensions.is_none());
        assert_eq!(selected.len(), 17);
    }

    #[tokio::test]
    async fn test_select_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let err = select_image(&path).await.unwrap_err();
        assert_eq!(err.user_message(), "Please select a valid image file");
    }

    #[tokio::test]
    async fn test_select_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = select_image(&dir.path().join("gone.png")).await.unwrap_err();
        assert!(matches!(err, MammoscanError::FileSystem(_)));
    }
}
