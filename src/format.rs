//! # Format Detection Module
//!
//! Decides what a file really is by sniffing its content, never by trusting
//! its name. Extensions are only used by the directory sweep to pick
//! candidate files cheaply.
//!
//! | Content | `ImageKind`   | Pipeline                         |
//! |---------|---------------|----------------------------------|
//! | JPEG    | `Jpeg`        | jpegoptim → cwebp                |
//! | PNG     | `Png`         | optipng → pngquant → cwebp       |
//! | other   | `Unsupported` | none                             |

use crate::error::{OptimizeError, Result};
use image::ImageFormat;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Extensions (lowercase) of files the sweep treats as sources
pub const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Enough bytes for every signature `image::guess_format` knows
const SNIFF_LEN: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Unsupported,
}

impl ImageKind {
    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageKind::Unsupported)
    }

    fn from_format(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => ImageKind::Jpeg,
            ImageFormat::Png => ImageKind::Png,
            _ => ImageKind::Unsupported,
        }
    }
}

/// Header information of a supported image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
}

/// Classify a file by its magic bytes.
///
/// Unreadable files and unknown content are `Unsupported`.
pub fn classify(path: &Path) -> ImageKind {
    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    let read = File::open(path).and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut header));

    match read {
        Ok(_) => match image::guess_format(&header) {
            Ok(format) => ImageKind::from_format(format),
            Err(_) => ImageKind::Unsupported,
        },
        Err(e) => {
            debug!("Cannot read {} for classification: {}", path.display(), e);
            ImageKind::Unsupported
        }
    }
}

/// Decode the header of a supported image to get its dimensions.
///
/// Fails with `UnsupportedFormat` for anything that is not JPEG or PNG and
/// with `Image` when the header cannot be decoded.
pub fn probe(path: &Path) -> Result<ImageInfo> {
    let kind = classify(path);
    let format = match kind {
        ImageKind::Jpeg => ImageFormat::Jpeg,
        ImageKind::Png => ImageFormat::Png,
        ImageKind::Unsupported => return Err(OptimizeError::UnsupportedFormat(path.to_path_buf())),
    };

    let reader = image::io::Reader::with_format(BufReader::new(File::open(path)?), format);
    let (width, height) = reader.into_dimensions()?;

    Ok(ImageInfo { kind, width, height })
}

/// `classify` on the blocking pool, for async callers
pub async fn sniff(path: &Path) -> ImageKind {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || classify(&path))
        .await
        .unwrap_or(ImageKind::Unsupported)
}

/// `probe` on the blocking pool, for async callers
pub async fn inspect(path: &Path) -> Result<ImageInfo> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || probe(&path))
        .await
        .map_err(std::io::Error::from)?
}

/// Case-insensitive check against `SOURCE_EXTENSIONS`
pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SOURCE_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_gif, write_jpeg, write_png};
    use tempfile::TempDir;

    #[test]
    fn test_classify_by_content() {
        let temp_dir = TempDir::new().unwrap();
        let jpeg = write_jpeg(temp_dir.path(), "photo.jpg", 40, 30);
        let png = write_png(temp_dir.path(), "icon.png", 16, 16);
        let gif = write_gif(temp_dir.path(), "anim.gif");

        assert_eq!(classify(&jpeg), ImageKind::Jpeg);
        assert_eq!(classify(&png), ImageKind::Png);
        assert_eq!(classify(&gif), ImageKind::Unsupported);
    }

    #[test]
    fn test_extension_does_not_decide() {
        let temp_dir = TempDir::new().unwrap();
        let png = write_png(temp_dir.path(), "mislabelled.jpg", 8, 8);
        let text = temp_dir.path().join("notes.png");
        std::fs::write(&text, b"definitely not an image").unwrap();

        assert_eq!(classify(&png), ImageKind::Png);
        assert_eq!(classify(&text), ImageKind::Unsupported);
    }

    #[test]
    fn test_missing_file_is_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(classify(&temp_dir.path().join("gone.jpg")), ImageKind::Unsupported);
    }

    #[test]
    fn test_probe_reads_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let jpeg = write_jpeg(temp_dir.path(), "photo.jpg", 40, 30);

        let info = probe(&jpeg).unwrap();
        assert_eq!(info, ImageInfo { kind: ImageKind::Jpeg, width: 40, height: 30 });
    }

    #[test]
    fn test_probe_rejects_truncated_header() {
        let temp_dir = TempDir::new().unwrap();
        let truncated = temp_dir.path().join("broken.png");
        std::fs::write(&truncated, b"\x89PNG\r\n\x1a\n\0\0").unwrap();

        assert_eq!(classify(&truncated), ImageKind::Png);
        assert!(matches!(probe(&truncated), Err(OptimizeError::Image(_))));
    }

    #[test]
    fn test_probe_rejects_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let gif = write_gif(temp_dir.path(), "anim.gif");
        assert!(matches!(probe(&gif), Err(OptimizeError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_async_variants_match() {
        let temp_dir = TempDir::new().unwrap();
        let png = write_png(temp_dir.path(), "icon.png", 12, 10);
        let gif = write_gif(temp_dir.path(), "anim.gif");

        assert_eq!(sniff(&png).await, ImageKind::Png);
        assert_eq!(sniff(&gif).await, ImageKind::Unsupported);
        assert_eq!(inspect(&png).await.unwrap(), probe(&png).unwrap());
        assert!(matches!(inspect(&gif).await, Err(OptimizeError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_source_extensions_are_case_insensitive() {
        assert!(has_source_extension(Path::new("a.JPG")));
        assert!(has_source_extension(Path::new("a.Jpeg")));
        assert!(has_source_extension(Path::new("/x/y/a.png")));
        assert!(!has_source_extension(Path::new("a.png.webp")));
        assert!(!has_source_extension(Path::new("a.gif")));
        assert!(!has_source_extension(Path::new("README")));
    }

    #[test]
    fn test_kind_support() {
        assert!(ImageKind::Jpeg.is_supported());
        assert!(ImageKind::Png.is_supported());
        assert!(!ImageKind::Unsupported.is_supported());
    }
}
