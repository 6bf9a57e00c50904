//! Local storage for recipe photos.
//!
//! Incoming images are downsampled by a power of two until both sides fit in
//! [`MAX_DIMENSION`], then re-encoded as JPEG under a random file name.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

pub const MAX_DIMENSION: u32 = 1200;
pub const JPEG_QUALITY: u8 = 85;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Not enough memory to process image: {0}")]
    OutOfMemory(String),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Image I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for ImageError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Limits(limits) => ImageError::OutOfMemory(limits.to_string()),
            image::ImageError::IoError(io) => ImageError::Io(io),
            other => ImageError::Decode(other.to_string()),
        }
    }
}

/// Power-of-two subsampling factor that brings both sides within `max`.
pub fn subsample_scale(width: u32, height: u32, max: u32) -> u32 {
    let mut scale = 1;
    while width / scale > max || height / scale > max {
        scale *= 2;
    }
    scale
}

pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_file(&self, source: &Path) -> Result<PathBuf, ImageError> {
        let bytes = std::fs::read(source)?;
        self.save_bytes(&bytes)
    }

    /// Stores an image and returns the absolute path of the JPEG written.
    pub fn save_bytes(&self, bytes: &[u8]) -> Result<PathBuf, ImageError> {
        self.process(bytes).inspect_err(|e| match e {
            ImageError::OutOfMemory(_) => tracing::error!("Out of memory while saving image: {}", e),
            ImageError::Decode(_) => tracing::warn!("Rejected image: {}", e),
            ImageError::Io(_) => tracing::error!("Failed to write image: {}", e),
        })
    }

    fn process(&self, bytes: &[u8]) -> Result<PathBuf, ImageError> {
        // Bounds first, so the scale is known before the full decode.
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        let scale = subsample_scale(width, height, MAX_DIMENSION);

        let mut image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?;
        if scale > 1 {
            let target_w = (width / scale).max(1);
            let target_h = (height / scale).max(1);
            tracing::debug!(width, height, scale, "Downsampling image");
            image = image.resize_exact(target_w, target_h, FilterType::Triangle);
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.jpg", Uuid::new_v4()));
        let mut writer = BufWriter::new(File::create(&path)?);
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        writer.flush()?;

        Ok(std::fs::canonicalize(&path)?)
    }

    /// Deletes a stored image. Missing files are not an error.
    pub fn remove(&self, path: &Path) -> Result<(), ImageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use tempfile::TempDir;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_subsample_scale() {
        assert_eq!(subsample_scale(800, 600, 1200), 1);
        assert_eq!(subsample_scale(1200, 1200, 1200), 1);
        assert_eq!(subsample_scale(1201, 100, 1200), 2);
        assert_eq!(subsample_scale(4000, 3000, 1200), 4);
        assert_eq!(subsample_scale(100, 5000, 1200), 8);
    }

    #[test]
    fn test_large_image_is_downsampled() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().join("images"));

        let path = store.save_bytes(&png(2400, 1000)).unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.extension().unwrap(), "jpg");
        assert_eq!(image::image_dimensions(&path).unwrap(), (1200, 500));
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());

        let source = dir.path().join("photo.png");
        std::fs::write(&source, png(640, 480)).unwrap();

        let path = store.save_file(&source).unwrap();
        assert_eq!(image::image_dimensions(&path).unwrap(), (640, 480));
    }

    #[test]
    fn test_file_names_are_unique() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());
        let bytes = png(10, 10);
        assert_ne!(store.save_bytes(&bytes).unwrap(), store.save_bytes(&bytes).unwrap());
    }

    #[test]
    fn test_invalid_bytes_are_decode_error() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());
        let result = store.save_bytes(b"definitely not an image");
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());
        let result = store.save_file(&dir.path().join("missing.png"));
        assert!(matches!(result, Err(ImageError::Io(_))));
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());
        let path = store.save_bytes(&png(10, 10)).unwrap();
        store.remove(&path).unwrap();
        assert!(!path.exists());
        store.remove(&path).unwrap();
    }
}
