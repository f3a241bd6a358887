//! Filesystem-backed image store for captures and reference baselines.

use image::{ImageFormat, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::types::{SnapshotConfig, SnapshotError, SnapshotResult};

/// Reads and writes named PNG images under the capture and reference roots
#[derive(Debug, Clone)]
pub struct ImageStore {
    capture_dir: PathBuf,
    reference_dir: PathBuf,
}

impl ImageStore {
    pub fn new(capture_dir: impl Into<PathBuf>, reference_dir: impl Into<PathBuf>) -> Self {
        Self {
            capture_dir: capture_dir.into(),
            reference_dir: reference_dir.into(),
        }
    }

    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self::new(config.capture_dir.clone(), config.reference_dir.clone())
    }

    pub fn capture_dir(&self) -> &Path {
        &self.capture_dir
    }

    pub fn reference_dir(&self) -> &Path {
        &self.reference_dir
    }

    /// Persist a capture as PNG under the capture directory
    pub fn write_capture(&self, image: &RgbImage, filename: &str) -> SnapshotResult<PathBuf> {
        fs::create_dir_all(&self.capture_dir)?;

        let path = self.capture_dir.join(filename);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| SnapshotError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Load the same-named baseline. Absent or undecodable files yield None.
    pub fn load_reference(&self, filename: &str) -> Option<RgbImage> {
        let path = self.reference_dir.join(filename);
        match image::open(&path) {
            Ok(img) => Some(img.to_rgb8()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "reference not loadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_write_then_load_as_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), dir.path());
        let img = RgbImage::from_pixel(6, 4, Rgb([1, 2, 3]));

        let path = store.write_capture(&img, "01-calendar.png").unwrap();
        assert!(path.ends_with("01-calendar.png"));
        assert!(path.exists());

        let loaded = store.load_reference("01-calendar.png").unwrap();
        assert_eq!(loaded, img);
    }

    #[test]
    fn test_write_creates_capture_dir() {
        let dir = tempfile::tempdir().unwrap();
        let capture_dir = dir.path().join("nested").join("captures");
        let store = ImageStore::new(&capture_dir, dir.path());

        store
            .write_capture(&RgbImage::new(2, 2), "01-menu.png")
            .unwrap();
        assert!(capture_dir.join("01-menu.png").exists());
    }

    #[test]
    fn test_load_missing_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), dir.path().join("reference"));
        assert!(store.load_reference("04-settings.png").is_none());
    }

    #[test]
    fn test_load_corrupt_reference() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("02-menu.png"), b"not a png").unwrap();
        let store = ImageStore::new(dir.path(), dir.path());
        assert!(store.load_reference("02-menu.png").is_none());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("captures");
        fs::write(&blocker, b"a file, not a directory").unwrap();
        let store = ImageStore::new(&blocker, dir.path());

        let result = store.write_capture(&RgbImage::new(2, 2), "01-calendar.png");
        assert!(result.is_err());
    }
}
