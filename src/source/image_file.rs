//! Image-file source decoded to 8-bit luma.

use super::{GrayFrame, PixelSource, SourceError};
use crate::config::DetectorConfig;
use std::path::{Path, PathBuf};

/// Source that replays a single decoded image file.
///
/// The file is decoded once on `open`; every capture returns the same
/// intensities under a fresh sequence number.
#[derive(Debug)]
pub struct ImageFileSource {
    path: PathBuf,
    luma: Option<(Vec<u8>, u32, u32)>,
    sequence: u64,
}

impl ImageFileSource {
    /// Creates a closed source for the image at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            luma: None,
            sequence: 0,
        }
    }

    /// Reads the image dimensions without decoding pixel data.
    pub fn probe(path: impl AsRef<Path>) -> Result<(u32, u32), SourceError> {
        image::image_dimensions(path.as_ref())
            .map_err(|e| SourceError::OpenFailed(format!("{}: {}", path.as_ref().display(), e)))
    }
}

impl PixelSource for ImageFileSource {
    fn open(&mut self, config: &DetectorConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::ConfigFailed(e.to_string()))?;

        let decoded = image::open(&self.path)
            .map_err(|e| SourceError::OpenFailed(format!("{}: {}", self.path.display(), e)))?
            .to_luma8();

        let (actual_width, actual_height) = decoded.dimensions();
        if (actual_width, actual_height) != (config.width, config.height) {
            return Err(SourceError::DimensionMismatch {
                width: config.width,
                height: config.height,
                actual_width,
                actual_height,
            });
        }

        self.luma = Some((decoded.into_raw(), actual_width, actual_height));
        self.sequence = 0;
        tracing::info!(
            path = %self.path.display(),
            width = actual_width,
            height = actual_height,
            "ImageFileSource opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<GrayFrame, SourceError> {
        let (pixels, width, height) = self.luma.as_ref().ok_or(SourceError::NotInitialized)?;

        self.sequence += 1;
        Ok(GrayFrame::new(pixels.clone(), *width, *height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.luma.is_some()
    }

    fn close(&mut self) {
        self.luma = None;
        tracing::info!(path = %self.path.display(), "ImageFileSource closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_fails_to_open() {
        let mut source = ImageFileSource::new("/nonexistent/compass-edge/input.png");
        let config = DetectorConfig::with_dimensions(8, 8);

        assert!(matches!(source.open(&config), Err(SourceError::OpenFailed(_))));
        assert!(!source.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut source = ImageFileSource::new("unused.png");
        assert!(matches!(source.capture(), Err(SourceError::NotInitialized)));
    }

    #[test]
    fn test_decoded_pgm_round_trips_intensities() {
        let dir = std::env::temp_dir().join(format!("compass-edge-src-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("square.pgm");

        let pixels = crate::source::Pattern::reference_square().render(8, 8);
        image::GrayImage::from_raw(8, 8, pixels.clone())
            .unwrap()
            .save(&path)
            .unwrap();

        assert_eq!(ImageFileSource::probe(&path).unwrap(), (8, 8));

        let mut source = ImageFileSource::new(&path);
        source.open(&DetectorConfig::with_dimensions(8, 8)).unwrap();
        let frame = source.capture().unwrap();
        assert_eq!(frame.pixels(), pixels.as_slice());

        let mut wrong = ImageFileSource::new(&path);
        assert!(matches!(
            wrong.open(&DetectorConfig::with_dimensions(16, 8)),
            Err(SourceError::DimensionMismatch { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
