//! Synthetic test-pattern source.

use super::{GrayFrame, PixelSource, SourceError};
use crate::config::DetectorConfig;

/// A deterministic synthetic image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every pixel at the same level.
    Flat { level: u8 },
    /// A solid rectangle at `level` on a zero background.
    Rectangle {
        top: u32,
        left: u32,
        height: u32,
        width: u32,
        level: u8,
    },
    /// Alternating 0 / 255 squares of `cell` pixels.
    Checkerboard { cell: u32 },
    /// Left-to-right ramp from 0 to 255.
    HorizontalRamp,
}

impl Pattern {
    /// The 0xFF square at rows 1-4, columns 3-6 used by the 8x8 regression image.
    pub fn reference_square() -> Self {
        Pattern::Rectangle {
            top: 1,
            left: 3,
            height: 4,
            width: 4,
            level: 0xFF,
        }
    }

    /// Intensity at `(row, col)` for a `width` x `height` frame.
    pub fn sample(&self, row: u32, col: u32, width: u32, _height: u32) -> u8 {
        match *self {
            Pattern::Flat { level } => level,
            Pattern::Rectangle {
                top,
                left,
                height,
                width: rect_width,
                level,
            } => {
                let inside = (top..top + height).contains(&row)
                    && (left..left + rect_width).contains(&col);
                if inside {
                    level
                } else {
                    0
                }
            }
            Pattern::Checkerboard { cell } => {
                let cell = cell.max(1);
                if ((row / cell) + (col / cell)) % 2 == 0 {
                    0
                } else {
                    0xFF
                }
            }
            Pattern::HorizontalRamp => {
                if width <= 1 {
                    0
                } else {
                    ((col as u64 * 255) / (width as u64 - 1)) as u8
                }
            }
        }
    }

    /// Renders the pattern as a row-major buffer.
    pub fn render(&self, width: u32, height: u32) -> Vec<u8> {
        (0..height)
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .map(|(row, col)| self.sample(row, col, width, height))
            .collect()
    }
}

/// Source that emits the same synthetic pattern on every capture.
#[derive(Debug)]
pub struct PatternSource {
    pattern: Pattern,
    geometry: Option<(u32, u32)>,
    sequence: u64,
}

impl PatternSource {
    /// Creates a closed source for `pattern`.
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            geometry: None,
            sequence: 0,
        }
    }

    /// Returns the pattern this source renders.
    pub fn pattern(&self) -> Pattern {
        self.pattern
    }
}

impl PixelSource for PatternSource {
    fn open(&mut self, config: &DetectorConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::ConfigFailed(e.to_string()))?;
        self.geometry = Some((config.width, config.height));
        self.sequence = 0;
        tracing::info!(pattern = ?self.pattern, "PatternSource opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<GrayFrame, SourceError> {
        let (width, height) = self.geometry.ok_or(SourceError::NotInitialized)?;

        self.sequence += 1;
        let pixels = self.pattern.render(width, height);
        Ok(GrayFrame::new(pixels, width, height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.geometry.is_some()
    }

    fn close(&mut self) {
        self.geometry = None;
        tracing::info!("PatternSource closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_source_lifecycle() {
        let mut source = PatternSource::new(Pattern::Flat { level: 9 });
        let config = DetectorConfig::with_dimensions(8, 8);

        assert!(!source.is_open());

        source.open(&config).unwrap();
        assert!(source.is_open());

        let frame = source.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);
        assert!(frame.pixels().iter().all(|&p| p == 9));

        assert_eq!(source.capture().unwrap().sequence(), 2);

        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut source = PatternSource::new(Pattern::HorizontalRamp);
        assert!(matches!(source.capture(), Err(SourceError::NotInitialized)));
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let mut source = PatternSource::new(Pattern::HorizontalRamp);
        let config = DetectorConfig::with_dimensions(4, 4);

        assert!(matches!(
            source.open(&config),
            Err(SourceError::ConfigFailed(_))
        ));
    }

    #[test]
    fn test_reference_square_layout() {
        let pixels = Pattern::reference_square().render(8, 8);

        assert_eq!(pixels[8 + 3], 0xFF);
        assert_eq!(pixels[4 * 8 + 6], 0xFF);
        assert_eq!(pixels[8 + 2], 0);
        assert_eq!(pixels[5 * 8 + 3], 0);
        assert_eq!(pixels.iter().filter(|&&p| p == 0xFF).count(), 16);
    }

    #[test]
    fn test_ramp_spans_full_range() {
        let pixels = Pattern::HorizontalRamp.render(16, 2);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[15], 255);
        assert!(pixels[..16].windows(2).all(|w| w[0] <= w[1]));
    }
}
