//! Grayscale frame with its sequence number.

use super::record::{tag_frame, GrayPixel};

/// A single grayscale frame handed to the detector.
///
/// Holds row-major 8-bit intensities plus the sequence number used for
/// frame accounting.
#[derive(Clone)]
pub struct GrayFrame {
    /// Row-major intensities.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Monotonic sequence number.
    sequence: u64,
}

impl GrayFrame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            sequence,
        }
    }

    /// Returns a reference to the intensities.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count()
    }

    /// Streams the frame as input records, marker on the last pixel.
    pub fn records(&self) -> impl Iterator<Item = GrayPixel> + '_ {
        tag_frame(&self.pixels)
    }
}

impl std::fmt::Debug for GrayFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrayFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = GrayFrame::new(vec![0u8; 64 * 48], 64, 48, 1);

        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let frame = GrayFrame::new(vec![0u8; 100], 64, 48, 1);
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_records_carry_single_marker() {
        let frame = GrayFrame::new(vec![7u8; 12], 4, 3, 1);
        let records: Vec<_> = frame.records().collect();

        assert_eq!(records.len(), 12);
        assert_eq!(records.iter().filter(|r| r.end_of_frame).count(), 1);
        assert!(records[11].end_of_frame);
    }
}
