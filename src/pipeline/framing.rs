//! Frame boundary bookkeeping.

use thiserror::Error;

/// Disagreement between the pixel count and the end-of-frame marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    /// The marker arrived before the last pixel of the frame.
    #[error("end-of-frame marker at pixel {index}, expected at {expected}")]
    PrematureMarker { index: usize, expected: usize },

    /// The last pixel of the frame arrived without the marker.
    #[error("pixel {index} completes the frame but carries no end-of-frame marker")]
    MissingMarker { index: usize },

    /// The input ended inside a frame.
    #[error("input ended after {received} of {expected} pixels")]
    Truncated { received: usize, expected: usize },
}

/// Counts pixels within a frame and checks the marker lands on the last one.
#[derive(Debug, Clone)]
pub struct FrameTracker {
    frame_len: usize,
    position: usize,
    completed: u64,
}

impl FrameTracker {
    /// Creates a tracker for frames of `frame_len` pixels.
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len,
            position: 0,
            completed: 0,
        }
    }

    /// Pixels seen in the current frame.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Frames completed so far.
    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// True between frames.
    #[inline]
    pub fn at_boundary(&self) -> bool {
        self.position == 0
    }

    /// Records one pixel. Returns `Ok(true)` when it closes the frame.
    ///
    /// On error the tracker is rewound to the frame boundary.
    pub fn advance(&mut self, end_of_frame: bool) -> Result<bool, FramingError> {
        let index = self.position;
        let last = index + 1 == self.frame_len;

        match (last, end_of_frame) {
            (false, false) => {
                self.position += 1;
                Ok(false)
            }
            (true, true) => {
                self.position = 0;
                self.completed += 1;
                Ok(true)
            }
            (false, true) => {
                self.position = 0;
                Err(FramingError::PrematureMarker {
                    index,
                    expected: self.frame_len - 1,
                })
            }
            (true, false) => {
                self.position = 0;
                Err(FramingError::MissingMarker { index })
            }
        }
    }

    /// Checks the input ended on a frame boundary.
    pub fn finish(&self) -> Result<(), FramingError> {
        if self.position != 0 {
            return Err(FramingError::Truncated {
                received: self.position,
                expected: self.frame_len,
            });
        }
        Ok(())
    }

    /// Drops any partial frame.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_frames() {
        let mut tracker = FrameTracker::new(4);
        for _ in 0..2 {
            assert_eq!(tracker.advance(false), Ok(false));
            assert_eq!(tracker.advance(false), Ok(false));
            assert_eq!(tracker.advance(false), Ok(false));
            assert_eq!(tracker.advance(true), Ok(true));
        }
        assert_eq!(tracker.completed(), 2);
        assert!(tracker.finish().is_ok());
    }

    #[test]
    fn test_premature_marker() {
        let mut tracker = FrameTracker::new(4);
        tracker.advance(false).unwrap();
        assert_eq!(
            tracker.advance(true),
            Err(FramingError::PrematureMarker { index: 1, expected: 3 })
        );
        assert!(tracker.at_boundary());
    }

    #[test]
    fn test_missing_marker() {
        let mut tracker = FrameTracker::new(2);
        tracker.advance(false).unwrap();
        assert_eq!(
            tracker.advance(false),
            Err(FramingError::MissingMarker { index: 1 })
        );
    }

    #[test]
    fn test_truncated_mid_frame() {
        let mut tracker = FrameTracker::new(4);
        for i in 0..4 {
            tracker.advance(i == 3).unwrap();
        }
        tracker.advance(false).unwrap();
        assert_eq!(
            tracker.finish(),
            Err(FramingError::Truncated { received: 1, expected: 4 })
        );
    }

    #[test]
    fn test_empty_stream_ends_cleanly() {
        let tracker = FrameTracker::new(9);
        assert!(tracker.finish().is_ok());
        assert_eq!(tracker.completed(), 0);
    }

    #[test]
    fn test_single_pixel_frame() {
        let mut tracker = FrameTracker::new(1);
        assert_eq!(tracker.advance(true), Ok(true));
        assert_eq!(tracker.advance(false), Err(FramingError::MissingMarker { index: 0 }));
    }
}
