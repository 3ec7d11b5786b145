//! Symmetric threshold test over compass responses.

use crate::compass::{CompassResponse, Direction};
use crate::window::Window;

/// Reduces four signed responses to one edge bit.
///
/// A pixel is an edge when any response, or its negation, reaches the
/// threshold. Negation covers the same gradient in the opposite
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdClassifier {
    threshold: i32,
}

impl ThresholdClassifier {
    /// Creates a classifier with a non-negative threshold.
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold: i32::from(threshold),
        }
    }

    /// Returns the threshold.
    #[inline]
    pub fn threshold(&self) -> u16 {
        self.threshold as u16
    }

    /// Tests one response in both directions.
    #[inline]
    pub fn exceeds(&self, response: i16) -> bool {
        let r = i32::from(response);
        r >= self.threshold || -r >= self.threshold
    }

    /// True if any direction reaches the threshold.
    pub fn classify(&self, response: &CompassResponse) -> bool {
        Direction::ALL
            .iter()
            .any(|&direction| self.exceeds(response.get(direction)))
    }

    /// Edge decision for a window; footprints leaving the frame are never edges.
    pub fn decide(&self, window: &Window, response: &CompassResponse) -> bool {
        window.is_interior() && self.classify(response)
    }
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_THRESHOLD)
    }
}
