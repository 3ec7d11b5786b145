//! Edge classification.
//!
//! Reduces the four compass responses of a window to a single edge bit
//! with a symmetric threshold.

mod threshold;

pub use threshold::ThresholdClassifier;
