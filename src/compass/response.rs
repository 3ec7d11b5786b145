//! Directional responses over a window.

use super::kernel::{Direction, KernelSet};
use super::{RESPONSE_BITS, RESPONSE_MAX};
use crate::config::ConfigError;
use crate::window::Window;
use thiserror::Error;

/// A response outside the representable signed range.
///
/// Cannot occur through `CompassEngine::new`, which rejects kernel sets
/// whose worst case exceeds the range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{direction} response {value} at pixel {index} exceeds the {bits}-bit signed range")]
pub struct OverflowError {
    /// Kernel that produced the value.
    pub direction: Direction,
    /// Accumulated response before narrowing.
    pub value: i32,
    /// Frame index of the pixel.
    pub index: usize,
    /// Width of the signed response domain.
    pub bits: u32,
}

/// The four signed responses for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompassResponse {
    values: [i16; 4],
}

impl CompassResponse {
    /// Builds a response from values in `Direction::ALL` order.
    pub fn from_values(values: [i16; 4]) -> Self {
        Self { values }
    }

    /// Response for one direction.
    #[inline]
    pub fn get(&self, direction: Direction) -> i16 {
        self.values[direction as usize]
    }

    /// All responses in `Direction::ALL` order.
    #[inline]
    pub fn values(&self) -> [i16; 4] {
        self.values
    }

    /// Largest absolute response.
    pub fn peak_magnitude(&self) -> i32 {
        self.values
            .iter()
            .map(|&v| i32::from(v).abs())
            .max()
            .unwrap_or(0)
    }
}

/// Applies the kernel set to windows.
///
/// Kernels are flattened once at construction. Accumulation is done in
/// `i32` and range-checked before narrowing.
#[derive(Debug, Clone)]
pub struct CompassEngine {
    extent: usize,
    weights: [Vec<i32>; 4],
}

impl CompassEngine {
    /// Creates an engine, rejecting malformed or out-of-range kernel sets.
    pub fn new(kernels: &KernelSet) -> Result<Self, ConfigError> {
        kernels.validate()?;
        Ok(Self::from_kernels(kernels))
    }

    fn from_kernels(kernels: &KernelSet) -> Self {
        let flatten = |direction: Direction| -> Vec<i32> {
            kernels
                .get(direction)
                .rows()
                .iter()
                .flatten()
                .map(|&w| i32::from(w))
                .collect()
        };

        Self {
            extent: kernels.extent(),
            weights: Direction::ALL.map(flatten),
        }
    }

    /// Side of the kernel footprint.
    #[inline]
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Computes the four responses for `window`.
    pub fn respond(&self, window: &Window) -> Result<CompassResponse, OverflowError> {
        let mut sums = [0i32; 4];

        for i in 0..self.extent {
            for j in 0..self.extent {
                let intensity = i32::from(window.footprint(i, j));
                let tap = i * self.extent + j;
                for (sum, weights) in sums.iter_mut().zip(&self.weights) {
                    *sum += intensity * weights[tap];
                }
            }
        }

        let mut values = [0i16; 4];
        for ((value, &sum), direction) in values.iter_mut().zip(&sums).zip(Direction::ALL) {
            if !(-RESPONSE_MAX..=RESPONSE_MAX).contains(&sum) {
                return Err(OverflowError {
                    direction,
                    value: sum,
                    index: window.index(),
                    bits: RESPONSE_BITS,
                });
            }
            *value = sum as i16;
        }

        tracing::trace!(
            row = window.position().0,
            col = window.position().1,
            responses = ?values,
            "Compass responses"
        );

        Ok(CompassResponse { values })
    }
}
