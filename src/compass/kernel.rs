//! Compass kernel set.

use super::{RESPONSE_BITS, RESPONSE_MAX};
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// The four gradient directions evaluated per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Gradient across columns (vertical edges).
    Horizontal,
    /// Gradient across rows (horizontal edges).
    Vertical,
    /// Gradient along the main diagonal.
    Diagonal,
    /// Gradient along the anti-diagonal.
    AntiDiagonal,
}

impl Direction {
    /// All directions in evaluation order.
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::Diagonal,
        Direction::AntiDiagonal,
    ];

    /// Lower-case name used in logs and config keys.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Horizontal => "horizontal",
            Direction::Vertical => "vertical",
            Direction::Diagonal => "diagonal",
            Direction::AntiDiagonal => "anti_diagonal",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A square signed-integer convolution kernel, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompassKernel {
    weights: Vec<Vec<i16>>,
}

impl CompassKernel {
    /// Wraps a row-major weight matrix. Shape is checked by `KernelSet::validate`.
    pub fn new(weights: Vec<Vec<i16>>) -> Self {
        Self { weights }
    }

    fn from_rows(rows: [[i16; 3]; 3]) -> Self {
        Self::new(rows.iter().map(|row| row.to_vec()).collect())
    }

    /// Side of the kernel footprint.
    #[inline]
    pub fn extent(&self) -> usize {
        self.weights.len()
    }

    /// Weight at `(row, col)`.
    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> i16 {
        self.weights[row][col]
    }

    /// Row-major weights.
    pub fn rows(&self) -> &[Vec<i16>] {
        &self.weights
    }

    /// Sum of absolute weights; bounds the response per unit intensity.
    pub fn abs_sum(&self) -> i32 {
        self.weights
            .iter()
            .flatten()
            .map(|&w| i32::from(w).abs())
            .sum()
    }

    fn is_square(&self) -> bool {
        let n = self.weights.len();
        n > 0 && n % 2 == 1 && self.weights.iter().all(|row| row.len() == n)
    }
}

/// The four directional kernels applied to every window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct KernelSet {
    pub horizontal: CompassKernel,
    pub vertical: CompassKernel,
    pub diagonal: CompassKernel,
    pub anti_diagonal: CompassKernel,
}

impl Default for KernelSet {
    fn default() -> Self {
        Self::compass()
    }
}

impl KernelSet {
    /// The Sobel compass family: horizontal, vertical and both diagonals.
    pub fn compass() -> Self {
        Self {
            horizontal: CompassKernel::from_rows([[1, 0, -1], [2, 0, -2], [1, 0, -1]]),
            vertical: CompassKernel::from_rows([[1, 2, 1], [0, 0, 0], [-1, -2, -1]]),
            diagonal: CompassKernel::from_rows([[2, 1, 0], [1, 0, -1], [0, -1, -2]]),
            anti_diagonal: CompassKernel::from_rows([[0, 1, 2], [-1, 0, 1], [-2, -1, 0]]),
        }
    }

    /// Kernel for `direction`.
    pub fn get(&self, direction: Direction) -> &CompassKernel {
        match direction {
            Direction::Horizontal => &self.horizontal,
            Direction::Vertical => &self.vertical,
            Direction::Diagonal => &self.diagonal,
            Direction::AntiDiagonal => &self.anti_diagonal,
        }
    }

    /// Kernels paired with their direction, in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &CompassKernel)> + '_ {
        Direction::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    /// Side of the shared kernel footprint.
    pub fn extent(&self) -> usize {
        self.horizontal.extent()
    }

    /// Checks shape and worst-case magnitude of every kernel.
    ///
    /// All kernels must be odd-sized squares of the same extent, and the
    /// largest response an 8-bit window can produce must fit the signed
    /// response range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let extent = self.extent();
        for (direction, kernel) in self.iter() {
            if !kernel.is_square() || kernel.extent() != extent {
                return Err(ConfigError::MalformedKernel {
                    direction: direction.name(),
                });
            }

            let worst_case = kernel.abs_sum() * i32::from(u8::MAX);
            if worst_case > RESPONSE_MAX {
                return Err(ConfigError::KernelOutOfRange {
                    direction: direction.name(),
                    worst_case,
                    bits: RESPONSE_BITS,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compass_set_is_valid() {
        let set = KernelSet::compass();
        assert!(set.validate().is_ok());
        assert_eq!(set.extent(), 3);
    }

    #[test]
    fn test_compass_worst_case_fits_twelve_bits() {
        let set = KernelSet::compass();
        for (_, kernel) in set.iter() {
            assert_eq!(kernel.abs_sum() * 255, 2040);
        }
    }

    #[test]
    fn test_kernels_are_zero_sum() {
        for (direction, kernel) in KernelSet::compass().iter() {
            let sum: i32 = kernel.rows().iter().flatten().map(|&w| i32::from(w)).sum();
            assert_eq!(sum, 0, "{direction} kernel should not respond to flat fields");
        }
    }

    #[test]
    fn test_non_square_kernel_rejected() {
        let mut set = KernelSet::compass();
        set.diagonal = CompassKernel::new(vec![vec![1, 0, -1], vec![1, 0, -1]]);
        assert_eq!(
            set.validate(),
            Err(ConfigError::MalformedKernel {
                direction: "diagonal"
            })
        );
    }

    #[test]
    fn test_mixed_extent_rejected() {
        let mut set = KernelSet::compass();
        set.anti_diagonal = CompassKernel::new(vec![vec![1]]);
        assert!(matches!(
            set.validate(),
            Err(ConfigError::MalformedKernel {
                direction: "anti_diagonal"
            })
        ));
    }
}
