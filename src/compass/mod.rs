//! Compass gradient responses.
//!
//! Four fixed integer kernels approximate the intensity gradient along
//! the horizontal, vertical and both diagonal directions. Responses are
//! held in a 12-bit signed domain: with 8-bit intensities and kernel
//! weights summing to 8 in absolute value the extreme is ±2040.

mod kernel;
mod response;

pub use kernel::{CompassKernel, Direction, KernelSet};
pub use response::{CompassEngine, CompassResponse, OverflowError};

/// Width of the signed response domain.
pub const RESPONSE_BITS: u32 = 12;

/// Largest representable response magnitude.
///
/// The range is kept symmetric so that negation never overflows.
pub const RESPONSE_MAX: i32 = (1 << (RESPONSE_BITS - 1)) - 1;
