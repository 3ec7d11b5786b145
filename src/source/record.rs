//! Stream records exchanged at the detector boundary.

/// One grayscale pixel on the input stream.
///
/// Pixels arrive in row-major order. `end_of_frame` is set on the last
/// pixel of a frame and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrayPixel {
    /// 8-bit intensity.
    pub intensity: u8,
    /// Set on the last element of the frame.
    pub end_of_frame: bool,
}

impl GrayPixel {
    /// A pixel in the body of a frame.
    #[inline]
    pub fn new(intensity: u8) -> Self {
        Self {
            intensity,
            end_of_frame: false,
        }
    }

    /// The last pixel of a frame.
    #[inline]
    pub fn last(intensity: u8) -> Self {
        Self {
            intensity,
            end_of_frame: true,
        }
    }
}

/// One edge decision on the output stream.
///
/// Mirrors the input record: exactly one decision per pixel, with the
/// frame marker copied from the corresponding input pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeDecision {
    /// True if the pixel lies on an edge.
    pub edge: bool,
    /// Set on the last element of the frame.
    pub end_of_frame: bool,
}

/// Tags a row-major intensity buffer with frame markers.
///
/// The marker is placed on the final element only.
pub fn tag_frame(pixels: &[u8]) -> impl Iterator<Item = GrayPixel> + '_ {
    let last = pixels.len().saturating_sub(1);
    pixels.iter().enumerate().map(move |(i, &intensity)| GrayPixel {
        intensity,
        end_of_frame: i == last,
    })
}
