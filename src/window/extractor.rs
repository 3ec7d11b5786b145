//! Window extraction from a row-major pixel stream.

use super::ring::{wrap, RingBuffer};
use crate::config::{ConfigError, DetectorConfig};

/// One N×N neighborhood, stored in ring layout.
///
/// The cell for image coordinate `(y, x)` sits at `(y mod N, x mod N)`.
/// Consumers address the kernel footprint relative to `origin`, wrapping
/// by subtracting the extent.
#[derive(Clone, PartialEq, Eq)]
pub struct Window {
    cells: Vec<u8>,
    extent: usize,
    origin: (usize, usize),
    position: (u32, u32),
    index: usize,
    interior: bool,
    end_of_frame: bool,
}

impl Window {
    /// Side of the window.
    #[inline]
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Cell at ring coordinates.
    #[inline]
    pub fn cell(&self, ring_row: usize, ring_col: usize) -> u8 {
        self.cells[ring_row * self.extent + ring_col]
    }

    /// Cell at `(i, j)` relative to the kernel origin, wrapped by the extent.
    #[inline]
    pub fn footprint(&self, i: usize, j: usize) -> u8 {
        let row = wrap(self.origin.0 + i, self.extent);
        let col = wrap(self.origin.1 + j, self.extent);
        self.cell(row, col)
    }

    /// Image `(row, col)` of the pixel this window classifies.
    #[inline]
    pub fn position(&self) -> (u32, u32) {
        self.position
    }

    /// Row-major index of the pixel within its frame.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// True if the kernel footprint lies entirely inside the frame.
    #[inline]
    pub fn is_interior(&self) -> bool {
        self.interior
    }

    /// True for the window of the last pixel of the frame.
    #[inline]
    pub fn end_of_frame(&self) -> bool {
        self.end_of_frame
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("position", &self.position)
            .field("extent", &self.extent)
            .field("origin", &self.origin)
            .field("interior", &self.interior)
            .field("end_of_frame", &self.end_of_frame)
            .finish()
    }
}

/// Turns a flat pixel stream into one centred window per pixel.
///
/// The window for pixel `(r, c)` spans rows `r-h..=r+h` and columns
/// `c-h..=c+h` (`h = N / 2`). It is assembled once its newest pixel,
/// `h` rows and `h` columns ahead in stream order, has been buffered, so
/// the extractor runs `h * W + h` pixels behind the input until the frame
/// ends and the tail is flushed.
///
/// Cells outside the frame are read from whatever the ring holds at the
/// wrapped position: columns past the right edge step back by N, columns
/// before the left edge step forward by N, rows wrap within the ring.
#[derive(Debug, Clone)]
pub struct WindowExtractor {
    ring: RingBuffer,
    width: usize,
    height: usize,
    extent: usize,
    half: usize,
    kernel_half: usize,
    lag: usize,
    received: usize,
    emitted: usize,
}

impl WindowExtractor {
    /// Creates an extractor, rejecting extents that do not fit the frame.
    pub fn new(config: &DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let width = config.width as usize;
        let height = config.height as usize;
        let extent = config.window_extent as usize;
        let half = extent / 2;

        Ok(Self {
            ring: RingBuffer::new(extent, width),
            width,
            height,
            extent,
            half,
            kernel_half: config.kernel_extent() / 2,
            lag: half * width + half,
            received: 0,
            emitted: 0,
        })
    }

    /// Pixels per frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.width * self.height
    }

    /// Stream distance between a pixel and the newest pixel of its window.
    #[inline]
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Pixels buffered in the current frame.
    #[inline]
    pub fn received(&self) -> usize {
        self.received
    }

    /// Windows emitted in the current frame.
    #[inline]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// True once every window of the frame has been emitted.
    pub fn is_drained(&self) -> bool {
        self.emitted == self.frame_len()
    }

    /// Buffers one pixel and returns the window that became complete, if any.
    ///
    /// Callers must not push more than one frame's worth of pixels before
    /// calling `reset`.
    pub fn push(&mut self, intensity: u8) -> Option<Window> {
        debug_assert!(self.received < self.frame_len());

        self.ring.push(intensity);
        self.received += 1;

        if self.received > self.lag {
            Some(self.next_window())
        } else {
            None
        }
    }

    /// Emits the windows still pending once the whole frame is buffered.
    pub fn flush(&mut self) -> impl Iterator<Item = Window> + '_ {
        let pending = if self.received == self.frame_len() {
            self.frame_len() - self.emitted
        } else {
            0
        };
        if pending > 0 {
            tracing::trace!(pending, "Flushing frame tail");
        }
        (0..pending).map(move |_| self.next_window())
    }

    /// Clears the ring and counters for a new frame.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.received = 0;
        self.emitted = 0;
    }

    fn next_window(&mut self) -> Window {
        let index = self.emitted;
        self.emitted += 1;
        self.assemble(index)
    }

    fn assemble(&self, index: usize) -> Window {
        let n = self.extent;
        let row = index / self.width;
        let col = index % self.width;
        let mut cells = vec![0u8; n * n];

        for dy in 0..n {
            let y = row as isize + dy as isize - self.half as isize;
            let ring_row = self.ring.slot_for_row(y);
            for dx in 0..n {
                let x = col as isize + dx as isize - self.half as isize;
                let source_col = self.wrap_column(x);
                cells[ring_row * n + x.rem_euclid(n as isize) as usize] =
                    self.ring.get(y, source_col);
            }
        }

        let k = self.kernel_half;
        let origin = (wrap(row % n + n - k, n), wrap(col % n + n - k, n));
        let interior =
            row >= k && row + k < self.height && col >= k && col + k < self.width;

        Window {
            cells,
            extent: n,
            origin,
            position: (row as u32, col as u32),
            index,
            interior,
            end_of_frame: index + 1 == self.frame_len(),
        }
    }

    #[inline]
    fn wrap_column(&self, x: isize) -> usize {
        let n = self.extent as isize;
        if x < 0 {
            (x + n) as usize
        } else if x as usize >= self.width {
            (x - n) as usize
        } else {
            x as usize
        }
    }
}
