//! Fixed-size line ring backing the window extractor.

/// Advances a circular index that may run at most one extent past the end.
#[inline]
pub(crate) fn wrap(index: usize, extent: usize) -> usize {
    if index >= extent {
        index - extent
    } else {
        index
    }
}

/// The last `rows` image rows of a frame, `width` intensities each.
///
/// Pixel `(y, x)` lives in ring row `y mod rows`. The write cursor
/// advances row-major and wraps by subtracting the extent, so a new row
/// overwrites the oldest one in place. Storage is a single arena that is
/// allocated once and cleared between frames.
#[derive(Clone)]
pub struct RingBuffer {
    /// Row-major storage, `rows * width` bytes.
    data: Vec<u8>,
    /// Number of buffered rows (the window extent).
    rows: usize,
    /// Image width.
    width: usize,
    /// Ring row of the write cursor.
    slot: usize,
    /// Column of the write cursor.
    col: usize,
}

impl RingBuffer {
    /// Creates a zeroed ring of `rows` rows by `width` columns.
    pub fn new(rows: usize, width: usize) -> Self {
        Self {
            data: vec![0; rows * width],
            rows,
            width,
            slot: 0,
            col: 0,
        }
    }

    /// Number of buffered rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Image width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Writes the next pixel in row-major order.
    pub fn push(&mut self, intensity: u8) {
        self.data[self.slot * self.width + self.col] = intensity;
        self.col += 1;
        if self.col == self.width {
            self.col = 0;
            self.slot = wrap(self.slot + 1, self.rows);
        }
    }

    /// Ring row holding image row `y`; rows above the frame wrap downwards.
    #[inline]
    pub fn slot_for_row(&self, y: isize) -> usize {
        y.rem_euclid(self.rows as isize) as usize
    }

    /// Reads the ring at image row `y`, ring column `col`.
    #[inline]
    pub fn get(&self, y: isize, col: usize) -> u8 {
        self.data[self.slot_for_row(y) * self.width + col]
    }

    /// Zeroes the storage and rewinds the cursor for a new frame.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.slot = 0;
        self.col = 0;
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("rows", &self.rows)
            .field("width", &self.width)
            .field("slot", &self.slot)
            .field("col", &self.col)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_subtracts_extent() {
        assert_eq!(wrap(3, 5), 3);
        assert_eq!(wrap(5, 5), 0);
        assert_eq!(wrap(7, 5), 2);
    }

    #[test]
    fn test_rows_overwrite_oldest() {
        let mut ring = RingBuffer::new(3, 2);
        for v in 0..8u8 {
            ring.push(v);
        }

        // Rows 0..=3 written; row 3 replaced row 0 in slot 0.
        assert_eq!(ring.get(3, 0), 6);
        assert_eq!(ring.get(3, 1), 7);
        assert_eq!(ring.get(1, 0), 2);
        assert_eq!(ring.get(2, 1), 5);
        assert_eq!(ring.get(0, 0), 6);
    }

    #[test]
    fn test_negative_rows_wrap() {
        let mut ring = RingBuffer::new(5, 4);
        ring.push(9);
        assert_eq!(ring.slot_for_row(-1), 4);
        assert_eq!(ring.get(-5, 0), 9);
        assert_eq!(ring.get(-1, 0), 0);
    }

    #[test]
    fn test_clear_rewinds() {
        let mut ring = RingBuffer::new(2, 2);
        ring.push(1);
        ring.push(2);
        ring.push(3);
        ring.clear();
        ring.push(4);

        assert_eq!(ring.get(0, 0), 4);
        assert_eq!(ring.get(0, 1), 0);
        assert_eq!(ring.get(1, 0), 0);
    }
}
