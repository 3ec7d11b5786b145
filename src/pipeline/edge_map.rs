//! Completed frame of edge decisions.

use crate::source::EdgeDecision;

/// Edge decisions for one whole frame, row-major.
///
/// This is what the frame assembler hands downstream once the
/// end-of-frame decision has been seen.
#[derive(Clone, PartialEq, Eq)]
pub struct EdgeMap {
    /// One flag per pixel.
    edges: Vec<bool>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Sequence number of the frame within its stream.
    sequence: u64,
}

impl EdgeMap {
    /// Creates a map from row-major edge flags.
    pub fn from_edges(edges: Vec<bool>, width: u32, height: u32, sequence: u64) -> Self {
        debug_assert_eq!(edges.len(), width as usize * height as usize);
        Self {
            edges,
            width,
            height,
            sequence,
        }
    }

    /// Creates a map from output records.
    pub fn from_decisions(decisions: &[EdgeDecision], width: u32, height: u32, sequence: u64) -> Self {
        Self::from_edges(decisions.iter().map(|d| d.edge).collect(), width, height, sequence)
    }

    /// Frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sequence number of the frame.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Row-major edge flags.
    #[inline]
    pub fn edges(&self) -> &[bool] {
        &self.edges
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the map has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Decision at `(row, col)`.
    #[inline]
    pub fn get(&self, row: u32, col: u32) -> bool {
        self.edges[row as usize * self.width as usize + col as usize]
    }

    /// One row of decisions.
    pub fn row(&self, row: u32) -> &[bool] {
        let start = row as usize * self.width as usize;
        &self.edges[start..start + self.width as usize]
    }

    /// Number of edge pixels.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|&&e| e).count()
    }

    /// Fraction of pixels classified as edges.
    pub fn density(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.edge_count() as f64 / self.len() as f64
    }

    /// Re-emits the map as output records, marker on the last pixel.
    pub fn decisions(&self) -> impl Iterator<Item = EdgeDecision> + '_ {
        let last = self.len().saturating_sub(1);
        self.edges.iter().enumerate().map(move |(i, &edge)| EdgeDecision {
            edge,
            end_of_frame: i == last,
        })
    }

    /// Renders one line per row, `1` for edges and `0` otherwise.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.len() * 2);
        for row in 0..self.height {
            let line: Vec<&str> = self
                .row(row)
                .iter()
                .map(|&e| if e { "1" } else { "0" })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }

    /// BLAKE3 digest over the geometry and packed decisions.
    ///
    /// Equal digests mean bit-identical maps of the same shape.
    pub fn digest(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.width.to_le_bytes());
        hasher.update(&self.height.to_le_bytes());
        for chunk in self.edges.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (bit, &e)| acc | (u8::from(e) << bit));
            hasher.update(&[byte]);
        }
        hasher.finalize()
    }
}

impl std::fmt::Debug for EdgeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("edges", &self.edge_count())
            .field("density", &format!("{:.4}", self.density()))
            .finish()
    }
}
