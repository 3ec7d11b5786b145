//! Sliding-neighborhood reconstruction.
//!
//! Rebuilds 2-D neighborhoods from a strictly sequential pixel stream
//! using a ring of the last N image rows. No component ever holds the
//! whole frame.

mod extractor;
mod ring;

pub use extractor::{Window, WindowExtractor};
pub use ring::RingBuffer;
