use ordered_float::OrderedFloat;
use std::cmp::Ordering;

/// A single triangle corner as read from an STL file.
///
/// `original_index` is the position this corner occupied in the flat corner
/// stream (`[0, 3 * tri_count)`); it is what lets the indexer rebuild the
/// per-triangle index array after sorting has destroyed the input order.
#[derive(Default, Clone, Copy, Debug)]
pub struct RawVertex {
    pub position: [f32; 3],
    pub original_index: u32,
}

impl RawVertex {
    pub fn new(position: [f32; 3], original_index: u32) -> Self {
        Self {
            position,
            original_index,
        }
    }

    fn key(&self) -> [OrderedFloat<f32>; 3] {
        self.position.map(OrderedFloat)
    }
}

// Equality and ordering look at the position only; the index tag is
// bookkeeping. OrderedFloat keeps the comparison total when a file carries
// NaN coordinates, while `0.0` and `-0.0` still compare equal the way plain
// float comparison would.
impl PartialEq for RawVertex {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for RawVertex {}

impl Ord for RawVertex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for RawVertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
