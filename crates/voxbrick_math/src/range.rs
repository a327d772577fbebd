/// A closed range of scalar values, grown one sample at a time.
///
/// Starts out empty (`lower > upper`) so that the first call to
/// [`Range1f::extend`] collapses it onto that sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range1f {
    pub lower: f32,
    pub upper: f32,
}

impl Range1f {
    /// Create a new range given lower and upper values.
    pub fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    /// Returns the spread of the range (upper - lower).
    ///
    /// An empty range has a spread of 0.
    pub fn size(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.upper - self.lower
        }
    }

    /// Returns true if no value has been added yet.
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    /// Returns true if x is within the range [lower, upper] (inclusive).
    pub fn contains(&self, x: f32) -> bool {
        self.lower <= x && x <= self.upper
    }

    /// Grow the range so it includes `v`.
    #[inline]
    pub fn extend(&mut self, v: f32) {
        self.lower = self.lower.min(v);
        self.upper = self.upper.max(v);
    }

    /// Creates a range that surrounds two other ranges.
    pub fn union(&self, other: &Range1f) -> Range1f {
        Range1f::new(self.lower.min(other.lower), self.upper.max(other.upper))
    }

    /// Range covering every value yielded by `values`.
    pub fn from_values(values: impl IntoIterator<Item = f32>) -> Range1f {
        let mut range = Range1f::EMPTY;
        for v in values {
            range.extend(v);
        }
        range
    }

    /// An empty range (lower > upper, contains nothing).
    pub const EMPTY: Range1f = Range1f {
        lower: f32::INFINITY,
        upper: f32::NEG_INFINITY,
    };
}

impl Default for Range1f {
    fn default() -> Self {
        Self::EMPTY
    }
}
