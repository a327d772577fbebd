use voxbrick_math::{Box3i, Range1f};

/// A finished brick hierarchy.
///
/// Four parallel arrays: entry `i` of `block_bounds`, `refinement_levels`
/// and `brick_data` together describe one kept brick. `cell_widths` is
/// indexed by level instead and always holds one entry per level.
///
/// Bricks come out in the order workers finished them, which varies
/// between runs. Call [`AmrVolume::sort_canonical`] when a stable order
/// is needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AmrVolume {
    /// Inclusive voxel bounds of each brick in its own level's index space
    pub block_bounds: Vec<Box3i>,

    /// Refinement level of each brick (0 = coarsest)
    pub refinement_levels: Vec<i32>,

    /// World-space voxel size per level: `1 / refinement_factor^level`
    pub cell_widths: Vec<f32>,

    /// Voxel payload of each brick, `block_size^3` samples, X fastest
    pub brick_data: Vec<Vec<f32>>,

    /// Brick edge length in voxels
    pub block_size: u32,
}

/// Borrowed view of a single brick.
#[derive(Clone, Copy, Debug)]
pub struct BrickRef<'a> {
    pub bounds: Box3i,
    pub level: i32,
    pub cell_width: f32,
    pub data: &'a [f32],
}

impl BrickRef<'_> {
    /// Spread of the brick's payload.
    pub fn value_range(&self) -> Range1f {
        Range1f::from_values(self.data.iter().copied())
    }
}

impl AmrVolume {
    /// Create an empty hierarchy for `cell_widths.len()` levels.
    pub fn new(block_size: u32, cell_widths: Vec<f32>) -> Self {
        Self {
            block_size,
            cell_widths,
            ..Default::default()
        }
    }

    /// Append one brick.
    pub fn push(&mut self, bounds: Box3i, level: i32, data: Vec<f32>) {
        self.block_bounds.push(bounds);
        self.refinement_levels.push(level);
        self.brick_data.push(data);
    }

    /// Number of bricks.
    pub fn len(&self) -> usize {
        self.block_bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block_bounds.is_empty()
    }

    pub fn num_levels(&self) -> usize {
        self.cell_widths.len()
    }

    /// Ratio between adjacent levels, recovered from the cell widths.
    pub fn refinement_factor(&self) -> Option<u32> {
        match self.cell_widths.as_slice() {
            [coarse, fine, ..] if *fine > 0.0 => Some((coarse / fine).round() as u32),
            _ => None,
        }
    }

    /// Number of samples in one brick.
    pub fn voxels_per_brick(&self) -> usize {
        (self.block_size as usize).pow(3)
    }

    pub fn brick(&self, i: usize) -> BrickRef<'_> {
        let level = self.refinement_levels[i];
        BrickRef {
            bounds: self.block_bounds[i],
            level,
            cell_width: self.cell_widths.get(level as usize).copied().unwrap_or(0.0),
            data: &self.brick_data[i],
        }
    }

    pub fn bricks(&self) -> impl Iterator<Item = BrickRef<'_>> {
        (0..self.len()).map(move |i| self.brick(i))
    }

    pub fn bricks_at_level(&self, level: i32) -> impl Iterator<Item = BrickRef<'_>> {
        self.bricks().filter(move |b| b.level == level)
    }

    pub fn count_at_level(&self, level: i32) -> usize {
        self.refinement_levels.iter().filter(|&&l| l == level).count()
    }

    /// Value range over every brick.
    pub fn value_range(&self) -> Range1f {
        Range1f::from_values(self.brick_data.iter().flatten().copied())
    }

    /// Reorder bricks by level, then by position (Z, then Y, then X).
    pub fn sort_canonical(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| {
            let lower = self.block_bounds[i].lower;
            (self.refinement_levels[i], lower.z, lower.y, lower.x)
        });

        self.block_bounds = order.iter().map(|&i| self.block_bounds[i]).collect();
        self.refinement_levels = order.iter().map(|&i| self.refinement_levels[i]).collect();
        let mut data: Vec<Option<Vec<f32>>> =
            std::mem::take(&mut self.brick_data).into_iter().map(Some).collect();
        self.brick_data = order
            .iter()
            .map(|&i| data[i].take().unwrap_or_default())
            .collect();
    }
}
