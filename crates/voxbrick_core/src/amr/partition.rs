//! Brick partitioning of a level's grid.

use voxbrick_math::{Box3i, IVec3};

/// One brick of a partitioned level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrickSlot {
    /// Flat brick index (X fastest)
    pub index: usize,
    /// 3D brick index
    pub id: IVec3,
    /// Inclusive voxel bounds in the level's index space
    pub bounds: Box3i,
}

/// Number of bricks along each axis. `dims` must be a multiple of `block_size`.
pub fn bricks_per_axis(dims: IVec3, block_size: i32) -> IVec3 {
    dims / block_size
}

/// Total number of bricks in a grid of `dims`.
pub fn brick_count(dims: IVec3, block_size: i32) -> usize {
    let n = bricks_per_axis(dims, block_size);
    n.x.max(0) as usize * n.y.max(0) as usize * n.z.max(0) as usize
}

/// Describe the brick with flat index `index`.
pub fn brick_slot(dims: IVec3, block_size: i32, index: usize) -> BrickSlot {
    let n = bricks_per_axis(dims, block_size);
    let (nx, ny) = (n.x as usize, n.y as usize);
    let id = IVec3::new(
        (index % nx) as i32,
        ((index / nx) % ny) as i32,
        (index / (nx * ny)) as i32,
    );
    let lower = id * block_size;
    BrickSlot {
        index,
        id,
        bounds: Box3i::new(lower, lower + IVec3::splat(block_size - 1)),
    }
}

/// Enumerate every brick of a grid of `dims`, in flat index order.
///
/// The sequence is a pure function of its arguments, so it can be
/// restarted or mapped over in parallel via [`brick_slot`].
pub fn partition(dims: IVec3, block_size: i32) -> impl Iterator<Item = BrickSlot> + Clone {
    (0..brick_count(dims, block_size)).map(move |i| brick_slot(dims, block_size, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brick_count() {
        assert_eq!(brick_count(IVec3::splat(32), 8), 64);
        assert_eq!(brick_count(IVec3::new(32, 16, 8), 8), 8);
        assert_eq!(bricks_per_axis(IVec3::new(32, 16, 8), 8), IVec3::new(4, 2, 1));
    }

    #[test]
    fn test_brick_slot_decoding() {
        let dims = IVec3::new(32, 16, 16);

        let first = brick_slot(dims, 8, 0);
        assert_eq!(first.id, IVec3::ZERO);
        assert_eq!(first.bounds, Box3i::new(IVec3::ZERO, IVec3::splat(7)));

        // 4 bricks along X, 2 along Y
        let slot = brick_slot(dims, 8, 4 + 4 * 2 + 1);
        assert_eq!(slot.id, IVec3::new(1, 1, 1));
        assert_eq!(slot.bounds.lower, IVec3::new(8, 8, 8));
        assert_eq!(slot.bounds.upper, IVec3::new(15, 15, 15));
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let dims = IVec3::new(24, 16, 8);
        let slots: Vec<BrickSlot> = partition(dims, 8).collect();
        assert_eq!(slots.len(), 6);

        for (i, a) in slots.iter().enumerate() {
            assert_eq!(a.index, i);
            assert_eq!(a.bounds.volume(), 512);
            for b in &slots[i + 1..] {
                assert!(!a.bounds.intersects(&b.bounds));
            }
        }

        let covered: usize = slots.iter().map(|s| s.bounds.volume()).sum();
        assert_eq!(covered, (24 * 16 * 8) as usize);
        let extent = Box3i::from_min_and_shape(IVec3::ZERO, dims);
        assert!(slots.iter().all(|s| extent.contains_box(&s.bounds)));
    }

    #[test]
    fn test_partition_is_repeatable() {
        let a: Vec<Box3i> = partition(IVec3::splat(16), 4).map(|s| s.bounds).collect();
        let b: Vec<Box3i> = partition(IVec3::splat(16), 4).map(|s| s.bounds).collect();
        assert_eq!(a, b);
    }
}
