use crate::IVec3;

/// Inclusive integer box on a 3D lattice.
///
/// Both `lower` and `upper` are part of the box, so a box with
/// `lower == upper` holds exactly one cell. The layout is six `i32`s
/// (`lower.xyz`, `upper.xyz`), which is also the on-disk record format.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Box3i {
    pub lower: IVec3,
    pub upper: IVec3,
}

impl Box3i {
    /// Create a new box from its inclusive corners.
    pub fn new(lower: IVec3, upper: IVec3) -> Self {
        Self { lower, upper }
    }

    /// Create a box starting at `min` spanning `shape` cells per axis.
    pub fn from_min_and_shape(min: IVec3, shape: IVec3) -> Self {
        Self {
            lower: min,
            upper: min + shape - IVec3::ONE,
        }
    }

    /// Number of cells along each axis.
    pub fn shape(&self) -> IVec3 {
        self.upper - self.lower + IVec3::ONE
    }

    /// Total number of cells (0 for an inverted box).
    pub fn volume(&self) -> usize {
        let s = self.shape();
        if s.min_element() <= 0 {
            return 0;
        }
        s.x as usize * s.y as usize * s.z as usize
    }

    pub fn contains_point(&self, p: IVec3) -> bool {
        p.cmpge(self.lower).all() && p.cmple(self.upper).all()
    }

    /// Returns true if `other` lies completely inside this box.
    pub fn contains_box(&self, other: &Box3i) -> bool {
        self.contains_point(other.lower) && self.contains_point(other.upper)
    }

    /// Returns true if the two boxes share at least one cell.
    pub fn intersects(&self, other: &Box3i) -> bool {
        self.lower.cmple(other.upper).all() && other.lower.cmple(self.upper).all()
    }

    /// Map this box into the index space of a level `factor` times finer.
    ///
    /// Every fine cell covered by a coarse cell of this box is included.
    pub fn scale(&self, factor: i32) -> Box3i {
        Box3i {
            lower: self.lower * factor,
            upper: (self.upper + IVec3::ONE) * factor - IVec3::ONE,
        }
    }

    /// Map this box into the index space of a level `factor` times coarser.
    pub fn downscale(&self, factor: i32) -> Box3i {
        Box3i {
            lower: self.lower.div_euclid(IVec3::splat(factor)),
            upper: self.upper.div_euclid(IVec3::splat(factor)),
        }
    }

    /// Iterate every cell of the box, X fastest.
    pub fn iter_points(&self) -> impl Iterator<Item = IVec3> {
        let Box3i { lower, upper } = *self;
        (lower.z..=upper.z).flat_map(move |z| {
            (lower.y..=upper.y)
                .flat_map(move |y| (lower.x..=upper.x).map(move |x| IVec3::new(x, y, z)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_shape_and_volume() {
        let b = Box3i::from_min_and_shape(IVec3::new(8, 0, 16), IVec3::splat(8));

        assert_eq!(b.upper, IVec3::new(15, 7, 23));
        assert_eq!(b.shape(), IVec3::splat(8));
        assert_eq!(b.volume(), 512);

        let inverted = Box3i::new(IVec3::ONE, IVec3::ZERO);
        assert_eq!(inverted.volume(), 0);
    }

    #[test]
    fn test_box_contains() {
        let b = Box3i::new(IVec3::ZERO, IVec3::splat(7));

        // Inclusive on both ends
        assert!(b.contains_point(IVec3::ZERO));
        assert!(b.contains_point(IVec3::splat(7)));
        assert!(!b.contains_point(IVec3::new(8, 0, 0)));
        assert!(!b.contains_point(IVec3::new(0, -1, 0)));

        let inner = Box3i::new(IVec3::ONE, IVec3::splat(3));
        assert!(b.contains_box(&inner));
        assert!(!inner.contains_box(&b));
    }

    #[test]
    fn test_box_intersects() {
        let a = Box3i::new(IVec3::ZERO, IVec3::splat(7));
        let touching = Box3i::new(IVec3::splat(7), IVec3::splat(9));
        let adjacent = Box3i::new(IVec3::new(8, 0, 0), IVec3::new(15, 7, 7));

        assert!(a.intersects(&touching));
        assert!(!a.intersects(&adjacent));
    }

    #[test]
    fn test_box_scale_roundtrip() {
        let coarse = Box3i::new(IVec3::new(8, 0, 0), IVec3::new(15, 7, 7));
        let fine = coarse.scale(2);

        assert_eq!(fine.lower, IVec3::new(16, 0, 0));
        assert_eq!(fine.upper, IVec3::new(31, 15, 15));
        assert_eq!(fine.volume(), coarse.volume() * 8);
        assert_eq!(fine.downscale(2), coarse);
    }

    #[test]
    fn test_box_iter_points_x_fastest() {
        let b = Box3i::new(IVec3::ZERO, IVec3::new(1, 1, 0));
        let points: Vec<IVec3> = b.iter_points().collect();

        assert_eq!(
            points,
            vec![
                IVec3::new(0, 0, 0),
                IVec3::new(1, 0, 0),
                IVec3::new(0, 1, 0),
                IVec3::new(1, 1, 0),
            ]
        );
    }

    #[test]
    fn test_box_is_pod() {
        let b = Box3i::new(IVec3::new(1, 2, 3), IVec3::new(4, 5, 6));
        let ints: &[i32] = bytemuck::cast_slice(std::slice::from_ref(&b));
        assert_eq!(ints, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(std::mem::size_of::<Box3i>(), 24);
    }
}
