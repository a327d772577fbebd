//! Procedural test volumes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use voxbrick_math::{IVec3, Vec3};

use crate::config::AmrConfig;
use crate::grid::{DenseGrid, GridError};

/// A field of point masses, sampled as summed inverse-square "gravity".
///
/// Values spike near each point and fall off smoothly elsewhere, which
/// makes it a good stress test for variance-based brick pruning.
#[derive(Debug, Clone, PartialEq)]
pub struct GravitySpheres {
    pub dims: IVec3,
    pub num_points: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy)]
struct Point {
    center: Vec3,
    weight: f32,
}

impl Default for GravitySpheres {
    fn default() -> Self {
        Self {
            dims: IVec3::splat(128),
            num_points: 10,
            seed: 0,
        }
    }
}

impl GravitySpheres {
    pub fn new(dims: IVec3, num_points: usize, seed: u64) -> Self {
        Self {
            dims,
            num_points,
            seed,
        }
    }

    /// AMR parameters this volume is usually converted with.
    pub fn amr_config() -> AmrConfig {
        AmrConfig::new(2, 16, 4, 1.0)
    }

    fn points(&self) -> Vec<Point> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.num_points)
            .map(|_| Point {
                center: Vec3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                ),
                weight: rng.gen_range(0.1..0.3),
            })
            .collect()
    }

    /// Map a voxel index to world space in [-1, 1]^3.
    fn world_position(&self, p: IVec3) -> Vec3 {
        let denom = (self.dims - IVec3::ONE).max(IVec3::ONE).as_vec3();
        Vec3::splat(-1.0) + p.as_vec3() / denom * 2.0
    }

    /// Sample the field on a dense grid. Z-slices are generated in parallel.
    pub fn generate(&self) -> Result<DenseGrid, GridError> {
        let mut grid = DenseGrid::filled(self.dims, 0.0)?;
        let points = self.points();
        let (nx, ny) = (self.dims.x, self.dims.y);

        grid.voxels_mut()
            .par_chunks_mut((nx * ny) as usize)
            .enumerate()
            .for_each(|(k, slice)| {
                for j in 0..ny {
                    for i in 0..nx {
                        let pos = self.world_position(IVec3::new(i, j, k as i32));
                        slice[(i + nx * j) as usize] = points
                            .iter()
                            .map(|p| p.weight / pos.distance_squared(p.center))
                            .sum();
                    }
                }
            });

        log::debug!(
            "Generated gravity spheres volume {} with {} points (seed {})",
            self.dims,
            self.num_points,
            self.seed
        );

        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amr::make_amr;

    #[test]
    fn test_same_seed_same_volume() {
        let a = GravitySpheres::new(IVec3::splat(16), 4, 7).generate().unwrap();
        let b = GravitySpheres::new(IVec3::splat(16), 4, 7).generate().unwrap();
        assert_eq!(a, b);

        let c = GravitySpheres::new(IVec3::splat(16), 4, 8).generate().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_values_are_positive() {
        let grid = GravitySpheres::new(IVec3::new(8, 12, 16), 3, 1).generate().unwrap();
        assert_eq!(grid.dims(), IVec3::new(8, 12, 16));
        assert!(grid.voxels().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_no_points_is_empty_field() {
        let grid = GravitySpheres::new(IVec3::splat(4), 0, 0).generate().unwrap();
        assert!(grid.voxels().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_world_position_corners() {
        let spheres = GravitySpheres::new(IVec3::splat(5), 1, 0);
        assert_eq!(spheres.world_position(IVec3::ZERO), Vec3::splat(-1.0));
        assert_eq!(spheres.world_position(IVec3::splat(4)), Vec3::splat(1.0));
        assert_eq!(spheres.world_position(IVec3::splat(2)), Vec3::ZERO);
    }

    #[test]
    fn test_converts_with_default_parameters() {
        let grid = GravitySpheres::new(IVec3::splat(128), 10, 0).generate().unwrap();
        let volume = make_amr(&grid, &GravitySpheres::amr_config()).unwrap();

        // 128 / 4 = 32 cells at the root, 2 bricks per axis
        assert_eq!(volume.count_at_level(0), 8);
        assert!(volume.count_at_level(1) <= 512);
        assert_eq!(volume.cell_widths, vec![1.0, 0.25]);
    }
}
