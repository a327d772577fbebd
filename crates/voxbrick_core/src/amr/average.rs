use rayon::prelude::*;
use voxbrick_math::IVec3;

use crate::amr::AmrError;
use crate::grid::DenseGrid;

/// Box-filter `fine` down by `factor` along every axis.
///
/// Each coarse voxel is the mean of the `factor^3` fine voxels it covers,
/// accumulated as `sum(v / factor^3)`. Coarse z-slices are independent
/// and are computed in parallel.
pub fn average(fine: &DenseGrid, factor: i32) -> Result<DenseGrid, AmrError> {
    let fine_dims = fine.dims();
    if factor < 1 || (fine_dims % factor).cmpne(IVec3::ZERO).any() {
        return Err(AmrError::NotDivisible {
            dims: fine_dims,
            factor,
        });
    }

    let coarse_dims = fine_dims / factor;
    let mut coarse = DenseGrid::filled(coarse_dims, 0.0)?;
    let cube = (factor as f32).powi(3);
    let slice_len = (coarse_dims.x * coarse_dims.y) as usize;

    coarse
        .voxels_mut()
        .par_chunks_mut(slice_len)
        .enumerate()
        .for_each(|(cz, slice)| {
            let z0 = cz as i32 * factor;
            for iz in z0..z0 + factor {
                for iy in 0..fine_dims.y {
                    let row = (iy / factor * coarse_dims.x) as usize;
                    for ix in 0..fine_dims.x {
                        let v = fine.get(IVec3::new(ix, iy, iz));
                        slice[row + (ix / factor) as usize] += v / cube;
                    }
                }
            }
        });

    Ok(coarse)
}
