//! Dense scalar grids.
//!
//! A [`DenseGrid`] is a flat array of `f32` samples with integer
//! dimensions, indexed `ix + nx * (iy + ny * iz)` (X fastest).

use thiserror::Error;
use voxbrick_math::{Box3i, IVec3, Range1f};

/// Errors that can occur when constructing or reshaping a grid.
#[derive(Error, Debug, PartialEq)]
pub enum GridError {
    #[error("Invalid grid dimensions {0} (every axis must be positive)")]
    InvalidDims(IVec3),

    #[error("Grid of dims {dims} needs {expected} voxels, got {actual}")]
    SizeMismatch {
        dims: IVec3,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot pad grid of dims {from} to smaller dims {to}")]
    PadShrinks { from: IVec3, to: IVec3 },
}

pub type GridResult<T> = Result<T, GridError>;

/// Number of voxels in a grid of `dims`.
pub fn voxel_count(dims: IVec3) -> usize {
    dims.x.max(0) as usize * dims.y.max(0) as usize * dims.z.max(0) as usize
}

fn check_dims(dims: IVec3) -> GridResult<()> {
    if dims.min_element() <= 0 {
        return Err(GridError::InvalidDims(dims));
    }
    Ok(())
}

/// A dense 3D field of single-precision samples.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseGrid {
    dims: IVec3,
    voxels: Vec<f32>,
}

impl DenseGrid {
    /// Wrap an existing voxel buffer.
    pub fn new(dims: IVec3, voxels: Vec<f32>) -> GridResult<Self> {
        check_dims(dims)?;
        let expected = voxel_count(dims);
        if voxels.len() != expected {
            return Err(GridError::SizeMismatch {
                dims,
                expected,
                actual: voxels.len(),
            });
        }
        Ok(Self { dims, voxels })
    }

    /// Create a grid where every voxel holds `value`.
    pub fn filled(dims: IVec3, value: f32) -> GridResult<Self> {
        check_dims(dims)?;
        Ok(Self {
            dims,
            voxels: vec![value; voxel_count(dims)],
        })
    }

    /// Create a grid by evaluating `f` at every voxel.
    pub fn from_fn(dims: IVec3, mut f: impl FnMut(IVec3) -> f32) -> GridResult<Self> {
        check_dims(dims)?;
        let voxels = Box3i::from_min_and_shape(IVec3::ZERO, dims)
            .iter_points()
            .map(&mut f)
            .collect();
        Ok(Self { dims, voxels })
    }

    pub fn dims(&self) -> IVec3 {
        self.dims
    }

    pub fn voxels(&self) -> &[f32] {
        &self.voxels
    }

    pub fn voxels_mut(&mut self) -> &mut [f32] {
        &mut self.voxels
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Flat index of the voxel at `p`.
    #[inline]
    pub fn index(&self, p: IVec3) -> usize {
        p.x as usize + self.dims.x as usize * (p.y as usize + self.dims.y as usize * p.z as usize)
    }

    #[inline]
    pub fn get(&self, p: IVec3) -> f32 {
        self.voxels[self.index(p)]
    }

    #[inline]
    pub fn set(&mut self, p: IVec3, value: f32) {
        let idx = self.index(p);
        self.voxels[idx] = value;
    }

    /// Smallest and largest sample in the grid.
    pub fn value_range(&self) -> Range1f {
        Range1f::from_values(self.voxels.iter().copied())
    }

    /// Copy the voxels of `bounds` (X fastest) into a new buffer.
    ///
    /// `bounds` must lie inside the grid.
    pub fn extract(&self, bounds: &Box3i) -> Vec<f32> {
        let shape = bounds.shape();
        let mut out = Vec::with_capacity(bounds.volume());
        let row = shape.x as usize;
        for z in bounds.lower.z..=bounds.upper.z {
            for y in bounds.lower.y..=bounds.upper.y {
                let start = self.index(IVec3::new(bounds.lower.x, y, z));
                out.extend_from_slice(&self.voxels[start..start + row]);
            }
        }
        out
    }

    /// Embed this grid at the origin of a larger grid, filling the rest with `fill`.
    pub fn padded_to(&self, dims: IVec3, fill: f32) -> GridResult<DenseGrid> {
        check_dims(dims)?;
        if dims.cmplt(self.dims).any() {
            return Err(GridError::PadShrinks {
                from: self.dims,
                to: dims,
            });
        }
        if dims == self.dims {
            return Ok(self.clone());
        }

        let mut padded = DenseGrid::filled(dims, fill)?;
        let row = self.dims.x as usize;
        for z in 0..self.dims.z {
            for y in 0..self.dims.y {
                let src = self.index(IVec3::new(0, y, z));
                let dst = padded.index(IVec3::new(0, y, z));
                padded.voxels[dst..dst + row].copy_from_slice(&self.voxels[src..src + row]);
            }
        }
        Ok(padded)
    }
}
