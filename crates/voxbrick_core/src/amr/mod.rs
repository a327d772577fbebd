//! Adaptive mesh refinement (AMR) brick hierarchies.
//!
//! Turns one dense scalar grid into a stack of refinement levels, each
//! made of fixed-size cubic bricks:
//!
//! - the finest level is the (padded) input grid
//! - every coarser level is the box-filter average of the one above it
//! - bricks above level 0 whose values are nearly constant are dropped,
//!   since the coarser level already carries their average
//!
//! Level 0 is always kept whole, so the hierarchy covers the full domain.
//!
//! # Example
//!
//! ```ignore
//! use voxbrick_core::amr::make_amr;
//! use voxbrick_core::{AmrConfig, DenseGrid};
//! use voxbrick_math::IVec3;
//!
//! let grid = DenseGrid::filled(IVec3::splat(32), 0.0)?;
//! let amr = make_amr(&grid, &AmrConfig::new(2, 8, 2, 1.0))?;
//! assert_eq!(amr.count_at_level(0), 8);
//! ```

mod average;
mod builder;
mod partition;
mod prune;
mod types;

pub use average::*;
pub use builder::*;
pub use partition::*;
pub use prune::*;
pub use types::*;
