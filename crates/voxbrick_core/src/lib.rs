//! Voxbrick Core - multiresolution brick decomposition for volume rendering.
//!
//! This crate provides:
//!
//! - **Dense grids**: `DenseGrid`, a flat X-fastest scalar field
//! - **RAW import**: headerless brick-of-data volume loading
//! - **Procedural volumes**: seeded test volumes (gravity spheres)
//! - **AMR builder**: octree-style refinement levels made of fixed-size
//!   bricks, with variance-based pruning of flat regions
//! - **Export**: the `.info` / `.data` / `.osp` file triple
//!
//! # Example
//!
//! ```ignore
//! use voxbrick_core::{load_raw, make_amr, write_amr, AmrConfig, VoxelType};
//! use voxbrick_math::IVec3;
//!
//! let grid = load_raw("volume.raw", VoxelType::Float, IVec3::splat(256))?;
//! let amr = make_amr(&grid, &AmrConfig::default())?;
//! println!("Kept {} bricks over {} levels", amr.len(), amr.num_levels());
//! write_amr("volume_amr", &amr)?;
//! ```

pub mod amr;
pub mod config;
pub mod context;
pub mod export;
pub mod grid;
pub mod procedural;
pub mod raw;

// Re-export commonly used types
pub use amr::{make_amr, make_amr_with_context, AmrError, AmrVolume, BrickRef};
pub use config::{load_config, AmrConfig, ConfigError, PaddingPolicy};
pub use context::{BuildContext, BuildReport, LevelStats};
pub use export::{read_amr, write_amr, ExportError};
pub use grid::{DenseGrid, GridError};
pub use procedural::GravitySpheres;
pub use raw::{load_raw, RawError, VoxelType};
