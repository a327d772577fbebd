//! AMR build configuration.
//!
//! Parameters can be built in code, loaded from a JSON file, or both
//! (load a file, then override individual fields).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxbrick_math::IVec3;

/// Errors that can occur while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What to do with an input grid smaller than the finest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingPolicy {
    /// Refuse to build; the caller must supply a grid of the finest-level size.
    #[default]
    Reject,
    /// Pad the input with zeros up to the finest-level size.
    ZeroFill,
}

/// Parameters of the multiresolution hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmrConfig {
    /// Number of refinement levels (level 0 is the coarsest).
    pub num_levels: u32,
    /// Edge length of every brick, in cells of its own level.
    pub block_size: u32,
    /// Per-axis cell count ratio between adjacent levels.
    pub refinement_factor: u32,
    /// Bricks above level 0 whose value spread is not above this are dropped.
    pub threshold: f32,
    pub padding: PaddingPolicy,
}

impl Default for AmrConfig {
    fn default() -> Self {
        Self {
            num_levels: 2,
            block_size: 16,
            refinement_factor: 4,
            threshold: 1.0,
            padding: PaddingPolicy::Reject,
        }
    }
}

impl AmrConfig {
    pub fn new(num_levels: u32, block_size: u32, refinement_factor: u32, threshold: f32) -> Self {
        Self {
            num_levels,
            block_size,
            refinement_factor,
            threshold,
            padding: PaddingPolicy::Reject,
        }
    }

    pub fn with_padding(mut self, padding: PaddingPolicy) -> Self {
        self.padding = padding;
        self
    }

    /// Check that the parameters describe a usable hierarchy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_levels < 1 {
            return Err(ConfigError::Invalid("num_levels must be at least 1".into()));
        }
        if self.block_size < 1 {
            return Err(ConfigError::Invalid("block_size must be at least 1".into()));
        }
        if self.refinement_factor < 2 {
            return Err(ConfigError::Invalid(
                "refinement_factor must be at least 2".into(),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        if i32::try_from(self.refinement_factor)
            .ok()
            .and_then(|f| f.checked_pow(3))
            .is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "refinement_factor {} is too large",
                self.refinement_factor
            )));
        }
        if self.min_width().is_none() {
            return Err(ConfigError::Invalid(format!(
                "block_size {} * refinement_factor {}^{} overflows",
                self.block_size,
                self.refinement_factor,
                self.num_levels - 1
            )));
        }
        Ok(())
    }

    /// Edge length of the finest level must be a multiple of this:
    /// `block_size * refinement_factor^(num_levels - 1)`.
    ///
    /// Returns `None` if the value does not fit in an `i32`.
    pub fn min_width(&self) -> Option<i32> {
        let mut width = i32::try_from(self.block_size).ok()?;
        let factor = i32::try_from(self.refinement_factor).ok()?;
        for _ in 1..self.num_levels {
            width = width.checked_mul(factor)?;
        }
        Some(width)
    }

    /// Dimensions of the finest level for an input of `input_dims`:
    /// each axis rounded up to the next multiple of [`Self::min_width`].
    pub fn finest_dims(&self, input_dims: IVec3) -> Option<IVec3> {
        let w = self.min_width()?;
        let round = |n: i32| -> Option<i32> {
            let blocks = (n.max(1) + w - 1) / w;
            blocks.checked_mul(w)
        };
        Some(IVec3::new(
            round(input_dims.x)?,
            round(input_dims.y)?,
            round(input_dims.z)?,
        ))
    }

    /// World-space voxel size at `level`: `1 / refinement_factor^level`.
    pub fn cell_width(&self, level: u32) -> f32 {
        1.0 / (self.refinement_factor as f32).powi(level as i32)
    }
}

/// Load configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AmrConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AmrConfig = serde_json::from_str(&content)?;
    config.validate()?;

    log::debug!("Loaded AMR config from {}: {:?}", path.display(), config);

    Ok(config)
}
