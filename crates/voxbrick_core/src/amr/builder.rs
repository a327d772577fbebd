//! AMR assembler: drives averaging, partitioning and pruning level by level.

use std::borrow::Cow;
use std::sync::Mutex;

use rayon::prelude::*;
use thiserror::Error;
use voxbrick_math::{Box3i, IVec3, Range1f};

use crate::amr::{brick_count, brick_slot, should_keep, AmrVolume};
use crate::config::{AmrConfig, ConfigError, PaddingPolicy};
use crate::context::{BuildContext, BuildReport, LevelStats};
use crate::grid::{DenseGrid, GridError};

/// Errors that can occur while building a brick hierarchy.
#[derive(Error, Debug)]
pub enum AmrError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error(
        "too many levels, or too fine a refinement factor: finest level width {min_width} \
         must be below {limit} to have more than a single brick at the root"
    )]
    HierarchyTooDeep { min_width: i64, limit: i64 },

    #[error("Input grid {input} does not match the finest level size {finest} (enable zero padding or resample the input)")]
    InputNotPadded { input: IVec3, finest: IVec3 },

    #[error("Grid dims {dims} are not divisible by {factor}")]
    NotDivisible { dims: IVec3, factor: i32 },

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

/// Build a brick hierarchy from `input`.
///
/// See [`make_amr_with_context`] for details; this variant uses a fresh
/// [`BuildContext`] and discards the build report.
pub fn make_amr(input: &DenseGrid, config: &AmrConfig) -> Result<AmrVolume, AmrError> {
    let ctx = BuildContext::new();
    make_amr_with_context(input, config, &ctx).map(|(volume, _)| volume)
}

/// Build a brick hierarchy from `input`, reporting per-level statistics.
///
/// Levels are processed from finest to coarsest. Within a level, bricks
/// are handled in parallel: each one copies its payload, measures its
/// value range, and sums its share of the next coarser grid into a
/// private buffer. Kept bricks are appended under a lock; the private
/// buffers are merged into the coarser grid once the whole level is done.
///
/// Everything is validated up front, so on error no work has been done.
pub fn make_amr_with_context(
    input: &DenseGrid,
    config: &AmrConfig,
    ctx: &BuildContext,
) -> Result<(AmrVolume, BuildReport), AmrError> {
    config.validate()?;

    let input_dims = input.dims();
    let block_size = config.block_size as i32;
    let factor = config.refinement_factor as i32;

    // validate() guarantees both fit
    let min_width = config.min_width().ok_or_else(|| {
        ConfigError::Invalid("finest level width overflows".to_string())
    })?;
    let limit = factor as i64 * input_dims.max_element() as i64;
    if min_width as i64 >= limit {
        return Err(AmrError::HierarchyTooDeep {
            min_width: min_width as i64,
            limit,
        });
    }

    let finest_dims = config.finest_dims(input_dims).ok_or_else(|| {
        ConfigError::Invalid(format!("finest level for input {} overflows", input_dims))
    })?;

    let mut current: Cow<'_, DenseGrid> = if finest_dims == input_dims {
        Cow::Borrowed(input)
    } else {
        match config.padding {
            PaddingPolicy::Reject => {
                return Err(AmrError::InputNotPadded {
                    input: input_dims,
                    finest: finest_dims,
                })
            }
            PaddingPolicy::ZeroFill => {
                ctx.warn_once(
                    "amr.zero_fill",
                    format!(
                        "Padding input grid {} with zeros to finest level size {}",
                        input_dims, finest_dims
                    ),
                );
                Cow::Owned(input.padded_to(finest_dims, 0.0)?)
            }
        }
    };

    log::info!(
        "Building AMR hierarchy: {} levels, block size {}, refinement {}, threshold {}",
        config.num_levels,
        config.block_size,
        config.refinement_factor,
        config.threshold
    );
    log::info!(
        "Finest level size is {} (input was {})",
        finest_dims,
        input_dims
    );

    let cell_widths = (0..config.num_levels).map(|l| config.cell_width(l)).collect();
    let mut volume = AmrVolume::new(config.block_size, cell_widths);
    let mut report = BuildReport {
        input_dims,
        finest_dims,
        levels: Vec::with_capacity(config.num_levels as usize),
    };

    for level in (0..config.num_levels).rev() {
        let level_dims = current.dims();
        let num_bricks = brick_count(level_dims, block_size);
        let cell_width = config.cell_width(level);

        log::debug!(
            "Level {}: size {}, {} candidate bricks",
            level,
            level_dims,
            num_bricks
        );

        let shared = Mutex::new(LevelAccumulator {
            volume,
            stats: LevelStats::new(level, level_dims, num_bricks, cell_width),
            done: 0,
        });

        let grid: &DenseGrid = &current;
        let partials: Vec<CoarsePartial> = (0..num_bricks)
            .into_par_iter()
            .filter_map(|brick_idx| {
                let bounds = brick_slot(level_dims, block_size, brick_idx).bounds;
                let scan = scan_brick(grid, &bounds, level, factor);

                let keep = should_keep(level, &scan.range, config.threshold);
                let mut acc = shared.lock().unwrap_or_else(|e| e.into_inner());
                if keep {
                    acc.volume.push(bounds, level as i32, scan.data);
                    acc.stats.kept += 1;
                } else {
                    acc.stats.pruned += 1;
                }
                acc.done += 1;
                if progress_due(acc.done, num_bricks) {
                    log::debug!(
                        "Level {}: {}/{} bricks, removed {:.1}%",
                        level,
                        acc.done,
                        num_bricks,
                        100.0 * acc.stats.pruned as f32 / acc.done as f32
                    );
                }
                drop(acc);

                scan.partial
            })
            .collect();

        let acc = shared.into_inner().unwrap_or_else(|e| e.into_inner());
        volume = acc.volume;

        log::info!(
            "Done level {}: kept {} bricks, removed {} ({:.1}%)",
            level,
            acc.stats.kept,
            acc.stats.pruned,
            acc.stats.pruned_fraction() * 100.0
        );
        report.levels.push(acc.stats);

        if level > 0 {
            let mut next = DenseGrid::filled(level_dims / factor, 0.0)?;
            for partial in &partials {
                partial.merge_into(&mut next);
            }
            current = Cow::Owned(next);
        }
    }

    Ok((volume, report))
}

/// Progress lines logged per level, at most.
const PROGRESS_STEPS: usize = 20;

/// Output of one level, guarded by a single lock.
struct LevelAccumulator {
    volume: AmrVolume,
    stats: LevelStats,
    /// Bricks scanned so far, kept or not
    done: usize,
}

fn progress_due(done: usize, total: usize) -> bool {
    let every = (total / PROGRESS_STEPS).max(1);
    done % every == 0 || done == total
}

/// One brick's contribution to the next coarser grid.
struct CoarsePartial {
    /// Coarse cells touched by the brick
    footprint: Box3i,
    /// Partial sums over `footprint`, X fastest
    sums: Vec<f32>,
}

impl CoarsePartial {
    fn merge_into(&self, coarse: &mut DenseGrid) {
        for (p, sum) in self.footprint.iter_points().zip(&self.sums) {
            let idx = coarse.index(p);
            coarse.voxels_mut()[idx] += *sum;
        }
    }
}

struct BrickScan {
    data: Vec<f32>,
    range: Range1f,
    partial: Option<CoarsePartial>,
}

/// Single pass over a brick: payload, value range and (above level 0)
/// the brick's block-averaged contribution to the coarser level.
fn scan_brick(grid: &DenseGrid, bounds: &Box3i, level: u32, factor: i32) -> BrickScan {
    let mut data = Vec::with_capacity(bounds.volume());
    let mut range = Range1f::EMPTY;

    let mut partial = (level > 0).then(|| {
        let footprint = bounds.downscale(factor);
        CoarsePartial {
            footprint,
            sums: vec![0.0; footprint.volume()],
        }
    });
    let cube = (factor as f32).powi(3);

    for p in bounds.iter_points() {
        let v = grid.get(p);
        data.push(v);
        range.extend(v);

        if let Some(partial) = partial.as_mut() {
            let shape = partial.footprint.shape();
            let local = p / factor - partial.footprint.lower;
            let idx = local.x as usize
                + shape.x as usize * (local.y as usize + shape.y as usize * local.z as usize);
            partial.sums[idx] += v / cube;
        }
    }

    BrickScan {
        data,
        range,
        partial,
    }
}
