//! Per-session build state and diagnostics.
//!
//! Notices that should only be printed once per session live on a
//! [`BuildContext`] owned by the caller instead of in process-wide
//! statics, so a test can reset them between runs.

use std::collections::HashSet;
use std::sync::Mutex;

use voxbrick_math::IVec3;

/// Session state shared by consecutive AMR builds.
#[derive(Debug, Default)]
pub struct BuildContext {
    warned: Mutex<HashSet<String>>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` at warn level unless `key` was already warned about.
    ///
    /// Returns true if the message was emitted.
    pub fn warn_once(&self, key: &str, message: impl AsRef<str>) -> bool {
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        if warned.contains(key) {
            return false;
        }
        warned.insert(key.to_string());
        log::warn!("{}", message.as_ref());
        true
    }

    pub fn has_warned(&self, key: &str) -> bool {
        self.warned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }

    /// Forget every warning issued so far.
    pub fn reset(&self) {
        self.warned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

/// Brick bookkeeping for one refinement level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelStats {
    pub level: u32,
    /// Grid dimensions of this level
    pub dims: IVec3,
    /// Bricks the level was partitioned into
    pub candidates: usize,
    pub kept: usize,
    pub pruned: usize,
    pub cell_width: f32,
}

impl LevelStats {
    pub fn new(level: u32, dims: IVec3, candidates: usize, cell_width: f32) -> Self {
        Self {
            level,
            dims,
            candidates,
            kept: 0,
            pruned: 0,
            cell_width,
        }
    }

    /// Fraction of candidate bricks that were pruned, in [0, 1].
    pub fn pruned_fraction(&self) -> f32 {
        if self.candidates == 0 {
            0.0
        } else {
            self.pruned as f32 / self.candidates as f32
        }
    }
}

/// Summary of a finished AMR build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildReport {
    pub input_dims: IVec3,
    pub finest_dims: IVec3,
    /// One entry per level, finest first (processing order)
    pub levels: Vec<LevelStats>,
}

impl BuildReport {
    pub fn total_kept(&self) -> usize {
        self.levels.iter().map(|l| l.kept).sum()
    }

    pub fn total_pruned(&self) -> usize {
        self.levels.iter().map(|l| l.pruned).sum()
    }

    pub fn level(&self, level: u32) -> Option<&LevelStats> {
        self.levels.iter().find(|l| l.level == level)
    }
}
