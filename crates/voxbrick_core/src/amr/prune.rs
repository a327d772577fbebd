use voxbrick_math::Range1f;

/// Decide whether a brick at `level` is worth keeping as its own brick.
///
/// Level 0 bricks are always kept. Above that a brick survives only if
/// the spread of its values is strictly greater than `threshold`; a
/// flatter brick is already represented by its parent's average.
#[inline]
pub fn should_keep(level: u32, range: &Range1f, threshold: f32) -> bool {
    level == 0 || range.size() > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_level_always_kept() {
        let flat = Range1f::new(3.0, 3.0);
        assert!(should_keep(0, &flat, 0.0));
        assert!(should_keep(0, &flat, 1e9));
        assert!(should_keep(0, &Range1f::EMPTY, 1.0));
    }

    #[test]
    fn test_threshold_is_strict() {
        // Spread exactly at the threshold is pruned
        assert!(!should_keep(1, &Range1f::new(0.0, 1.0), 1.0));

        // Anything above it is kept
        assert!(should_keep(1, &Range1f::new(0.0, 1.0 + 1e-5), 1.0));
        assert!(should_keep(3, &Range1f::new(-2.0, 2.0), 1.0));
    }

    #[test]
    fn test_flat_brick_pruned_with_zero_threshold() {
        assert!(!should_keep(1, &Range1f::new(7.0, 7.0), 0.0));
        assert!(should_keep(1, &Range1f::new(7.0, 7.5), 0.0));
    }
}
