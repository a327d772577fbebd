// Re-export glam for convenience
pub use glam::*;

// Lattice types
mod box3;
mod range;
pub use box3::Box3i;
pub use range::Range1f;
