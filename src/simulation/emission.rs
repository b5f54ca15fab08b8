use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec2;

/// Strict comparison: a particle exactly on the kill radius is still in bounds.
pub fn is_out_of_bounds(position: Vec2, emitter_center: Vec2, radius_sqr: f32) -> bool {
    position.distance_squared(emitter_center) > radius_sqr
}

/// Per-frame emission counter shared by every worker of one update pass.
///
/// Every out-of-bounds particle claims a ticket; tickets beyond the quota are
/// refused. Which workers win when the quota is contested is unspecified.
#[derive(Debug)]
pub struct EmissionQuota {
    max_per_frame: u32,
    emitted: AtomicU32,
}

impl EmissionQuota {
    pub fn new(max_per_frame: u32) -> Self {
        Self {
            max_per_frame,
            emitted: AtomicU32::new(0),
        }
    }

    /// Increments the counter and reports whether the caller may recycle its particle.
    pub fn try_claim(&self) -> bool {
        let ticket = self.emitted.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        ticket <= self.max_per_frame
    }

    /// Particles actually granted a reset since the last `start_frame`.
    pub fn granted(&self) -> u32 {
        self.emitted.load(Ordering::Relaxed).min(self.max_per_frame)
    }

    pub fn start_frame(&self) {
        self.emitted.store(0, Ordering::Relaxed);
    }
}
