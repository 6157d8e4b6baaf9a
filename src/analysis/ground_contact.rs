// src/analysis/ground_contact.rs
//
// Per-skate ground-contact model. A wheel is GROUNDED while its centroid has
// not risen more than `lift_threshold_px` above the baseline: the trend of its
// own recent grounded positions, extrapolated to the current frame. Once
// LIFTED it only returns to GROUNDED after coming back within
// `release_threshold_px`, so single-frame bbox jitter cannot toggle the flag.
//
// Following the trend (not a flat mean) keeps a skater rolling up or down the
// image grounded. A lifted wheel that then holds still for `settle_frames`
// (within the release tolerance) has landed at a new height: it is grounded
// again and the baseline restarts from that window.
//
// Image y grows downward: rise = baseline_y - y.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ring_buffer::RingBuffer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundContactConfig {
    /// Rise above baseline (px) that marks the wheel as lifted
    pub lift_threshold_px: f32,
    /// Rise (px) the wheel must fall back under before it counts as grounded again
    pub release_threshold_px: f32,
    /// Grounded samples the baseline trend is fitted to
    pub baseline_window: usize,
    /// Consecutive still frames after which a lifted wheel counts as landed
    pub settle_frames: usize,
    /// Per-frame contact samples retained for lagged lookups
    pub contact_history: usize,
}

impl Default for GroundContactConfig {
    fn default() -> Self {
        Self {
            lift_threshold_px: 12.0,
            release_threshold_px: 6.0,
            baseline_window: 15,
            settle_frames: 10,
            contact_history: 90, // 3s at 30fps
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContactSample {
    pub frame_index: u64,
    pub grounded: bool,
    /// Height above the baseline at this frame (negative = below it)
    pub rise_px: f32,
}

#[derive(Debug, Clone)]
pub struct GroundContact {
    lift_threshold_px: f32,
    release_threshold_px: f32,
    /// (frame, y) of settled grounded samples
    baseline: RingBuffer<(u64, f32)>,
    /// (frame, y) of every observation, for the stillness check
    recent: RingBuffer<(u64, f32)>,
    history: RingBuffer<ContactSample>,
    grounded: bool,
}

impl GroundContact {
    pub fn new(config: &GroundContactConfig) -> Self {
        Self {
            lift_threshold_px: config.lift_threshold_px,
            release_threshold_px: config.release_threshold_px,
            baseline: RingBuffer::with_capacity(config.baseline_window),
            recent: RingBuffer::with_capacity(config.settle_frames),
            history: RingBuffer::with_capacity(config.contact_history),
            grounded: true,
        }
    }

    /// Feed the wheel's vertical position for one frame. Returns the updated flag.
    pub fn observe(&mut self, frame_index: u64, y: f32) -> bool {
        let mut rise_px = self.baseline_at(frame_index).map(|b| b - y).unwrap_or(0.0);
        self.recent.push((frame_index, y));

        let mut grounded = if self.grounded {
            rise_px <= self.lift_threshold_px
        } else {
            rise_px <= self.release_threshold_px
        };

        let settled = !grounded && self.is_still();
        if settled {
            grounded = true;
            self.baseline.clear();
            for &sample in self.recent.iter() {
                self.baseline.push(sample);
            }
            rise_px = self.baseline_at(frame_index).map(|b| b - y).unwrap_or(0.0);
        } else if grounded && rise_px <= self.release_threshold_px {
            // Only settled positions feed the baseline; the band between release
            // and lift would otherwise let the baseline creep upward with the wheel.
            self.baseline.push((frame_index, y));
        }

        if grounded != self.grounded {
            debug!(
                "wheel {} at frame {} (rise {:.1}px{})",
                if grounded { "landed" } else { "lifted" },
                frame_index,
                rise_px,
                if settled { ", settled at new height" } else { "" }
            );
        }
        self.grounded = grounded;

        self.history.push(ContactSample {
            frame_index,
            grounded,
            rise_px,
        });
        grounded
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Baseline y expected at `frame_index`: least-squares line through the
    /// grounded samples, or their value when only one is known.
    pub fn baseline_at(&self, frame_index: u64) -> Option<f32> {
        let n = self.baseline.len();
        if n == 0 {
            return None;
        }
        let n_f = n as f64;
        let mean_t = self.baseline.iter().map(|&(f, _)| f as f64).sum::<f64>() / n_f;
        let mean_y = self.baseline.iter().map(|&(_, y)| y as f64).sum::<f64>() / n_f;

        let mut cov = 0.0;
        let mut var = 0.0;
        for &(f, y) in self.baseline.iter() {
            let dt = f as f64 - mean_t;
            cov += dt * (y as f64 - mean_y);
            var += dt * dt;
        }
        if var <= f64::EPSILON {
            return Some(mean_y as f32);
        }
        let slope = cov / var;
        Some((mean_y + slope * (frame_index as f64 - mean_t)) as f32)
    }

    /// Full stillness window whose vertical spread stays within the release tolerance.
    fn is_still(&self) -> bool {
        if !self.recent.is_full() {
            return false;
        }
        let (lo, hi) = self
            .recent
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
        hi - lo <= self.release_threshold_px
    }

    /// Contact state as of `frame_index`: the latest sample taken at or before it.
    pub fn state_at(&self, frame_index: u64) -> Option<ContactSample> {
        self.history
            .iter()
            .rev()
            .find(|s| s.frame_index <= frame_index)
            .copied()
    }

    pub fn latest(&self) -> Option<ContactSample> {
        self.history.last().copied()
    }
}
