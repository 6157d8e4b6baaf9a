// src/pipeline/metrics.rs
//
// Processing counters for logs and the run report. Separate from Stats:
// these describe how the pipeline ran, not how the skater performed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub total_detections: Arc<AtomicU64>,
    pub discarded_detections: Arc<AtomicU64>,
    pub tracks_created: Arc<AtomicU64>,
    pub tracks_lost: Arc<AtomicU64>,
    pub crossings_emitted: Arc<AtomicU64>,
    pub crossings_suppressed: Arc<AtomicU64>,
    pub axis_switches: Arc<AtomicU64>,
    pub frame_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            total_detections: Arc::new(AtomicU64::new(0)),
            discarded_detections: Arc::new(AtomicU64::new(0)),
            tracks_created: Arc::new(AtomicU64::new(0)),
            tracks_lost: Arc::new(AtomicU64::new(0)),
            crossings_emitted: Arc::new(AtomicU64::new(0)),
            crossings_suppressed: Arc::new(AtomicU64::new(0)),
            axis_switches: Arc::new(AtomicU64::new(0)),
            frame_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set(&self, counter: &AtomicU64, value: u64) {
        counter.store(value, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            fps: self.fps(),
            total_detections: self.total_detections.load(Ordering::Relaxed),
            discarded_detections: self.discarded_detections.load(Ordering::Relaxed),
            tracks_created: self.tracks_created.load(Ordering::Relaxed),
            tracks_lost: self.tracks_lost.load(Ordering::Relaxed),
            crossings_emitted: self.crossings_emitted.load(Ordering::Relaxed),
            crossings_suppressed: self.crossings_suppressed.load(Ordering::Relaxed),
            axis_switches: self.axis_switches.load(Ordering::Relaxed),
            last_frame_us: self.frame_time_us.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub total_detections: u64,
    pub discarded_detections: u64,
    pub tracks_created: u64,
    pub tracks_lost: u64,
    pub crossings_emitted: u64,
    pub crossings_suppressed: u64,
    pub axis_switches: u64,
    pub last_frame_us: u64,
    pub elapsed_secs: f64,
}
