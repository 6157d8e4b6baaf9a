// src/pipeline/orchestrator.rs
//
// Per-frame driver. Owns every stateful component and runs them in a fixed
// order, so a given detection stream always produces the same outputs:
//
//   tracker.update → direction.update → crossing.set_axis → crossing.observe
//     → technique.evaluate (per event) → stats.record
//
// Nothing here touches pixels or files; callers feed classified detections.

use std::time::Instant;
use tracing::{debug, info};

use crate::analysis::crossing_detector::CrossingDetector;
use crate::analysis::object_tracker::{ObjectTracker, TrackedObject};
use crate::analysis::technique_analyzer::TechniqueAnalyzer;
use crate::analysis::travel_direction::{TravelAxis, TravelDirectionEstimator};
use crate::error::{ConfigError, PipelineError};
use crate::pipeline::event_bus::{EventBus, PipelineEvent};
use crate::pipeline::frame_context::FrameOutput;
use crate::pipeline::metrics::PipelineMetrics;
use crate::pipeline::stats::{Stats, StatsAggregator};
use crate::types::{AnalyzerConfig, Detection};

const EVENT_BUS_CAPACITY: usize = 1024;

pub struct SlalomPipeline {
    tracker: ObjectTracker,
    direction: TravelDirectionEstimator,
    crossing: CrossingDetector,
    technique: TechniqueAnalyzer,
    stats: StatsAggregator,
    events: EventBus,
    metrics: PipelineMetrics,
    last_frame: Option<u64>,
}

impl SlalomPipeline {
    /// Validates the configuration; nothing is built from a bad one.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "pipeline ready: match {:.0}px, miss tolerance {} frames, cooldown {} frames, lift {:.0}px / release {:.0}px",
            config.tracker.max_match_distance_px,
            config.tracker.max_missed_frames,
            config.crossing.cooldown_frames,
            config.ground.lift_threshold_px,
            config.ground.release_threshold_px
        );
        Ok(Self {
            tracker: ObjectTracker::new(config.tracker.clone(), config.ground.clone()),
            direction: TravelDirectionEstimator::new(config.direction.clone()),
            crossing: CrossingDetector::new(config.crossing.clone()),
            technique: TechniqueAnalyzer::new(),
            stats: StatsAggregator::new(),
            events: EventBus::new(EVENT_BUS_CAPACITY),
            metrics: PipelineMetrics::new(),
            last_frame: None,
        })
    }

    /// Run one frame through the whole chain. Frame indices must be strictly
    /// increasing; an out-of-order frame is rejected before any state changes.
    pub fn process_frame(
        &mut self,
        frame_index: u64,
        detections: &[Detection],
    ) -> Result<FrameOutput, PipelineError> {
        if let Some(last) = self.last_frame {
            if frame_index <= last {
                return Err(PipelineError::OutOfOrderFrame {
                    last,
                    got: frame_index,
                });
            }
        }
        self.last_frame = Some(frame_index);
        let started = Instant::now();

        // ── 1. Tracking ──
        let ids_before = self.tracker.ids_issued();
        let discarded_before = self.tracker.discarded_count();
        self.tracker.update(frame_index, detections);

        let created = self.tracker.ids_issued() - ids_before;
        let discarded = self.tracker.discarded_count() - discarded_before;
        self.metrics.add(&self.metrics.total_detections, detections.len() as u64);
        self.metrics.add(&self.metrics.discarded_detections, discarded as u64);
        self.metrics.add(&self.metrics.tracks_created, created as u64);

        for track in self.tracker.live_objects() {
            if track.first_seen_frame == frame_index {
                self.events.publish(PipelineEvent::TrackStarted {
                    frame_index,
                    track_id: track.id,
                    label: track.label,
                });
            }
        }
        for &track_id in self.tracker.dropped_last_update() {
            self.metrics.inc(&self.metrics.tracks_lost);
            self.events.publish(PipelineEvent::TrackLost {
                frame_index,
                track_id,
            });
        }

        // ── 2. Travel direction ──
        let skates = self.tracker.skates();
        if self.direction.update(&skates) {
            self.metrics.inc(&self.metrics.axis_switches);
            self.events.publish(PipelineEvent::TravelAxisChanged {
                frame_index,
                axis: self.direction.axis(),
            });
        }
        self.crossing.set_axis(self.direction.axis());

        // ── 3. Crossings ──
        let cones = self.tracker.cones();
        let crossing_events = self.crossing.observe(frame_index, &cones, &skates);
        self.metrics.set(&self.metrics.crossings_emitted, self.crossing.emitted_count());
        self.metrics
            .set(&self.metrics.crossings_suppressed, self.crossing.suppressed_count());

        // ── 4. Technique + stats ──
        let live: &[TrackedObject] = self.tracker.live_objects();
        let mut verdicts = Vec::with_capacity(crossing_events.len());
        for event in &crossing_events {
            let other_state = TechniqueAnalyzer::other_skate_state(event, live);
            let verdict = self.technique.evaluate(event, other_state);
            self.stats.record(&verdict);
            self.events.publish(PipelineEvent::CrossingDetected(event.clone()));
            self.events.publish(PipelineEvent::VerdictIssued(verdict.clone()));
            verdicts.push(verdict);
        }

        let mut output = FrameOutput::new(frame_index, live, self.crossing.axis(), self.stats.snapshot());
        output.events = crossing_events;
        output.verdicts = verdicts;

        self.metrics.inc(&self.metrics.total_frames);
        self.metrics
            .set(&self.metrics.frame_time_us, started.elapsed().as_micros() as u64);

        let frames = self.metrics.total_frames.load(std::sync::atomic::Ordering::Relaxed);
        if frames % 300 == 0 {
            let s = output.stats;
            debug!(
                "frame {}: {} live tracks, {} crossings ({} legal), {:.1} fps",
                frame_index,
                output.tracks.len(),
                s.total_crossings,
                s.legal_crossings,
                self.metrics.fps()
            );
        }

        Ok(output)
    }

    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn travel_axis(&self) -> TravelAxis {
        self.direction.axis()
    }

    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.events.drain()
    }
}
