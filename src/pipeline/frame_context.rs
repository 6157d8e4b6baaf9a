// src/pipeline/frame_context.rs
//
// Everything one processed frame produced, in one place. Renderers and the
// report writer read this instead of reaching into tracker state, which will
// have moved on by the time they run.

use serde::Serialize;

use crate::analysis::crossing_detector::CrossingEvent;
use crate::analysis::object_tracker::{left_right_skates, TrackedObject};
use crate::analysis::technique_analyzer::Verdict;
use crate::analysis::travel_direction::TravelAxis;
use crate::pipeline::stats::Stats;
use crate::types::{ObjectLabel, Point};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub id: u32,
    pub label: ObjectLabel,
    pub centroid: Point,
    pub bbox: [f32; 4],
    pub missed_frames: u32,
    /// Wheels only
    pub grounded: Option<bool>,
}

impl From<&TrackedObject> for TrackSnapshot {
    fn from(t: &TrackedObject) -> Self {
        Self {
            id: t.id,
            label: t.label,
            centroid: t.centroid(),
            bbox: t.bbox,
            missed_frames: t.missed_frame_count,
            grounded: t.grounded(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutput {
    pub frame_index: u64,
    pub tracks: Vec<TrackSnapshot>,
    pub events: Vec<CrossingEvent>,
    pub verdicts: Vec<Verdict>,
    pub travel_axis: TravelAxis,
    /// (left, right) skate ids, smaller x on the left
    pub skate_pair: Option<(u32, u32)>,
    pub stats: Stats,
}

impl FrameOutput {
    pub fn new(frame_index: u64, live: &[TrackedObject], travel_axis: TravelAxis, stats: Stats) -> Self {
        let skates: Vec<&TrackedObject> = live.iter().filter(|t| t.is_skate()).collect();
        let skate_pair = left_right_skates(&skates).map(|(l, r)| (l.id, r.id));
        Self {
            frame_index,
            tracks: live.iter().map(TrackSnapshot::from).collect(),
            events: Vec::new(),
            verdicts: Vec::new(),
            travel_axis,
            skate_pair,
            stats,
        }
    }

    pub fn track(&self, id: u32) -> Option<&TrackSnapshot> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn count(&self, label: ObjectLabel) -> usize {
        self.tracks.iter().filter(|t| t.label == label).count()
    }
}
