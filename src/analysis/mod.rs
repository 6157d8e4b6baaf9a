// src/analysis/mod.rs
//
// Crossing analysis modules.
//
// Signal flow (one frame at a time):
//   Detections → object_tracker ─┬→ travel_direction ─┐
//                                └────────────────────┴→ crossing_detector → technique_analyzer → Verdict
//   Wheel tracks → ground_contact (inside object_tracker)
//
// Orchestrated by pipeline::SlalomPipeline.

pub mod crossing_detector;
pub mod ground_contact;
pub mod object_tracker;
pub mod ring_buffer;
pub mod technique_analyzer;
pub mod travel_direction;

pub use crossing_detector::{CrossingConfig, CrossingDetector, CrossingEvent, Side};
pub use ground_contact::{ContactSample, GroundContact, GroundContactConfig};
pub use object_tracker::{left_right_skates, ObjectTracker, TrackedObject, TrackerConfig};
pub use ring_buffer::RingBuffer;
pub use technique_analyzer::{CrossingStatus, TechniqueAnalyzer, Verdict};
pub use travel_direction::{DirectionConfig, TravelAxis, TravelDirectionEstimator};
