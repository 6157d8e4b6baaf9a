// src/lib.rs
//
// Slalom crossing analyzer. Feed classified cone / wheel detections one frame
// at a time into `SlalomPipeline`; it tracks objects, detects cone crossings,
// judges each crossing by the other skate's ground contact and keeps running
// statistics.

pub mod analysis;
pub mod config;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod stream;
pub mod types;

pub use detector::{ConfidenceGate, Detector, RecordedDetector, RecordedFrame};
pub use error::{ConfigError, PipelineError};
pub use pipeline::{FrameOutput, PipelineEvent, SlalomPipeline, Stats};
pub use types::{AnalyzerConfig, Config, Detection, ObjectLabel, Point};
