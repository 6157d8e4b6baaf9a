// src/pipeline/mod.rs

pub mod event_bus;
pub mod frame_context;
pub mod metrics;
pub mod orchestrator;
pub mod stats;

pub use event_bus::{EventBus, PipelineEvent};
pub use frame_context::{FrameOutput, TrackSnapshot};
pub use metrics::{MetricsSummary, PipelineMetrics};
pub use orchestrator::SlalomPipeline;
pub use stats::{Stats, StatsAggregator};
