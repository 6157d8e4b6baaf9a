use serde::{Deserialize, Serialize};

use crate::analysis::crossing_detector::CrossingConfig;
use crate::analysis::ground_contact::GroundContactConfig;
use crate::analysis::object_tracker::TrackerConfig;
use crate::analysis::travel_direction::DirectionConfig;
use crate::detector::WheelGroupingConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub input: InputConfig,
    pub grouping: WheelGroupingConfig,
    pub logging: LoggingConfig,
}

/// Everything the core pipeline consumes. Validated before the first frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub tracker: TrackerConfig,
    pub ground: GroundContactConfig,
    pub crossing: CrossingConfig,
    pub direction: DirectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub input_dir: String,
    pub output_dir: String,
    /// Detections below this confidence are dropped before tracking.
    pub min_confidence: f32,
    /// Frames buffered between the stream reader and the analyzer.
    pub queue_capacity: usize,
    pub write_report: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_dir: "detections".to_string(),
            output_dir: "output".to_string(),
            min_confidence: 0.5,
            queue_capacity: 64,
            write_report: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "slalom_analyzer=info".to_string(),
        }
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ============================================================================
// DETECTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectLabel {
    Cone,
    Wheel,
}

impl ObjectLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cone => "cone",
            Self::Wheel => "wheel",
        }
    }
}

/// One classified blob from one frame. Consumed once by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub label: ObjectLabel,
    /// [x1, y1, x2, y2] pixels
    pub bbox: [f32; 4],
    pub centroid: Point,
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: ObjectLabel, bbox: [f32; 4], confidence: f32) -> Self {
        Self {
            label,
            bbox,
            centroid: Point::new((bbox[0] + bbox[2]) * 0.5, (bbox[1] + bbox[3]) * 0.5),
            confidence,
        }
    }

    pub fn width(&self) -> f32 {
        self.bbox[2] - self.bbox[0]
    }

    pub fn height(&self) -> f32 {
        self.bbox[3] - self.bbox[1]
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Zero-area or non-finite geometry. Such detections never reach matching.
    pub fn is_degenerate(&self) -> bool {
        if self.bbox.iter().any(|v| !v.is_finite()) || !self.confidence.is_finite() {
            return true;
        }
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_centroid_is_bbox_center() {
        let d = Detection::new(ObjectLabel::Cone, [10.0, 20.0, 30.0, 60.0], 0.9);
        assert_eq!(d.centroid, Point::new(20.0, 40.0));
        assert_eq!(d.area(), 800.0);
    }

    #[test]
    fn test_degenerate_geometry() {
        assert!(Detection::new(ObjectLabel::Wheel, [5.0, 5.0, 5.0, 20.0], 0.9).is_degenerate());
        assert!(Detection::new(ObjectLabel::Wheel, [5.0, 5.0, 2.0, 20.0], 0.9).is_degenerate());
        assert!(Detection::new(ObjectLabel::Wheel, [f32::NAN, 5.0, 9.0, 20.0], 0.9).is_degenerate());
        assert!(Detection::new(ObjectLabel::Wheel, [0.0, 0.0, 9.0, 9.0], f32::NAN).is_degenerate());
        assert!(!Detection::new(ObjectLabel::Wheel, [0.0, 0.0, 9.0, 9.0], 0.0).is_degenerate());
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&ObjectLabel::Wheel).unwrap();
        assert_eq!(json, "\"wheel\"");
    }
}
