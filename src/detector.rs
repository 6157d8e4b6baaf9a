// src/detector.rs
//
// Detector seam. The analyzer only needs already-classified boxes; where they
// come from (colour thresholding, a learned model, a recording) is behind the
// `Detector` trait. The core enforces no confidence floor, so filtering lives
// here as a wrapping stage.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Detection, ObjectLabel};

pub trait Detector {
    type Frame;

    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<Detection>>;
}

// ============================================================================
// RECORDED DETECTIONS
// ============================================================================

/// One line of a `.jsonl` detection stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Absent in some recordings; the reader then numbers frames itself
    #[serde(default)]
    pub frame: Option<u64>,
    #[serde(default)]
    pub detections: Vec<RecordedDetection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetection {
    #[serde(alias = "label", alias = "class_name")]
    pub class: String,
    /// [x1, y1, x2, y2]
    pub bbox: [f32; 4],
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

/// What a recorded class name stands for. Colour-based recordings report
/// individual wheels; learned detectors report whole skates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedClass {
    Cone,
    Wheel,
    Skate,
}

/// Unknown classes are not part of the course and map to `None`.
pub fn classify(class: &str) -> Option<RecordedClass> {
    match class.trim().to_ascii_lowercase().as_str() {
        "cone" | "traffic cone" => Some(RecordedClass::Cone),
        "wheel" => Some(RecordedClass::Wheel),
        "skate" | "sports equipment" => Some(RecordedClass::Skate),
        _ => None,
    }
}

pub struct RecordedDetector {
    grouper: WheelGrouper,
    ignored: u64,
    stray_wheels: u64,
}

impl Default for RecordedDetector {
    fn default() -> Self {
        Self::new(WheelGroupingConfig::default())
    }
}

impl RecordedDetector {
    pub fn new(grouping: WheelGroupingConfig) -> Self {
        Self {
            grouper: WheelGrouper::new(grouping),
            ignored: 0,
            stray_wheels: 0,
        }
    }

    /// Recorded boxes dropped for carrying an unknown class.
    pub fn ignored_count(&self) -> u64 {
        self.ignored
    }

    /// Wheel boxes that could not be grouped into a skate.
    pub fn stray_wheel_count(&self) -> u64 {
        self.stray_wheels
    }
}

impl Detector for RecordedDetector {
    type Frame = RecordedFrame;

    fn detect(&mut self, frame: &RecordedFrame) -> Result<Vec<Detection>> {
        let mut out = Vec::with_capacity(frame.detections.len());
        let mut wheels = Vec::new();
        for rec in &frame.detections {
            match classify(&rec.class) {
                Some(RecordedClass::Cone) => {
                    out.push(Detection::new(ObjectLabel::Cone, rec.bbox, rec.confidence))
                }
                Some(RecordedClass::Skate) => {
                    out.push(Detection::new(ObjectLabel::Wheel, rec.bbox, rec.confidence))
                }
                Some(RecordedClass::Wheel) => {
                    wheels.push(Detection::new(ObjectLabel::Wheel, rec.bbox, rec.confidence))
                }
                None => {
                    self.ignored += 1;
                    debug!("ignoring recorded class '{}'", rec.class);
                }
            }
        }

        if !wheels.is_empty() {
            let grouped = self.grouper.group(&wheels);
            self.stray_wheels += grouped.stray as u64;
            out.extend(grouped.skates);
        }
        Ok(out)
    }
}

// ============================================================================
// WHEEL GROUPING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelGroupingConfig {
    /// Centroid distance (px) between neighbouring wheels of one skate
    pub max_wheel_distance_px: f32,
    /// Groups with fewer wheels are not skates
    pub min_wheels_per_skate: usize,
    /// Extend the skate box upward by its own height to cover the boot
    pub include_boot: bool,
}

impl Default for WheelGroupingConfig {
    fn default() -> Self {
        Self {
            max_wheel_distance_px: 100.0,
            min_wheels_per_skate: 2,
            include_boot: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct GroupedWheels {
    pub skates: Vec<Detection>,
    /// Wheels left in groups too small to be a skate
    pub stray: usize,
}

/// Merges wheel boxes into one detection per skate, so the tracker never
/// mistakes two wheels of the same skate for the left and right skates.
///
/// Wheels are swept left to right; each joins the current group when its
/// centroid is within `max_wheel_distance_px` of the previous wheel.
pub struct WheelGrouper {
    config: WheelGroupingConfig,
}

impl WheelGrouper {
    pub fn new(config: WheelGroupingConfig) -> Self {
        Self { config }
    }

    pub fn group(&self, wheels: &[Detection]) -> GroupedWheels {
        let mut sorted: Vec<&Detection> = wheels.iter().collect();
        sorted.sort_by(|a, b| a.bbox[0].total_cmp(&b.bbox[0]));

        let mut result = GroupedWheels::default();
        let mut current: Vec<&Detection> = Vec::new();
        for wheel in sorted {
            if let Some(last) = current.last() {
                if last.centroid.distance(&wheel.centroid) >= self.config.max_wheel_distance_px {
                    self.close_group(&current, &mut result);
                    current.clear();
                }
            }
            current.push(wheel);
        }
        self.close_group(&current, &mut result);
        result
    }

    fn close_group(&self, group: &[&Detection], result: &mut GroupedWheels) {
        if group.is_empty() {
            return;
        }
        if group.len() < self.config.min_wheels_per_skate {
            result.stray += group.len();
            return;
        }

        let mut bbox = [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY];
        for w in group {
            bbox[0] = bbox[0].min(w.bbox[0]);
            bbox[1] = bbox[1].min(w.bbox[1]);
            bbox[2] = bbox[2].max(w.bbox[2]);
            bbox[3] = bbox[3].max(w.bbox[3]);
        }
        if self.config.include_boot {
            bbox[1] = (bbox[1] - (bbox[3] - bbox[1])).max(0.0);
        }
        let confidence = group.iter().map(|w| w.confidence).sum::<f32>() / group.len() as f32;
        result.skates.push(Detection::new(ObjectLabel::Wheel, bbox, confidence));
    }
}

// ============================================================================
// CONFIDENCE GATE
// ============================================================================

/// Drops detections below `min_confidence` before they reach the tracker.
pub struct ConfidenceGate<D> {
    inner: D,
    min_confidence: f32,
    rejected: u64,
}

impl<D: Detector> ConfidenceGate<D> {
    pub fn new(inner: D, min_confidence: f32) -> Self {
        Self {
            inner,
            min_confidence,
            rejected: 0,
        }
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Detector> Detector for ConfidenceGate<D> {
    type Frame = D::Frame;

    fn detect(&mut self, frame: &D::Frame) -> Result<Vec<Detection>> {
        let mut detections = self.inner.detect(frame)?;
        let before = detections.len();
        detections.retain(|d| d.confidence >= self.min_confidence);
        self.rejected += (before - detections.len()) as u64;
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(class: &str, confidence: f32) -> RecordedDetection {
        RecordedDetection {
            class: class.to_string(),
            bbox: [0.0, 0.0, 10.0, 20.0],
            confidence,
        }
    }

    #[test]
    fn test_class_mapping() {
        assert_eq!(classify("cone"), Some(RecordedClass::Cone));
        assert_eq!(classify("Traffic Cone"), Some(RecordedClass::Cone));
        assert_eq!(classify("wheel"), Some(RecordedClass::Wheel));
        assert_eq!(classify("sports equipment"), Some(RecordedClass::Skate));
        assert_eq!(classify("skate"), Some(RecordedClass::Skate));
        assert_eq!(classify("person"), None);
    }

    #[test]
    fn test_recorded_detector_ignores_unknown_classes() {
        let frame = RecordedFrame {
            frame: Some(3),
            detections: vec![rec("cone", 0.9), rec("person", 0.9), rec("skate", 0.8)],
        };
        let mut detector = RecordedDetector::default();
        let dets = detector.detect(&frame).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].label, ObjectLabel::Cone);
        assert_eq!(dets[1].label, ObjectLabel::Wheel);
        assert_eq!(dets[1].centroid.x, 5.0);
        assert_eq!(dets[1].centroid.y, 10.0);
        assert_eq!(detector.ignored_count(), 1);
    }

    #[test]
    fn test_confidence_gate_filters_low_scores() {
        let frame = RecordedFrame {
            frame: None,
            detections: vec![rec("cone", 0.3), rec("skate", 0.5), rec("skate", 0.95)],
        };
        let mut gated = ConfidenceGate::new(RecordedDetector::default(), 0.5);
        let dets = gated.detect(&frame).unwrap();
        assert_eq!(dets.len(), 2);
        assert!(dets.iter().all(|d| d.label == ObjectLabel::Wheel));
        assert_eq!(gated.rejected_count(), 1);
    }

    #[test]
    fn test_recorded_frame_parses_aliases_and_defaults() {
        let line = r#"{"detections":[{"label":"cone","bbox":[1,2,3,4]}]}"#;
        let frame: RecordedFrame = serde_json::from_str(line).unwrap();
        assert_eq!(frame.frame, None);
        assert_eq!(frame.detections[0].class, "cone");
        assert_eq!(frame.detections[0].confidence, 1.0);
    }

    fn wheel_at(class: &str, cx: f32, cy: f32) -> RecordedDetection {
        RecordedDetection {
            class: class.to_string(),
            bbox: [cx - 8.0, cy - 8.0, cx + 8.0, cy + 8.0],
            confidence: 0.8,
        }
    }

    #[test]
    fn test_four_wheels_become_two_skates() {
        let frame = RecordedFrame {
            frame: Some(0),
            detections: vec![
                wheel_at("wheel", 330.0, 400.0),
                wheel_at("wheel", 100.0, 400.0),
                wheel_at("wheel", 300.0, 402.0),
                wheel_at("wheel", 130.0, 400.0),
            ],
        };
        let mut detector = RecordedDetector::default();
        let dets = detector.detect(&frame).unwrap();

        assert_eq!(dets.len(), 2);
        assert!(dets.iter().all(|d| d.label == ObjectLabel::Wheel));
        // Union of both wheels, extended upward by its own height
        assert_eq!(dets[0].bbox, [92.0, 376.0, 138.0, 408.0]);
        assert_eq!(dets[1].bbox, [292.0, 374.0, 338.0, 410.0]);
        assert_eq!(detector.stray_wheel_count(), 0);
    }

    #[test]
    fn test_lone_wheel_is_not_a_skate() {
        let frame = RecordedFrame {
            frame: None,
            detections: vec![
                wheel_at("wheel", 100.0, 400.0),
                wheel_at("wheel", 120.0, 400.0),
                wheel_at("wheel", 500.0, 400.0),
                wheel_at("skate", 800.0, 400.0),
            ],
        };
        let mut detector = RecordedDetector::default();
        let dets = detector.detect(&frame).unwrap();

        assert_eq!(dets.len(), 2);
        // Skate-level boxes pass through untouched
        assert_eq!(dets[0].bbox, [792.0, 392.0, 808.0, 408.0]);
        assert_eq!(dets[1].centroid.x, 110.0);
        assert_eq!(detector.stray_wheel_count(), 1);
    }

    #[test]
    fn test_grouping_without_boot_keeps_wheel_extent() {
        let grouper = WheelGrouper::new(WheelGroupingConfig {
            include_boot: false,
            ..WheelGroupingConfig::default()
        });
        let wheels = [
            Detection::new(ObjectLabel::Wheel, [0.0, 10.0, 10.0, 20.0], 0.6),
            Detection::new(ObjectLabel::Wheel, [20.0, 12.0, 30.0, 22.0], 1.0),
        ];
        let grouped = grouper.group(&wheels);
        assert_eq!(grouped.skates.len(), 1);
        assert_eq!(grouped.skates[0].bbox, [0.0, 10.0, 30.0, 22.0]);
        assert!((grouped.skates[0].confidence - 0.8).abs() < 1e-6);
    }
}
