// src/analysis/technique_analyzer.rs
//
// Legality of a single crossing: while one skate passes the cone the other
// must be off the ground. The other skate's contact state is read as of the
// event frame, so evaluation may lag the event without changing the result.
// A crossing whose other skate cannot be resolved is still judged (illegal,
// indeterminate evidence) so statistics account for every crossing.

use serde::Serialize;
use tracing::{info, warn};

use super::crossing_detector::CrossingEvent;
use super::ground_contact::ContactSample;
use super::object_tracker::TrackedObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrossingStatus {
    Legal,
    Illegal,
}

impl CrossingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legal => "LEGAL",
            Self::Illegal => "ILLEGAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub event: CrossingEvent,
    pub legal: bool,
    /// `None` when the other skate could not be resolved at the event frame
    pub other_skate_grounded_at_event: Option<bool>,
}

impl Verdict {
    pub fn is_indeterminate(&self) -> bool {
        self.other_skate_grounded_at_event.is_none()
    }

    pub fn status(&self) -> CrossingStatus {
        if self.legal {
            CrossingStatus::Legal
        } else {
            CrossingStatus::Illegal
        }
    }
}

#[derive(Default)]
pub struct TechniqueAnalyzer;

impl TechniqueAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the other skate's contact state as of the event frame.
    pub fn other_skate_state(event: &CrossingEvent, live: &[TrackedObject]) -> Option<ContactSample> {
        let other_id = event.other_skate_id?;
        live.iter()
            .find(|t| t.id == other_id)
            .and_then(|t| t.contact_at(event.frame_index))
    }

    pub fn evaluate(&self, event: &CrossingEvent, other_state: Option<ContactSample>) -> Verdict {
        let other_grounded = other_state
            .filter(|s| s.frame_index <= event.frame_index)
            .map(|s| s.grounded);

        let legal = matches!(other_grounded, Some(false));

        match other_grounded {
            None => {
                warn!(
                    "crossing at frame {} (cone {}, skate {}): other skate unresolved, counted ILLEGAL",
                    event.frame_index, event.cone_id, event.crossing_skate_id
                );
            }
            Some(grounded) => {
                info!(
                    "crossing at frame {} (cone {}, skate {}): other skate {:?} {} -> {}",
                    event.frame_index,
                    event.cone_id,
                    event.crossing_skate_id,
                    event.other_skate_id,
                    if grounded { "grounded" } else { "lifted" },
                    if legal { "LEGAL" } else { "ILLEGAL" }
                );
            }
        }

        Verdict {
            event: event.clone(),
            legal,
            other_skate_grounded_at_event: other_grounded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::crossing_detector::Side;
    use crate::analysis::ground_contact::{GroundContact, GroundContactConfig};
    use crate::analysis::travel_direction::TravelAxis;
    use crate::types::Point;

    fn event(frame_index: u64, other: Option<u32>) -> CrossingEvent {
        CrossingEvent {
            frame_index,
            cone_id: 1,
            crossing_skate_id: 2,
            other_skate_id: other,
            side_before: Side::Negative,
            side_after: Side::Positive,
            travel_axis: TravelAxis::Horizontal,
            cone_position: Point::new(300.0, 400.0),
            skate_position: Point::new(301.0, 400.0),
        }
    }

    /// Other-skate contact model fed `y(frame)` for frames 0..30.
    fn contact(y: impl Fn(u64) -> f32) -> GroundContact {
        let mut gc = GroundContact::new(&GroundContactConfig::default());
        for f in 0..30 {
            gc.observe(f, y(f));
        }
        gc
    }

    #[test]
    fn test_grounded_other_skate_is_illegal() {
        let gc = contact(|_| 400.0);
        let analyzer = TechniqueAnalyzer::new();
        let v = analyzer.evaluate(&event(15, Some(3)), gc.state_at(15));
        assert!(!v.legal);
        assert_eq!(v.other_skate_grounded_at_event, Some(true));
        assert_eq!(v.status(), CrossingStatus::Illegal);
    }

    #[test]
    fn test_lifted_other_skate_is_legal() {
        let lift = GroundContactConfig::default().lift_threshold_px;
        let gc = contact(|f| if (8..=15).contains(&f) { 400.0 - lift - 10.0 } else { 400.0 });
        let analyzer = TechniqueAnalyzer::new();
        let v = analyzer.evaluate(&event(11, Some(3)), gc.state_at(11));
        assert!(v.legal);
        assert_eq!(v.other_skate_grounded_at_event, Some(false));
    }

    #[test]
    fn test_evaluation_uses_event_frame_not_latest() {
        let lift = GroundContactConfig::default().lift_threshold_px;
        let gc = contact(|f| if (8..=15).contains(&f) { 400.0 - lift - 10.0 } else { 400.0 });
        // Skate has landed again by frame 29, but the event was at frame 11
        assert_eq!(gc.latest().map(|s| s.grounded), Some(true));
        let analyzer = TechniqueAnalyzer::new();
        assert!(analyzer.evaluate(&event(11, Some(3)), gc.state_at(11)).legal);
    }

    #[test]
    fn test_sample_after_event_frame_is_not_evidence() {
        let mut gc = GroundContact::new(&GroundContactConfig::default());
        gc.observe(20, 400.0);
        let analyzer = TechniqueAnalyzer::new();
        let v = analyzer.evaluate(&event(11, Some(3)), gc.latest());
        assert!(v.is_indeterminate());
    }

    #[test]
    fn test_unresolved_other_skate_is_indeterminate_and_illegal() {
        let analyzer = TechniqueAnalyzer::new();
        let v = analyzer.evaluate(&event(5, None), None);
        assert!(!v.legal);
        assert!(v.is_indeterminate());
        assert_eq!(v.other_skate_grounded_at_event, None);
    }

    #[test]
    fn test_legal_is_not_grounded_when_known() {
        let analyzer = TechniqueAnalyzer::new();
        for grounded in [true, false] {
            let sample = ContactSample {
                frame_index: 7,
                grounded,
                rise_px: 0.0,
            };
            let v = analyzer.evaluate(&event(7, Some(3)), Some(sample));
            assert_eq!(v.legal, !grounded);
        }
    }
}
