// src/analysis/travel_direction.rs
//
// Dominant motion axis of the skater, used to orient every cone's crossing
// line (the line runs through the cone, perpendicular to travel).
//
// Heuristic: sum |dx| and |dy| over the trailing window of every live skate's
// centroid history. The axis only switches when the other axis carries
// `dominance_ratio` times more motion and the window holds at least
// `min_motion_px` of total motion. Reversing along the same axis keeps the
// line orientation, so back-and-forth runs need no special handling.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::object_tracker::TrackedObject;
use crate::types::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    /// Trailing frames of centroid history considered
    pub window_frames: usize,
    /// Motion on the other axis must exceed the current axis by this factor
    pub dominance_ratio: f32,
    /// Total motion (px) required before a switch is considered
    pub min_motion_px: f32,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            window_frames: 15,
            dominance_ratio: 1.5,
            min_motion_px: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelAxis {
    /// Skater moves left/right in the image; crossing lines are vertical
    Horizontal,
    /// Skater moves up/down in the image; crossing lines are horizontal
    Vertical,
}

impl TravelAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "HORIZONTAL",
            Self::Vertical => "VERTICAL",
        }
    }

    /// Signed offset of `p` from the crossing line through `origin`, measured
    /// along the direction of travel.
    pub fn offset_across(&self, origin: Point, p: Point) -> f32 {
        match self {
            Self::Horizontal => p.x - origin.x,
            Self::Vertical => p.y - origin.y,
        }
    }

    /// Distance of `p` from `origin` measured along the crossing line.
    pub fn offset_along(&self, origin: Point, p: Point) -> f32 {
        match self {
            Self::Horizontal => (p.y - origin.y).abs(),
            Self::Vertical => (p.x - origin.x).abs(),
        }
    }
}

pub struct TravelDirectionEstimator {
    config: DirectionConfig,
    axis: TravelAxis,
}

impl TravelDirectionEstimator {
    pub fn new(config: DirectionConfig) -> Self {
        Self {
            config,
            axis: TravelAxis::Horizontal,
        }
    }

    pub fn axis(&self) -> TravelAxis {
        self.axis
    }

    /// Re-estimate from the live skates. Returns true when the axis switched.
    pub fn update(&mut self, skates: &[&TrackedObject]) -> bool {
        let (mx, my) = self.window_motion(skates);

        if mx + my < self.config.min_motion_px {
            return false;
        }

        let ratio = self.config.dominance_ratio;
        let next = match self.axis {
            TravelAxis::Horizontal if my > mx * ratio => TravelAxis::Vertical,
            TravelAxis::Vertical if mx > my * ratio => TravelAxis::Horizontal,
            current => current,
        };

        if next != self.axis {
            info!(
                "travel axis {} -> {} (|dx|={:.1}, |dy|={:.1})",
                self.axis.as_str(),
                next.as_str(),
                mx,
                my
            );
            self.axis = next;
            return true;
        }
        false
    }

    fn window_motion(&self, skates: &[&TrackedObject]) -> (f32, f32) {
        let mut mx = 0.0;
        let mut my = 0.0;
        for skate in skates {
            let history = &skate.centroid_history;
            let take = history.len().min(self.config.window_frames + 1);
            let skip = history.len() - take;
            let mut prev: Option<Point> = None;
            for p in history.iter().skip(skip) {
                if let Some(q) = prev {
                    mx += (p.x - q.x).abs();
                    my += (p.y - q.y).abs();
                }
                prev = Some(*p);
            }
        }
        (mx, my)
    }
}
