// src/analysis/crossing_detector.rs
//
// Cone crossing detection.
//
// Every cone carries a crossing line through its centroid, perpendicular to
// the travel axis. For each (cone, skate) pair we remember which side of that
// line the skate was on at its last observation. A side flip is a crossing.
//
//   - First observation of a pair only records the side (no event)
//   - A centroid exactly on the line has no side and changes nothing
//   - Only skates matched this frame are evaluated; a coasting skate keeps a
//     stale centroid and can never flip
//   - Pairs whose cone or skate left the live set are forgotten, so a skate
//     lost at the line produces no event and its successor id starts fresh
//   - After a pair fires, further flips inside `cooldown_frames` are
//     suppressed (jitter at the line). The recorded side still follows the
//     skate so a suppressed flip cannot fire later.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use super::object_tracker::TrackedObject;
use super::travel_direction::TravelAxis;
use crate::types::Point;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingConfig {
    /// Frames after an event during which the same pair cannot fire again
    pub cooldown_frames: u64,
    /// When set, a flip only counts if the skate passes within this distance
    /// of the cone along the crossing line (or within the cone's height,
    /// whichever is larger). Unset = any flip counts.
    pub max_lateral_distance_px: Option<f32>,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            cooldown_frames: 5,
            max_lateral_distance_px: None,
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Negative,
    Positive,
}

impl Side {
    /// `None` when the point sits exactly on the line.
    pub fn of(offset: f32) -> Option<Self> {
        if offset > 0.0 {
            Some(Self::Positive)
        } else if offset < 0.0 {
            Some(Self::Negative)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "NEG",
            Self::Positive => "POS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossingEvent {
    pub frame_index: u64,
    pub cone_id: u32,
    pub crossing_skate_id: u32,
    /// The skate that must be lifted; `None` if no other skate is tracked
    pub other_skate_id: Option<u32>,
    pub side_before: Side,
    pub side_after: Side,
    pub travel_axis: TravelAxis,
    pub cone_position: Point,
    pub skate_position: Point,
}

#[derive(Debug, Clone, Copy, Default)]
struct PairState {
    side: Option<Side>,
    last_event_frame: Option<u64>,
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct CrossingDetector {
    config: CrossingConfig,
    axis: TravelAxis,
    pairs: HashMap<(u32, u32), PairState>,
    emitted: u64,
    suppressed: u64,
}

impl CrossingDetector {
    pub fn new(config: CrossingConfig) -> Self {
        Self {
            config,
            axis: TravelAxis::Horizontal,
            pairs: HashMap::new(),
            emitted: 0,
            suppressed: 0,
        }
    }

    pub fn axis(&self) -> TravelAxis {
        self.axis
    }

    /// Re-orient all crossing lines. Recorded sides refer to the old
    /// orientation and are forgotten; cooldowns are kept.
    pub fn set_axis(&mut self, axis: TravelAxis) {
        if axis == self.axis {
            return;
        }
        debug!(
            "crossing lines re-oriented to {}; forgetting {} recorded side(s)",
            axis.as_str(),
            self.pairs.len()
        );
        for state in self.pairs.values_mut() {
            state.side = None;
        }
        self.axis = axis;
    }

    /// Compare every (cone, skate) pair against its previous side.
    /// Events come out ordered by cone id, then skate id.
    pub fn observe(
        &mut self,
        frame_index: u64,
        cones: &[&TrackedObject],
        skates: &[&TrackedObject],
    ) -> Vec<CrossingEvent> {
        let live_cones: HashSet<u32> = cones.iter().map(|c| c.id).collect();
        let live_skates: HashSet<u32> = skates.iter().map(|s| s.id).collect();
        self.pairs
            .retain(|(cone_id, skate_id), _| live_cones.contains(cone_id) && live_skates.contains(skate_id));

        let mut cones: Vec<&TrackedObject> = cones.to_vec();
        cones.sort_by_key(|c| c.id);
        let mut skates: Vec<&TrackedObject> = skates.to_vec();
        skates.sort_by_key(|s| s.id);

        let axis = self.axis;
        let mut events = Vec::new();

        for cone in &cones {
            let cone_pos = cone.centroid();
            for skate in &skates {
                if !skate.seen_this_frame() {
                    continue;
                }
                let skate_pos = skate.centroid();
                let Some(side) = Side::of(axis.offset_across(cone_pos, skate_pos)) else {
                    continue;
                };

                let state = self.pairs.entry((cone.id, skate.id)).or_default();
                let previous = state.side.replace(side);
                let side_before = match previous {
                    Some(prev) if prev != side => prev,
                    _ => continue,
                };

                if let Some(max_lateral) = self.config.max_lateral_distance_px {
                    let gate = max_lateral.max(cone.height());
                    let along = axis.offset_along(cone_pos, skate_pos);
                    if along > gate {
                        debug!(
                            "frame {}: skate {} flipped cone {} line {:.0}px away (gate {:.0}px), ignored",
                            frame_index, skate.id, cone.id, along, gate
                        );
                        continue;
                    }
                }

                if let Some(last) = state.last_event_frame {
                    if frame_index.saturating_sub(last) <= self.config.cooldown_frames {
                        self.suppressed += 1;
                        debug!(
                            "frame {}: cone {} / skate {} flip suppressed ({} frames after last event)",
                            frame_index,
                            cone.id,
                            skate.id,
                            frame_index.saturating_sub(last)
                        );
                        continue;
                    }
                }
                state.last_event_frame = Some(frame_index);

                let other_skate_id = resolve_other_skate(&skates, skate.id);
                info!(
                    "crossing at frame {}: skate {} passed cone {} ({} -> {}), other skate {:?}",
                    frame_index,
                    skate.id,
                    cone.id,
                    side_before.as_str(),
                    side.as_str(),
                    other_skate_id
                );
                self.emitted += 1;
                events.push(CrossingEvent {
                    frame_index,
                    cone_id: cone.id,
                    crossing_skate_id: skate.id,
                    other_skate_id,
                    side_before,
                    side_after: side,
                    travel_axis: axis,
                    cone_position: cone_pos,
                    skate_position: skate_pos,
                });
            }
        }

        events
    }

    pub fn emitted_count(&self) -> u64 {
        self.emitted
    }

    pub fn suppressed_count(&self) -> u64 {
        self.suppressed
    }

    pub fn tracked_pairs(&self) -> usize {
        self.pairs.len()
    }
}

/// The live skate with the fewest missed frames, excluding the crossing one.
/// Ties go to the lowest id.
fn resolve_other_skate(skates: &[&TrackedObject], crossing_id: u32) -> Option<u32> {
    skates
        .iter()
        .filter(|s| s.id != crossing_id)
        .min_by_key(|s| (s.missed_frame_count, s.id))
        .map(|s| s.id)
}
