// src/analysis/object_tracker.rs
//
// Centroid tracker for cones and skate wheels.
//
// Design:
//   - Greedy nearest-centroid matching, same label only (a cone never
//     continues a wheel track)
//   - Candidate pairs ordered by (distance, track id, detection index) so a
//     replay of the same detections always yields the same identities
//   - Tracks coast through brief detection gaps; past `max_missed_frames`
//     they are dropped for good and a reappearing object gets a new id
//   - Wheel tracks carry a ground-contact model updated once per matched frame

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

use super::ground_contact::{ContactSample, GroundContact, GroundContactConfig};
use super::ring_buffer::RingBuffer;
use crate::types::{Detection, ObjectLabel, Point};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum centroid distance (px) for a detection to continue a track
    pub max_match_distance_px: f32,
    /// Frames a track survives without a detection before it is dropped
    pub max_missed_frames: u32,
    /// Centroids kept per track
    pub history_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_match_distance_px: 100.0,
            max_missed_frames: 5,
            history_capacity: 30, // 1s at 30fps
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub id: u32,
    pub label: ObjectLabel,
    pub bbox: [f32; 4],
    pub centroid_history: RingBuffer<Point>,
    pub first_seen_frame: u64,
    pub last_seen_frame: u64,
    pub missed_frame_count: u32,
    /// Present for wheel tracks only
    ground: Option<GroundContact>,
}

impl TrackedObject {
    fn new(
        id: u32,
        det: &Detection,
        frame_index: u64,
        config: &TrackerConfig,
        ground_cfg: &GroundContactConfig,
    ) -> Self {
        let mut centroid_history = RingBuffer::with_capacity(config.history_capacity);
        centroid_history.push(det.centroid);

        let ground = match det.label {
            ObjectLabel::Wheel => {
                let mut gc = GroundContact::new(ground_cfg);
                gc.observe(frame_index, det.centroid.y);
                Some(gc)
            }
            ObjectLabel::Cone => None,
        };

        Self {
            id,
            label: det.label,
            bbox: det.bbox,
            centroid_history,
            first_seen_frame: frame_index,
            last_seen_frame: frame_index,
            missed_frame_count: 0,
            ground,
        }
    }

    /// Most recent known position. Coasting tracks keep their last centroid.
    pub fn centroid(&self) -> Point {
        self.centroid_history.last().copied().unwrap_or_default()
    }

    pub fn is_skate(&self) -> bool {
        self.label == ObjectLabel::Wheel
    }

    pub fn is_cone(&self) -> bool {
        self.label == ObjectLabel::Cone
    }

    /// Matched on the frame passed to the last `update`.
    pub fn seen_this_frame(&self) -> bool {
        self.missed_frame_count == 0
    }

    /// Current ground-contact flag; `None` for cones.
    pub fn grounded(&self) -> Option<bool> {
        self.ground.as_ref().map(GroundContact::is_grounded)
    }

    /// Ground contact as of a past frame, for lagged evaluation.
    pub fn contact_at(&self, frame_index: u64) -> Option<ContactSample> {
        self.ground.as_ref().and_then(|g| g.state_at(frame_index))
    }

    pub fn height(&self) -> f32 {
        (self.bbox[3] - self.bbox[1]).max(0.0)
    }

    fn update_with_detection(&mut self, det: &Detection, frame_index: u64) {
        self.bbox = det.bbox;
        self.centroid_history.push(det.centroid);
        self.last_seen_frame = frame_index;
        self.missed_frame_count = 0;
        if let Some(ground) = self.ground.as_mut() {
            ground.observe(frame_index, det.centroid.y);
        }
    }

    fn mark_missed(&mut self) {
        self.missed_frame_count += 1;
    }
}

// ============================================================================
// MAIN TRACKER
// ============================================================================

pub struct ObjectTracker {
    config: TrackerConfig,
    ground_config: GroundContactConfig,
    tracks: Vec<TrackedObject>,
    next_id: u32,
    dropped: Vec<u32>,
    discarded: usize,
}

impl ObjectTracker {
    pub fn new(config: TrackerConfig, ground_config: GroundContactConfig) -> Self {
        Self {
            config,
            ground_config,
            tracks: Vec::with_capacity(16),
            next_id: 1,
            dropped: Vec::new(),
            discarded: 0,
        }
    }

    /// Process one frame of detections. Returns the live set, ascending id.
    pub fn update(&mut self, frame_index: u64, detections: &[Detection]) -> &[TrackedObject] {
        self.dropped.clear();

        let valid: Vec<&Detection> = detections.iter().filter(|d| !d.is_degenerate()).collect();
        let discarded = detections.len() - valid.len();
        if discarded > 0 {
            debug!(
                "frame {}: discarded {} degenerate detection(s)",
                frame_index, discarded
            );
            self.discarded += discarded;
        }

        // ── Greedy nearest-centroid assignment ──
        let max_dist = self.config.max_match_distance_px;
        let mut pairs: Vec<(usize, usize, f32)> = Vec::new();
        for (ti, track) in self.tracks.iter().enumerate() {
            let tc = track.centroid();
            for (di, det) in valid.iter().enumerate() {
                if det.label != track.label {
                    continue;
                }
                let dist = tc.distance(&det.centroid);
                if dist <= max_dist {
                    pairs.push((ti, di, dist));
                }
            }
        }
        // tracks are stored in ascending id order, so ti order == id order
        pairs.sort_by(|a, b| {
            a.2.total_cmp(&b.2)
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });

        let mut matched_tracks = vec![false; self.tracks.len()];
        let mut matched_dets = vec![false; valid.len()];
        for (ti, di, _dist) in &pairs {
            if matched_tracks[*ti] || matched_dets[*di] {
                continue;
            }
            matched_tracks[*ti] = true;
            matched_dets[*di] = true;
            self.tracks[*ti].update_with_detection(valid[*di], frame_index);
        }

        // ── Coast or drop unmatched tracks ──
        for (ti, track) in self.tracks.iter_mut().enumerate() {
            if !matched_tracks[ti] {
                track.mark_missed();
            }
        }
        let max_missed = self.config.max_missed_frames;
        let dropped = &mut self.dropped;
        self.tracks.retain(|t| {
            if t.missed_frame_count > max_missed {
                info!(
                    "{} track {} lost after {} missed frames (last seen frame {})",
                    t.label.as_str(),
                    t.id,
                    t.missed_frame_count,
                    t.last_seen_frame
                );
                dropped.push(t.id);
                false
            } else {
                true
            }
        });

        // ── Spawn tracks for unmatched detections ──
        for (di, det) in valid.iter().enumerate() {
            if matched_dets[di] {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            debug!(
                "new {} track {} at ({:.1}, {:.1}) frame {}",
                det.label.as_str(),
                id,
                det.centroid.x,
                det.centroid.y,
                frame_index
            );
            self.tracks.push(TrackedObject::new(
                id,
                det,
                frame_index,
                &self.config,
                &self.ground_config,
            ));
        }

        &self.tracks
    }

    pub fn live_objects(&self) -> &[TrackedObject] {
        &self.tracks
    }

    pub fn cones(&self) -> Vec<&TrackedObject> {
        self.tracks.iter().filter(|t| t.is_cone()).collect()
    }

    pub fn skates(&self) -> Vec<&TrackedObject> {
        self.tracks.iter().filter(|t| t.is_skate()).collect()
    }

    pub fn get(&self, id: u32) -> Option<&TrackedObject> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Ids dropped by the most recent `update`.
    pub fn dropped_last_update(&self) -> &[u32] {
        &self.dropped
    }

    /// Total degenerate detections discarded since creation.
    pub fn discarded_count(&self) -> usize {
        self.discarded
    }

    /// Ids handed out so far.
    pub fn ids_issued(&self) -> u32 {
        self.next_id - 1
    }
}

/// Left/right ordering of the two most established skates (smaller x = left).
pub fn left_right_skates<'a>(skates: &[&'a TrackedObject]) -> Option<(&'a TrackedObject, &'a TrackedObject)> {
    let mut ordered: Vec<&TrackedObject> = skates.to_vec();
    ordered.sort_by(|a, b| a.missed_frame_count.cmp(&b.missed_frame_count).then(a.id.cmp(&b.id)));
    let (a, b) = match ordered.as_slice() {
        [a, b, ..] => (*a, *b),
        _ => return None,
    };
    match a.centroid().x.partial_cmp(&b.centroid().x) {
        Some(Ordering::Greater) => Some((b, a)),
        _ => Some((a, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn wheel(cx: f32, cy: f32) -> Detection {
        Detection::new(ObjectLabel::Wheel, [cx - 10.0, cy - 10.0, cx + 10.0, cy + 10.0], 0.9)
    }

    fn cone(cx: f32, cy: f32) -> Detection {
        Detection::new(ObjectLabel::Cone, [cx - 15.0, cy - 25.0, cx + 15.0, cy + 25.0], 0.9)
    }

    fn tracker() -> ObjectTracker {
        ObjectTracker::new(TrackerConfig::default(), GroundContactConfig::default())
    }

    #[test]
    fn test_track_creation_and_continuation() {
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0), cone(300.0, 380.0)]);
        let ids: Vec<u32> = t.live_objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);

        t.update(1, &[wheel(110.0, 401.0), cone(301.0, 380.0)]);
        let w = t.get(1).unwrap();
        assert_eq!(w.centroid(), Point::new(110.0, 401.0));
        assert_eq!(w.centroid_history.len(), 2);
        assert_eq!(w.last_seen_frame, 1);
        assert_eq!(t.ids_issued(), 2);
    }

    #[test]
    fn test_labels_never_cross_match() {
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0)]);
        t.update(1, &[cone(101.0, 400.0)]);
        let cone_track = t.cones()[0];
        assert_eq!(cone_track.id, 2);
        assert_eq!(t.get(1).unwrap().missed_frame_count, 1);
    }

    #[test]
    fn test_nearest_detection_wins() {
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0)]);
        t.update(1, &[wheel(160.0, 400.0), wheel(105.0, 400.0)]);
        assert_eq!(t.get(1).unwrap().centroid(), Point::new(105.0, 400.0));
        assert_eq!(t.get(2).unwrap().centroid(), Point::new(160.0, 400.0));
    }

    #[test]
    fn test_equidistant_tie_goes_to_lower_id() {
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0), wheel(140.0, 400.0)]);
        // One detection exactly between both tracks
        t.update(1, &[wheel(120.0, 400.0)]);
        assert_eq!(t.get(1).unwrap().missed_frame_count, 0);
        assert_eq!(t.get(2).unwrap().missed_frame_count, 1);
    }

    #[test]
    fn test_beyond_max_distance_spawns_new_track() {
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0)]);
        t.update(1, &[wheel(300.0, 400.0)]);
        assert_eq!(t.live_objects().len(), 2);
        assert_eq!(t.get(2).unwrap().first_seen_frame, 1);
    }

    #[test]
    fn test_missed_count_increments_and_resets() {
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0)]);
        for f in 1..=3 {
            t.update(f, &[]);
            assert_eq!(t.get(1).unwrap().missed_frame_count, f as u32);
        }
        t.update(4, &[wheel(102.0, 400.0)]);
        assert_eq!(t.get(1).unwrap().missed_frame_count, 0);
        assert_eq!(t.get(1).unwrap().last_seen_frame, 4);
    }

    #[test]
    fn test_lost_track_not_resurrected() {
        let cfg = TrackerConfig::default();
        let tolerance = cfg.max_missed_frames as u64;
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0)]);
        for f in 1..=tolerance + 1 {
            t.update(f, &[]);
        }
        assert!(t.get(1).is_none());
        assert_eq!(t.dropped_last_update(), &[1]);

        t.update(tolerance + 2, &[wheel(101.0, 400.0)]);
        let ids: Vec<u32> = t.live_objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_degenerate_detections_discarded() {
        let mut t = tracker();
        let flat = Detection::new(ObjectLabel::Cone, [10.0, 10.0, 30.0, 10.0], 0.9);
        t.update(0, &[flat, wheel(100.0, 400.0)]);
        assert_eq!(t.live_objects().len(), 1);
        assert_eq!(t.discarded_count(), 1);
    }

    #[test]
    fn test_live_ids_unique_under_crowding() {
        let mut t = tracker();
        let mut x = 0.0;
        for f in 0..40u64 {
            x += 7.0;
            let dets: Vec<Detection> = (0..(f % 5))
                .map(|k| wheel(x + k as f32 * 13.0, 400.0 - k as f32 * 3.0))
                .chain((0..(f % 3)).map(|k| cone(50.0 + k as f32 * 90.0, 380.0)))
                .collect();
            let live = t.update(f, &dets);
            let ids: HashSet<u32> = live.iter().map(|o| o.id).collect();
            assert_eq!(ids.len(), live.len(), "duplicate live id at frame {}", f);
            assert!(live.windows(2).all(|w| w[0].id < w[1].id));
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let cfg = TrackerConfig {
            history_capacity: 4,
            ..TrackerConfig::default()
        };
        let mut t = ObjectTracker::new(cfg, GroundContactConfig::default());
        for f in 0..10u64 {
            t.update(f, &[wheel(100.0 + f as f32, 400.0)]);
        }
        let track = t.get(1).unwrap();
        assert_eq!(track.centroid_history.len(), 4);
        assert_eq!(track.centroid_history.first(), Some(&Point::new(106.0, 400.0)));
    }

    #[test]
    fn test_wheels_carry_ground_contact_cones_do_not() {
        let mut t = tracker();
        t.update(0, &[wheel(100.0, 400.0), cone(300.0, 380.0)]);
        assert_eq!(t.get(1).unwrap().grounded(), Some(true));
        assert_eq!(t.get(2).unwrap().grounded(), None);

        for f in 1..6 {
            t.update(f, &[wheel(100.0, 400.0), cone(300.0, 380.0)]);
        }
        t.update(6, &[wheel(100.0, 370.0), cone(300.0, 380.0)]);
        assert_eq!(t.get(1).unwrap().grounded(), Some(false));
        assert_eq!(t.get(1).unwrap().contact_at(5).map(|s| s.grounded), Some(true));
    }

    #[test]
    fn test_left_right_by_x() {
        let mut t = tracker();
        t.update(0, &[wheel(300.0, 400.0), wheel(100.0, 400.0)]);
        let skates = t.skates();
        let (left, right) = left_right_skates(&skates).unwrap();
        assert_eq!(left.id, 2);
        assert_eq!(right.id, 1);
    }
}
