// src/pipeline/event_bus.rs
//
// Decoupled event system. The pipeline publishes what happened on a frame;
// consumers (logging, report writer, renderers) drain instead of reaching
// into tracker or detector state.

use std::collections::VecDeque;
use tracing::warn;

use crate::analysis::crossing_detector::CrossingEvent;
use crate::analysis::technique_analyzer::Verdict;
use crate::analysis::travel_direction::TravelAxis;
use crate::types::ObjectLabel;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    TrackStarted {
        frame_index: u64,
        track_id: u32,
        label: ObjectLabel,
    },

    TrackLost {
        frame_index: u64,
        track_id: u32,
    },

    TravelAxisChanged {
        frame_index: u64,
        axis: TravelAxis,
    },

    CrossingDetected(CrossingEvent),

    VerdictIssued(Verdict),
}

pub struct EventBus {
    events: VecDeque<PipelineEvent>,
    max_pending: usize,
    dropped: u64,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending: max_pending.max(1),
            dropped: 0,
        }
    }

    pub fn publish(&mut self, event: PipelineEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<PipelineEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lost(track_id: u32) -> PipelineEvent {
        PipelineEvent::TrackLost {
            frame_index: 0,
            track_id,
        }
    }

    #[test]
    fn test_drain_preserves_order() {
        let mut bus = EventBus::new(8);
        bus.publish(lost(1));
        bus.publish(lost(2));
        assert_eq!(bus.pending_count(), 2);
        assert_eq!(bus.drain(), vec![lost(1), lost(2)]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_oldest() {
        let mut bus = EventBus::new(2);
        bus.publish(lost(1));
        bus.publish(lost(2));
        bus.publish(lost(3));
        assert_eq!(bus.dropped_count(), 1);
        assert_eq!(bus.drain(), vec![lost(2), lost(3)]);
    }
}
