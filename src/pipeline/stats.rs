// src/pipeline/stats.rs
//
// Run-lifetime crossing statistics. Owned by the pipeline and passed around
// by value; nothing is ever un-recorded.

use serde::Serialize;

use crate::analysis::technique_analyzer::{CrossingStatus, Verdict};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total_crossings: u64,
    pub legal_crossings: u64,
    /// Crossings whose other skate could not be resolved (counted illegal)
    pub indeterminate_crossings: u64,
    /// Status of the most recent crossing
    pub last_status: Option<CrossingStatus>,
}

impl Stats {
    pub fn illegal_crossings(&self) -> u64 {
        self.total_crossings - self.legal_crossings
    }

    /// legal / total, 0 when nothing has been recorded.
    pub fn accuracy(&self) -> f64 {
        if self.total_crossings == 0 {
            0.0
        } else {
            self.legal_crossings as f64 / self.total_crossings as f64
        }
    }

    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy() * 100.0
    }
}

#[derive(Debug, Default)]
pub struct StatsAggregator {
    stats: Stats,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, verdict: &Verdict) {
        self.stats.total_crossings += 1;
        if verdict.legal {
            self.stats.legal_crossings += 1;
        }
        if verdict.is_indeterminate() {
            self.stats.indeterminate_crossings += 1;
        }
        self.stats.last_status = Some(verdict.status());
    }

    pub fn snapshot(&self) -> Stats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::crossing_detector::{CrossingEvent, Side};
    use crate::analysis::travel_direction::TravelAxis;
    use crate::types::Point;

    fn verdict(legal: bool, grounded: Option<bool>) -> Verdict {
        Verdict {
            event: CrossingEvent {
                frame_index: 1,
                cone_id: 1,
                crossing_skate_id: 2,
                other_skate_id: grounded.map(|_| 3),
                side_before: Side::Negative,
                side_after: Side::Positive,
                travel_axis: TravelAxis::Horizontal,
                cone_position: Point::default(),
                skate_position: Point::default(),
            },
            legal,
            other_skate_grounded_at_event: grounded,
        }
    }

    #[test]
    fn test_empty_accuracy_is_zero() {
        let agg = StatsAggregator::new();
        let s = agg.snapshot();
        assert_eq!(s.total_crossings, 0);
        assert_eq!(s.accuracy(), 0.0);
        assert_eq!(s.last_status, None);
    }

    #[test]
    fn test_counts_and_accuracy() {
        let mut agg = StatsAggregator::new();
        agg.record(&verdict(true, Some(false)));
        agg.record(&verdict(false, Some(true)));
        agg.record(&verdict(true, Some(false)));
        agg.record(&verdict(false, None));

        let s = agg.snapshot();
        assert_eq!(s.total_crossings, 4);
        assert_eq!(s.legal_crossings, 2);
        assert_eq!(s.illegal_crossings(), 2);
        assert_eq!(s.indeterminate_crossings, 1);
        assert_eq!(s.total_crossings, s.legal_crossings + s.illegal_crossings());
        assert_eq!(s.accuracy(), 0.5);
        assert_eq!(s.accuracy_percent(), 50.0);
        assert_eq!(s.last_status, Some(CrossingStatus::Illegal));
    }

    #[test]
    fn test_snapshot_is_monotonic() {
        let mut agg = StatsAggregator::new();
        let mut prev = agg.snapshot();
        for i in 0..10 {
            agg.record(&verdict(i % 3 == 0, Some(i % 3 != 0)));
            let now = agg.snapshot();
            assert!(now.total_crossings > prev.total_crossings);
            assert!(now.legal_crossings >= prev.legal_crossings);
            prev = now;
        }
        assert_eq!(prev.legal_crossings, 4);
    }
}
