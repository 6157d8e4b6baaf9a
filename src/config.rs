// src/config.rs

use crate::detector::WheelGroupingConfig;
use crate::error::ConfigError;
use crate::types::{AnalyzerConfig, Config};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

impl AnalyzerConfig {
    /// Rejects values the core cannot run with. Checked once, before any frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative(
            "tracker.max_match_distance_px",
            self.tracker.max_match_distance_px,
        )?;
        at_least(
            "tracker.history_capacity",
            self.tracker.history_capacity,
            2,
        )?;

        non_negative("ground.lift_threshold_px", self.ground.lift_threshold_px)?;
        non_negative(
            "ground.release_threshold_px",
            self.ground.release_threshold_px,
        )?;
        if self.ground.release_threshold_px > self.ground.lift_threshold_px {
            return Err(ConfigError::InvertedHysteresis {
                release: self.ground.release_threshold_px,
                lift: self.ground.lift_threshold_px,
            });
        }
        at_least("ground.baseline_window", self.ground.baseline_window, 1)?;
        at_least("ground.settle_frames", self.ground.settle_frames, 2)?;
        at_least("ground.contact_history", self.ground.contact_history, 1)?;

        if let Some(max_lateral) = self.crossing.max_lateral_distance_px {
            non_negative("crossing.max_lateral_distance_px", max_lateral)?;
        }

        at_least("direction.window_frames", self.direction.window_frames, 1)?;
        non_negative("direction.min_motion_px", self.direction.min_motion_px)?;
        if !self.direction.dominance_ratio.is_finite() || self.direction.dominance_ratio < 1.0 {
            return Err(ConfigError::InvalidDominanceRatio(
                self.direction.dominance_ratio,
            ));
        }
        Ok(())
    }
}

impl WheelGroupingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative(
            "grouping.max_wheel_distance_px",
            self.max_wheel_distance_px,
        )?;
        at_least(
            "grouping.min_wheels_per_skate",
            self.min_wheels_per_skate,
            1,
        )
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { field, value })
    }
}

fn at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::TooSmall { field, value, min })
    }
}
