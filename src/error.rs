// src/error.rs

use thiserror::Error;

/// Rejected configuration. Raised once, before the first frame is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { field: &'static str, value: f32 },

    #[error("{field} must be at least {min} (got {value})")]
    TooSmall {
        field: &'static str,
        value: usize,
        min: usize,
    },

    #[error("ground.release_threshold_px ({release}) must not exceed ground.lift_threshold_px ({lift})")]
    InvertedHysteresis { release: f32, lift: f32 },

    #[error("direction.dominance_ratio must be >= 1.0 (got {0})")]
    InvalidDominanceRatio(f32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("frame {got} received after frame {last}; frames must arrive in strictly increasing order")]
    OutOfOrderFrame { last: u64, got: u64 },
}
