/*
 * Error Module
 *
 * Configuration errors. The simulation itself never fails once a flock has
 * been built; everything that can go wrong is caught at construction.
 */

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("population must contain at least one boid")]
    EmptyPopulation,

    #[error("{field} must be strictly positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("cell size {cell_size} is smaller than the largest perception radius {required}")]
    CellTooSmall { cell_size: f32, required: f32 },

    #[error("arrival threshold must lie in (0, 1], got {0}")]
    ThresholdOutOfRange(f32),

    #[error("arrival frames must be at least 1")]
    NoArrivalFrames,

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
