//! Library error types.

use thiserror::Error;

/// Errors raised by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Inverted bounds: min ({min_x}, {min_y}) exceeds max ({max_x}, {max_y})")]
    InvertedBounds {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },

    #[error("max_objects must be at least 1")]
    ZeroObjectLimit,
}
