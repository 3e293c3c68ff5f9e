//! Index configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::bounds::Aabb;
use crate::error::ConfigError;

/// Default hard subdivision depth cap.
pub const DEFAULT_MAX_DEPTH: u32 = 6;

/// Default per-node object threshold past which a leaf splits.
pub const DEFAULT_MAX_OBJECTS: usize = 8;

/// Construction-time tree configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeConfig {
    /// Maximum depth of the tree.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Maximum number of objects stored in one node before it splits.
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
    /// The region the tree covers.
    #[serde(default)]
    pub bounds: BoundsConfig,
}

impl TreeConfig {
    /// Load configuration from `quadtree.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("quadtree.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No quadtree.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Reject configurations the tree cannot be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.bounds;
        if b.min_x > b.max_x || b.min_y > b.max_y {
            return Err(ConfigError::InvertedBounds {
                min_x: b.min_x,
                min_y: b.min_y,
                max_x: b.max_x,
                max_y: b.max_y,
            });
        }
        if self.max_objects == 0 {
            return Err(ConfigError::ZeroObjectLimit);
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_objects: default_max_objects(),
            bounds: BoundsConfig::default(),
        }
    }
}

/// Corner coordinates of the tree's region.
///
/// The defaults reproduce the legacy documented region, min (−10, 10)
/// max (10, 10). It spans zero height on y, which a closed-interval box
/// permits; real deployments set their own region or resize after
/// construction.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BoundsConfig {
    #[serde(default = "default_min_x")]
    pub min_x: f32,
    #[serde(default = "default_min_y")]
    pub min_y: f32,
    #[serde(default = "default_max_x")]
    pub max_x: f32,
    #[serde(default = "default_max_y")]
    pub max_y: f32,
}

impl BoundsConfig {
    /// Whether the region has zero area.
    pub fn is_degenerate(&self) -> bool {
        self.min_x == self.max_x || self.min_y == self.max_y
    }

    pub fn to_aabb(&self) -> Aabb {
        Aabb::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            min_x: default_min_x(),
            min_y: default_min_y(),
            max_x: default_max_x(),
            max_y: default_max_y(),
        }
    }
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}
fn default_max_objects() -> usize {
    DEFAULT_MAX_OBJECTS
}
fn default_min_x() -> f32 {
    -10.0
}
fn default_min_y() -> f32 {
    10.0
}
fn default_max_x() -> f32 {
    10.0
}
fn default_max_y() -> f32 {
    10.0
}
