//! Adaptive quadtree broad-phase for 2D collision detection.
//!
//! Stores handles to axis-aligned bounded objects in a recursively
//! subdivided region and answers "which stored objects might overlap this
//! box" without scanning every pair. Subdivision happens on demand as
//! objects cluster; regions merge back as they thin out. Exact collision
//! resolution is the caller's business: the index only proposes candidate
//! pairs whose bounding boxes overlap.

pub mod bounds;
pub mod config;
pub mod error;
pub mod object;
pub mod tree;

// Re-export commonly used types
pub use bounds::Aabb;
pub use config::TreeConfig;
pub use error::ConfigError;
pub use object::BoundedObject;
pub use tree::{NodeView, Quadtree};
