//! Adaptive quadtree spatial index.
//!
//! The index owns a recursive node tree; all classification, branching and
//! collapsing lives in [`node`], the public handle in [`quadtree`].

mod node;
mod quadtree;

pub use quadtree::{NodeView, Quadtree};
