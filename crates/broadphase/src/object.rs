//! The capability contract for objects stored in the index.

use crate::bounds::Aabb;

/// An object handle the index can store.
///
/// The tree stores handles by value and never owns the underlying object;
/// callers typically hand it a cheap id-plus-cached-box handle and keep the
/// real object elsewhere. Two requirements:
///
/// - `aabb()` produces the object's current bounding box;
/// - `==` compares identity, not geometry (e.g. an id field).
///
/// A moved object must be removed and re-inserted by the caller; the index
/// does not watch handles for changes.
pub trait BoundedObject: PartialEq {
    /// The object's axis-aligned bounding box.
    fn aabb(&self) -> Aabb;
}
