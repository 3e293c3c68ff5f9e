//! Recursive quadtree node: classification, branch, collapse, search.

use tracing::trace;

use crate::bounds::Aabb;
use crate::object::BoundedObject;

/// Tree-wide limits shared by every node. Passed down each recursion
/// instead of a back-pointer to the owning index.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub max_depth: u32,
    pub max_objects: usize,
}

/// Quadrant indices in fixed order, matching [`Aabb::quadrants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    Nw = 0,
    Ne = 1,
    Sw = 2,
    Se = 3,
}

impl Quadrant {
    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Outcome of a removal attempt, reported one level up the recursion.
///
/// `Here` means the handle was removed from the reporting node itself.
/// Every ancestor on the unwind runs collapse evaluation after a successful
/// removal, so a tree emptied from deep inside folds all the way back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    NotFound,
    Here,
    Below,
}

/// A single division of the tree. Has either no children or exactly four,
/// in NW, NE, SW, SE order; owns its subtree exclusively.
#[derive(Debug)]
pub(crate) struct Node<T> {
    pub(crate) depth: u32,
    pub(crate) bounds: Aabb,
    children: Option<Box<[Node<T>; 4]>>,
    pub(crate) objects: Vec<T>,
}

impl<T: BoundedObject> Node<T> {
    pub(crate) fn new(depth: u32, bounds: Aabb) -> Self {
        Self {
            depth,
            bounds,
            children: None,
            objects: Vec::new(),
        }
    }

    /// Which quadrant the box falls entirely within, if any.
    ///
    /// Strict inequalities: a box touching the center line on an axis is a
    /// straddler and stays at this node.
    fn quadrant_for(&self, aabb: &Aabb) -> Option<Quadrant> {
        let center = self.bounds.center();

        let west = aabb.max.x < center.x;
        let east = aabb.min.x > center.x;
        let north = aabb.max.y < center.y;
        let south = aabb.min.y > center.y;

        match (west, east, north, south) {
            (true, _, true, _) => Some(Quadrant::Nw),
            (_, true, true, _) => Some(Quadrant::Ne),
            (true, _, _, true) => Some(Quadrant::Sw),
            (_, true, _, true) => Some(Quadrant::Se),
            _ => None,
        }
    }

    /// Classification shared by insertion and removal. `None` means the
    /// object belongs to this node: the node is a leaf with spare local
    /// capacity, the depth cap stops further descent, or the box straddles
    /// the center.
    fn classify(&self, aabb: &Aabb, limits: &Limits) -> Option<Quadrant> {
        if (self.children.is_none() && self.objects.len() < limits.max_objects)
            || self.depth >= limits.max_depth
        {
            return None;
        }
        self.quadrant_for(aabb)
    }

    /// Place a handle at the node classification resolves to, branching on
    /// the way down as needed.
    pub(crate) fn insert(&mut self, object: T, limits: &Limits) {
        match self.classify(&object.aabb(), limits) {
            None => self.objects.push(object),
            Some(q) => {
                if self.children.is_none() {
                    self.branch(limits);
                }
                if let Some(children) = self.children.as_mut() {
                    children[q.index()].insert(object, limits);
                }
            }
        }
    }

    /// Remove the handle identity-equal to `object`, following the same
    /// classification path an insertion would take (branching on demand
    /// while searching). After a successful removal below, this node runs
    /// collapse evaluation on the unwind.
    pub(crate) fn remove(&mut self, object: &T, limits: &Limits) -> Removal {
        match self.classify(&object.aabb(), limits) {
            None => {
                if let Some(i) = self.objects.iter().position(|o| o == object) {
                    self.objects.swap_remove(i);
                    Removal::Here
                } else {
                    Removal::NotFound
                }
            }
            Some(q) => {
                if self.children.is_none() {
                    self.branch(limits);
                }
                let outcome = match self.children.as_mut() {
                    Some(children) => children[q.index()].remove(object, limits),
                    None => Removal::NotFound,
                };
                match outcome {
                    Removal::NotFound => Removal::NotFound,
                    Removal::Here | Removal::Below => {
                        self.evaluate_children(limits);
                        Removal::Below
                    }
                }
            }
        }
    }

    /// Collect references to every stored handle whose node the query box
    /// can reach. Non-mutating: never creates children. A query resolving
    /// to a single quadrant prunes the other three; a straddling query
    /// descends into all four.
    pub(crate) fn search<'a>(&'a self, query: &Aabb, out: &mut Vec<&'a T>) {
        out.extend(self.objects.iter());

        let Some(children) = self.children.as_ref() else {
            return;
        };
        match self.quadrant_for(query) {
            Some(q) => children[q.index()].search(query, out),
            None => {
                for child in children.iter() {
                    child.search(query, out);
                }
            }
        }
    }

    /// Subdivide into four children at `depth + 1` and re-home every local
    /// handle that now resolves to a single quadrant. Straddlers stay.
    /// All four children are created together; branching is never partial.
    fn branch(&mut self, limits: &Limits) {
        let [nw, ne, sw, se] = self.bounds.quadrants();
        let depth = self.depth + 1;
        let mut children = Box::new([
            Node::new(depth, nw),
            Node::new(depth, ne),
            Node::new(depth, sw),
            Node::new(depth, se),
        ]);

        let locals = std::mem::take(&mut self.objects);
        for object in locals {
            match self.quadrant_for(&object.aabb()) {
                Some(q) => children[q.index()].insert(object, limits),
                None => self.objects.push(object),
            }
        }
        self.children = Some(children);

        trace!(depth = self.depth, kept = self.objects.len(), "branched node");
    }

    /// Collapse the subtree back into this node if it has shrunk enough.
    ///
    /// When the whole subtree holds at most `max_objects` handles, every
    /// descendant's storage is gathered recursively into this node and all
    /// four children are discarded together. Otherwise each child is
    /// evaluated in turn.
    pub(crate) fn evaluate_children(&mut self, limits: &Limits) {
        if self.children.is_none() {
            return;
        }

        let total = self.subtree_len();
        if total <= limits.max_objects {
            if let Some(mut children) = self.children.take() {
                for child in children.iter_mut() {
                    child.drain_subtree(&mut self.objects);
                }
            }
            trace!(depth = self.depth, objects = total, "collapsed node");
        } else if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                child.evaluate_children(limits);
            }
        }
    }

    /// Number of handles stored in this node and everything beneath it.
    pub(crate) fn subtree_len(&self) -> usize {
        let mut count = self.objects.len();
        if let Some(children) = self.children.as_ref() {
            count += children.iter().map(Node::subtree_len).sum::<usize>();
        }
        count
    }

    /// Move every handle in the subtree into `out`, discarding all nodes
    /// beneath this one.
    pub(crate) fn drain_subtree(&mut self, out: &mut Vec<T>) {
        out.append(&mut self.objects);
        if let Some(mut children) = self.children.take() {
            for child in children.iter_mut() {
                child.drain_subtree(out);
            }
        }
    }

    /// Drop every handle and every child node.
    pub(crate) fn reset(&mut self) {
        self.objects.clear();
        self.children = None;
    }

    /// Depth-first walk over the subtree for read-only inspection.
    pub(crate) fn visit<'a>(&'a self, f: &mut impl FnMut(u32, Aabb, &'a [T])) {
        f(self.depth, self.bounds, &self.objects);
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.visit(f);
            }
        }
    }

    /// Number of live nodes in the subtree, this node included.
    pub(crate) fn node_count(&self) -> usize {
        let mut count = 1;
        if let Some(children) = self.children.as_ref() {
            count += children.iter().map(Node::node_count).sum::<usize>();
        }
        count
    }

    #[cfg(test)]
    fn has_children(&self) -> bool {
        self.children.is_some()
    }

    #[cfg(test)]
    fn child(&self, index: usize) -> Option<&Node<T>> {
        self.children.as_ref().map(|c| &c[index])
    }
}
