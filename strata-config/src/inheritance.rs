//! Handle-addressed arena for records with ordered multi-parent inheritance.
//!
//! Every settings record lives in an [`InheritanceGraph`] and is addressed by a
//! typed [`Handle`]. A record's parent list stores handles, never owned values,
//! so one record can be the parent of many others (the `profiles.defaults`
//! base layer is a parent of every profile in its source).
//!
//! Field lookup is lazy: [`InheritanceGraph::resolve`] walks the record itself
//! and then each parent subtree in list order, returning the first explicit
//! value. Parents may gain parents of their own after a child references them
//! and the child still sees those values.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Opaque, copyable reference to a record stored in an [`InheritanceGraph`].
///
/// Handles are only meaningful for the graph that produced them.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            _marker: PhantomData,
        }
    }

    /// Position of the record in its graph's insertion order.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Records that carry state beyond plain inheritable fields.
///
/// `finalize_from_parent` is called once per direct parent by
/// [`InheritanceGraph::finalize_inheritance`], after all parents have been
/// attached.
pub trait Inheritable {
    fn finalize_from_parent(&mut self, _parent: &Self) {}
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    parents: Vec<Handle<T>>,
}

/// Arena of records plus their ordered parent lists.
#[derive(Debug, Clone)]
pub struct InheritanceGraph<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Default for InheritanceGraph<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> InheritanceGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a parentless record and return its handle.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let handle = Handle::new(self.nodes.len());
        self.nodes.push(Node {
            value,
            parents: Vec::new(),
        });
        handle
    }

    /// Add a record whose single parent is `parent`.
    pub fn insert_child(&mut self, value: T, parent: Handle<T>) -> Handle<T> {
        let handle = self.insert(value);
        self.nodes[handle.index()].parents.push(parent);
        handle
    }

    /// # Panics
    /// Panics if `handle` was produced by a different graph with fewer records.
    pub fn get(&self, handle: Handle<T>) -> &T {
        &self.nodes[handle.index()].value
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut self.nodes[handle.index()].value
    }

    /// All handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        (0..self.nodes.len()).map(Handle::new)
    }

    pub fn parents(&self, handle: Handle<T>) -> &[Handle<T>] {
        &self.nodes[handle.index()].parents
    }

    /// Attach `parent` to `child`'s parent list.
    ///
    /// `position` of `None` appends (lowest priority); `Some(0)` makes the
    /// parent the highest-priority one. Positions past the end append.
    ///
    /// Returns `false` without modifying the graph if the link would make a
    /// record its own ancestor.
    pub fn insert_parent(
        &mut self,
        child: Handle<T>,
        parent: Handle<T>,
        position: Option<usize>,
    ) -> bool {
        if child == parent || self.is_ancestor(child, parent) {
            log::warn!(
                "Refusing inheritance link {:?} -> {:?}: would create a cycle",
                child,
                parent
            );
            return false;
        }

        let parents = &mut self.nodes[child.index()].parents;
        match position {
            Some(pos) if pos < parents.len() => parents.insert(pos, parent),
            _ => parents.push(parent),
        }
        true
    }

    pub fn clear_parents(&mut self, handle: Handle<T>) {
        self.nodes[handle.index()].parents.clear();
    }

    /// True if `ancestor` is reachable from `handle` through parent links.
    pub fn is_ancestor(&self, ancestor: Handle<T>, handle: Handle<T>) -> bool {
        let mut stack: Vec<Handle<T>> = self.parents(handle).to_vec();
        let mut seen = vec![false; self.nodes.len()];
        while let Some(h) = stack.pop() {
            if h == ancestor {
                return true;
            }
            if std::mem::replace(&mut seen[h.index()], true) {
                continue;
            }
            stack.extend(self.parents(h).iter().rev().copied());
        }
        false
    }

    /// Lookup order for `handle`: the record itself, then each parent's
    /// subtree depth-first in list order.
    ///
    /// A record reachable through several paths appears once per path.
    pub fn lookup_order(&self, handle: Handle<T>) -> Vec<Handle<T>> {
        let mut order = Vec::new();
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            order.push(h);
            stack.extend(self.parents(h).iter().rev().copied());
        }
        order
    }

    /// First value `read` produces walking `handle`'s lookup order.
    pub fn resolve<R>(&self, handle: Handle<T>, read: impl Fn(&T) -> Option<R>) -> Option<R> {
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if let Some(value) = read(self.get(h)) {
                return Some(value);
            }
            stack.extend(self.parents(h).iter().rev().copied());
        }
        None
    }

    /// Handle of the record whose explicit value `resolve` would return.
    pub fn override_source(
        &self,
        handle: Handle<T>,
        has_value: impl Fn(&T) -> bool,
    ) -> Option<Handle<T>> {
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if has_value(self.get(h)) {
                return Some(h);
            }
            stack.extend(self.parents(h).iter().rev().copied());
        }
        None
    }

    /// Borrow `handle` together with the graph for resolved field access.
    pub fn view(&self, handle: Handle<T>) -> Resolved<'_, T> {
        Resolved {
            graph: self,
            handle,
        }
    }

    fn pair_mut(&mut self, child: Handle<T>, parent: Handle<T>) -> (&mut T, &T) {
        let (c, p) = (child.index(), parent.index());
        if c < p {
            let (left, right) = self.nodes.split_at_mut(p);
            (&mut left[c].value, &right[0].value)
        } else {
            let (left, right) = self.nodes.split_at_mut(c);
            (&mut right[0].value, &left[p].value)
        }
    }
}

impl<T: Inheritable> InheritanceGraph<T> {
    /// Pull non-field state (warnings, nested maps) from each direct parent
    /// into `handle`. Call once all parents are attached.
    pub fn finalize_inheritance(&mut self, handle: Handle<T>) {
        let parents = self.parents(handle).to_vec();
        for parent in parents {
            let (child, parent) = self.pair_mut(handle, parent);
            child.finalize_from_parent(parent);
        }
    }
}

impl<T: Clone> InheritanceGraph<T> {
    /// Deep-copy `handle` and its ancestry into `target`.
    ///
    /// `visited` maps source handles to their clones. A record reached twice
    /// is cloned once and linked from both places, so shared parents stay
    /// shared in the copy.
    pub fn copy_interned(
        &self,
        handle: Handle<T>,
        target: &mut InheritanceGraph<T>,
        visited: &mut HashMap<Handle<T>, Handle<T>>,
    ) -> Handle<T> {
        if let Some(existing) = visited.get(&handle) {
            return *existing;
        }

        let clone = target.insert(self.get(handle).clone());
        visited.insert(handle, clone);

        for parent in self.parents(handle) {
            let parent_clone = self.copy_interned(*parent, target, visited);
            target.nodes[clone.index()].parents.push(parent_clone);
        }

        clone
    }
}

/// A record paired with the graph it lives in.
///
/// Settings record modules add typed getters on `Resolved<'_, Record>` that
/// return the inherited value of each field.
pub struct Resolved<'a, T> {
    graph: &'a InheritanceGraph<T>,
    handle: Handle<T>,
}

impl<T> Clone for Resolved<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Resolved<'_, T> {}

impl<'a, T> Resolved<'a, T> {
    pub fn handle(&self) -> Handle<T> {
        self.handle
    }

    pub fn graph(&self) -> &'a InheritanceGraph<T> {
        self.graph
    }

    /// The record's own (unresolved) values.
    pub fn record(&self) -> &'a T {
        self.graph.get(self.handle)
    }

    pub fn resolve<R>(&self, read: impl Fn(&T) -> Option<R>) -> Option<R> {
        self.graph.resolve(self.handle, read)
    }

    pub fn override_source(&self, has_value: impl Fn(&T) -> bool) -> Option<Handle<T>> {
        self.graph.override_source(self.handle, has_value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolved<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("handle", &self.handle)
            .field("record", self.record())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Rec {
        name: &'static str,
        value: Option<u32>,
        notes: Vec<&'static str>,
    }

    impl Inheritable for Rec {
        fn finalize_from_parent(&mut self, parent: &Self) {
            self.notes.extend(parent.notes.iter().copied());
        }
    }

    fn rec(name: &'static str, value: Option<u32>) -> Rec {
        Rec {
            name,
            value,
            notes: Vec::new(),
        }
    }

    #[test]
    fn test_own_value_wins() {
        let mut graph = InheritanceGraph::new();
        let parent = graph.insert(rec("parent", Some(1)));
        let child = graph.insert_child(rec("child", Some(2)), parent);
        assert_eq!(graph.resolve(child, |r| r.value), Some(2));
    }

    #[test]
    fn test_parent_order_is_priority_order() {
        let mut graph = InheritanceGraph::new();
        let p1 = graph.insert(rec("p1", None));
        let p2 = graph.insert(rec("p2", Some(2)));
        let child = graph.insert(rec("child", None));
        graph.insert_parent(child, p1, None);
        graph.insert_parent(child, p2, None);
        assert_eq!(graph.resolve(child, |r| r.value), Some(2));

        graph.get_mut(p1).value = Some(1);
        assert_eq!(graph.resolve(child, |r| r.value), Some(1));
    }

    #[test]
    fn test_insert_parent_at_front() {
        let mut graph = InheritanceGraph::new();
        let low = graph.insert(rec("low", Some(1)));
        let high = graph.insert(rec("high", Some(9)));
        let child = graph.insert_child(rec("child", None), low);
        graph.insert_parent(child, high, Some(0));
        assert_eq!(graph.parents(child), &[high, low]);
        assert_eq!(graph.resolve(child, |r| r.value), Some(9));
    }

    #[test]
    fn test_parent_subtree_searched_before_next_parent() {
        let mut graph = InheritanceGraph::new();
        let grandparent = graph.insert(rec("gp", Some(7)));
        let p1 = graph.insert_child(rec("p1", None), grandparent);
        let p2 = graph.insert(rec("p2", Some(3)));
        let child = graph.insert(rec("child", None));
        graph.insert_parent(child, p1, None);
        graph.insert_parent(child, p2, None);
        assert_eq!(graph.resolve(child, |r| r.value), Some(7));
        assert_eq!(graph.override_source(child, |r| r.value.is_some()), Some(grandparent));
    }

    #[test]
    fn test_resolution_is_lazy() {
        let mut graph = InheritanceGraph::new();
        let parent = graph.insert(rec("parent", None));
        let child = graph.insert_child(rec("child", None), parent);
        assert_eq!(graph.resolve(child, |r| r.value), None);

        // Parent gains a parent after the child already references it.
        let late = graph.insert(rec("late", Some(5)));
        graph.insert_parent(parent, late, None);
        assert_eq!(graph.resolve(child, |r| r.value), Some(5));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut graph = InheritanceGraph::new();
        let a = graph.insert(rec("a", None));
        let b = graph.insert_child(rec("b", None), a);
        assert!(!graph.insert_parent(a, a, None));
        assert!(!graph.insert_parent(a, b, None));
        assert!(graph.parents(a).is_empty());
    }

    #[test]
    fn test_copy_preserves_sharing() {
        let mut graph = InheritanceGraph::new();
        let base = graph.insert(rec("base", Some(1)));
        let a = graph.insert_child(rec("a", None), base);
        let b = graph.insert_child(rec("b", None), base);

        let mut target = InheritanceGraph::new();
        let mut visited = HashMap::new();
        let a2 = graph.copy_interned(a, &mut target, &mut visited);
        let b2 = graph.copy_interned(b, &mut target, &mut visited);

        assert_eq!(target.len(), 3);
        assert_eq!(target.parents(a2), target.parents(b2));
        assert_eq!(target.get(target.parents(a2)[0]).name, "base");

        // The copy is independent of the source.
        target.get_mut(target.parents(a2)[0]).value = Some(42);
        assert_eq!(graph.resolve(a, |r| r.value), Some(1));
        assert_eq!(target.resolve(b2, |r| r.value), Some(42));
    }

    #[test]
    fn test_copy_handles_reconverging_paths() {
        let mut graph = InheritanceGraph::new();
        let root = graph.insert(rec("root", Some(1)));
        let left = graph.insert_child(rec("left", None), root);
        let right = graph.insert_child(rec("right", None), root);
        let leaf = graph.insert_child(rec("leaf", None), left);
        graph.insert_parent(leaf, right, None);

        let mut target = InheritanceGraph::new();
        let mut visited = HashMap::new();
        graph.copy_interned(leaf, &mut target, &mut visited);
        assert_eq!(target.len(), 4);
    }

    #[test]
    fn test_finalize_pulls_from_direct_parents() {
        let mut graph = InheritanceGraph::new();
        let mut parent = rec("parent", None);
        parent.notes.push("from parent");
        let parent = graph.insert(parent);
        let child = graph.insert_child(rec("child", None), parent);
        graph.finalize_inheritance(child);
        assert_eq!(graph.get(child).notes, vec!["from parent"]);
    }

    #[test]
    fn test_lookup_order() {
        let mut graph = InheritanceGraph::new();
        let gp = graph.insert(rec("gp", None));
        let p1 = graph.insert_child(rec("p1", None), gp);
        let p2 = graph.insert(rec("p2", None));
        let child = graph.insert_child(rec("child", None), p1);
        graph.insert_parent(child, p2, None);
        let names: Vec<_> = graph
            .lookup_order(child)
            .into_iter()
            .map(|h| graph.get(h).name)
            .collect();
        assert_eq!(names, vec!["child", "p1", "gp", "p2"]);
    }
}
