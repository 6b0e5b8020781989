//! Directed dependency graph between cell names.
//!
//! An ordered pair `(s, t)` means "t depends on s": `t` is a dependent of `s`
//! and `s` is a dependee of `t`. The graph holds a set of such pairs; adding a
//! pair twice or removing an absent pair does nothing.
//!
//! Names are interned into an arena of node ids so the recalculation walk in
//! [`super::cycle`] can run on integer adjacency sets. Both directions are kept
//! and every mutation updates both. A name that is left in no pair is released
//! and its slot reused, so the arena never outgrows the largest live graph.

use std::collections::{BTreeSet, HashMap};

/// Arena index of a name in a [`DependencyGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    dependents: Vec<BTreeSet<NodeId>>,
    dependees: Vec<BTreeSet<NodeId>>,
    free: Vec<NodeId>,
    size: usize,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph::default()
    }

    /// Number of ordered pairs.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.0]
    }

    /// Number of names taking part in at least one pair.
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Arena size, live and free slots together. Every [`NodeId`] is below it.
    pub(crate) fn slot_count(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn dependent_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.dependents[id.0].iter().copied()
    }

    fn intern(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = match self.free.pop() {
            Some(id) => {
                self.names[id.0] = name.to_string();
                id
            }
            None => {
                self.names.push(name.to_string());
                self.dependents.push(BTreeSet::new());
                self.dependees.push(BTreeSet::new());
                NodeId(self.names.len() - 1)
            }
        };
        self.index.insert(name.to_string(), id);
        id
    }

    fn release_if_unused(&mut self, id: NodeId) {
        let live = self.index.get(&self.names[id.0]) == Some(&id);
        if !live || !self.dependents[id.0].is_empty() || !self.dependees[id.0].is_empty() {
            return;
        }
        let name = std::mem::take(&mut self.names[id.0]);
        self.index.remove(&name);
        self.free.push(id);
    }

    pub fn has_dependents(&self, s: &str) -> bool {
        self.node_id(s)
            .is_some_and(|id| !self.dependents[id.0].is_empty())
    }

    pub fn has_dependees(&self, t: &str) -> bool {
        self.node_id(t)
            .is_some_and(|id| !self.dependees[id.0].is_empty())
    }

    /// Names that depend on `s`. Empty for unknown names.
    pub fn dependents<'a>(&'a self, s: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.neighbours(&self.dependents, s)
    }

    /// Names `t` depends on. Empty for unknown names.
    pub fn dependees<'a>(&'a self, t: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.neighbours(&self.dependees, t)
    }

    fn neighbours<'a>(
        &'a self,
        sets: &'a [BTreeSet<NodeId>],
        name: &str,
    ) -> impl Iterator<Item = &'a str> + use<'a> {
        let set = self.node_id(name).map(|id| &sets[id.0]);
        set.into_iter()
            .flatten()
            .map(move |id| self.names[id.0].as_str())
    }

    /// Number of names `t` depends on.
    pub fn dependee_count(&self, t: &str) -> usize {
        self.node_id(t).map_or(0, |id| self.dependees[id.0].len())
    }

    /// Record that `t` depends on `s`.
    pub fn add_dependency(&mut self, s: &str, t: &str) {
        let s = self.intern(s);
        let t = self.intern(t);
        if self.dependents[s.0].insert(t) {
            self.dependees[t.0].insert(s);
            self.size += 1;
        }
    }

    pub fn remove_dependency(&mut self, s: &str, t: &str) {
        let (Some(s), Some(t)) = (self.node_id(s), self.node_id(t)) else {
            return;
        };
        if self.dependents[s.0].remove(&t) {
            self.dependees[t.0].remove(&s);
            self.size -= 1;
            self.release_if_unused(s);
            self.release_if_unused(t);
        }
    }

    /// Remove every `(s, r)` pair, then add `(s, t)` for each `t`.
    pub fn replace_dependents<I, S>(&mut self, s: &str, new_dependents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(id) = self.node_id(s) {
            for r in std::mem::take(&mut self.dependents[id.0]) {
                self.dependees[r.0].remove(&id);
                self.size -= 1;
                self.release_if_unused(r);
            }
            self.release_if_unused(id);
        }
        for t in new_dependents {
            self.add_dependency(s, t.as_ref());
        }
    }

    /// Remove every `(r, t)` pair, then add `(s, t)` for each `s`.
    pub fn replace_dependees<I, S>(&mut self, t: &str, new_dependees: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(id) = self.node_id(t) {
            for r in std::mem::take(&mut self.dependees[id.0]) {
                self.dependents[r.0].remove(&id);
                self.size -= 1;
                self.release_if_unused(r);
            }
            self.release_if_unused(id);
        }
        for s in new_dependees {
            self.add_dependency(s.as_ref(), t);
        }
    }
}
