//! Interface sets attached to class types, and their least upper bound.
//!
//! A reference type carries the set of interfaces it is known to implement,
//! kept as a minimal antichain: no member is a supertype of another. Joining
//! two class types joins these sets with a two-colored breadth-first walk up
//! the interface hierarchy:
//!
//! ```text
//!   seed left side with s1, right side with s2
//!   pop (itf, side):
//!     already seen from `side`  -> skip
//!     now seen from both sides -> common candidate, do not expand
//!     otherwise                 -> enqueue direct super-interfaces, same side
//!   result = candidates minus anything with a strict subtype among them
//! ```
//!
//! Walking stops at the first node each pair of paths shares, so the most
//! specific common interfaces are found without visiting the whole closure.
//! Results are memoized per [`Session`] under both argument orderings.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::hierarchy::graph::{ClassGraph, ClassRef};
use crate::session::Session;

static EMPTY: Lazy<InterfaceSet> = Lazy::new(|| InterfaceSet {
    refs: Arc::from(Vec::new()),
});

/// Sorted, deduplicated set of interface refs. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceSet {
    refs: Arc<[ClassRef]>,
}

impl InterfaceSet {
    pub fn empty() -> InterfaceSet {
        EMPTY.clone()
    }

    pub fn new(mut refs: Vec<ClassRef>) -> InterfaceSet {
        if refs.is_empty() {
            return InterfaceSet::empty();
        }
        refs.sort_unstable();
        refs.dedup();
        InterfaceSet {
            refs: Arc::from(refs),
        }
    }

    pub fn singleton(r: ClassRef) -> InterfaceSet {
        InterfaceSet {
            refs: Arc::from(vec![r]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn contains(&self, r: ClassRef) -> bool {
        self.refs.binary_search(&r).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = ClassRef> + '_ {
        self.refs.iter().copied()
    }

    pub fn as_slice(&self) -> &[ClassRef] {
        &self.refs
    }

    /// Renders as `{A, B}` using names from `graph`.
    pub fn display<'a>(&'a self, graph: &'a ClassGraph) -> DisplayInterfaceSet<'a> {
        DisplayInterfaceSet { set: self, graph }
    }
}

impl FromIterator<ClassRef> for InterfaceSet {
    fn from_iter<T: IntoIterator<Item = ClassRef>>(iter: T) -> Self {
        InterfaceSet::new(iter.into_iter().collect())
    }
}

#[derive(Debug)]
pub struct DisplayInterfaceSet<'a> {
    set: &'a InterfaceSet,
    graph: &'a ClassGraph,
}

impl std::fmt::Display for DisplayInterfaceSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, r) in self.set.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.graph.name(r))?;
        }
        write!(f, "}}")
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Default)]
struct Marker {
    left: bool,
    right: bool,
}

impl Marker {
    fn has(self, side: Side) -> bool {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn set(&mut self, side: Side) {
        match side {
            Side::Left => self.left = true,
            Side::Right => self.right = true,
        }
    }

    fn both(self) -> bool {
        self.left && self.right
    }
}

/// Least upper bound of two interface sets, memoized on `session`.
///
/// An empty operand short-circuits to the empty set: joining with a type
/// that implements nothing known can preserve nothing.
pub fn compute_least_upper_bound_of_interfaces(
    session: &Session,
    s1: &InterfaceSet,
    s2: &InterfaceSet,
) -> InterfaceSet {
    if s1.is_empty() || s2.is_empty() {
        return InterfaceSet::empty();
    }
    if s1 == s2 {
        return s1.clone();
    }
    if let Some(cached) = session.cached_interface_lub(s1, s2) {
        return cached;
    }
    let result = least_upper_bound_uncached(session.graph(), s1, s2);
    session.memoize_interface_lub(s1, s2, result.clone());
    result
}

fn least_upper_bound_uncached(
    graph: &ClassGraph,
    s1: &InterfaceSet,
    s2: &InterfaceSet,
) -> InterfaceSet {
    let mut markers: HashMap<ClassRef, Marker> = HashMap::new();
    let mut worklist: VecDeque<(ClassRef, Side)> = VecDeque::new();
    for r in s1.iter() {
        worklist.push_back((r, Side::Left));
    }
    for r in s2.iter() {
        worklist.push_back((r, Side::Right));
    }
    while let Some((itf, side)) = worklist.pop_front() {
        let marker = markers.entry(itf).or_default();
        if marker.has(side) {
            continue;
        }
        marker.set(side);
        if marker.both() {
            // Reached from both operands: a candidate. Its supers need no
            // visit from this path, minimization would drop them anyway.
            continue;
        }
        for sup in graph.declared_interfaces_of(itf) {
            worklist.push_back((*sup, side));
        }
    }
    let candidates: Vec<ClassRef> = markers
        .iter()
        .filter(|(_, m)| m.both())
        .map(|(&r, _)| r)
        .collect();
    minimize_interfaces(graph, candidates)
}

/// Drops every candidate that has a strict subtype among the candidates,
/// leaving the maximally specific antichain.
pub(crate) fn minimize_interfaces(graph: &ClassGraph, candidates: Vec<ClassRef>) -> InterfaceSet {
    let minimal: Vec<ClassRef> = candidates
        .iter()
        .copied()
        .filter(|&c| {
            !candidates
                .iter()
                .any(|&d| d != c && graph.is_strict_subtype_of(d, c))
        })
        .collect();
    InterfaceSet::new(minimal)
}

/// Full set of interfaces `class` is known to implement, minimized.
///
/// For an interface this is the singleton of the interface itself; its
/// super-interfaces are implied and would be pruned by minimization.
pub(crate) fn compute_implemented_interfaces(graph: &ClassGraph, class: ClassRef) -> InterfaceSet {
    if graph.is_interface(class) {
        return InterfaceSet::singleton(class);
    }
    let mut collected: HashSet<ClassRef> = HashSet::new();
    let mut worklist: VecDeque<ClassRef> = VecDeque::new();
    let mut current = Some(class);
    while let Some(c) = current {
        worklist.extend(graph.declared_interfaces_of(c).iter().copied());
        current = graph.superclass_of(c);
    }
    while let Some(itf) = worklist.pop_front() {
        if collected.insert(itf) {
            worklist.extend(graph.declared_interfaces_of(itf).iter().copied());
        }
    }
    minimize_interfaces(graph, collected.into_iter().collect())
}
