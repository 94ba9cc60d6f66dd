//! Least upper bound of two classes along the superclass chain.
//!
//! ```text
//!        Object
//!          |
//!          A          lub(C, D) = A
//!         / \
//!        C   D        first walk records C's chain {C, A},
//!                     second walk climbs from D and stops at A
//! ```
//!
//! The first chain is kept in an inline buffer and promoted to a hash set
//! once it outgrows [`CLASS_CHAIN_SET_PROMOTION_THRESHOLD`], so shallow
//! hierarchies (the overwhelmingly common case) never allocate. A missing
//! definition on either chain ends that walk and the result degrades to the
//! root, with a diagnostic when collection is enabled.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::diagnostics;
use crate::hierarchy::graph::{ClassGraph, ClassRef};
use crate::lattice::widening::{CLASS_CHAIN_INLINE_CAPACITY, CLASS_CHAIN_SET_PROMOTION_THRESHOLD};

/// Membership structure for the first chain walk.
struct SeenChain {
    buffer: SmallVec<[ClassRef; CLASS_CHAIN_INLINE_CAPACITY]>,
    promoted: Option<HashSet<ClassRef>>,
}

impl SeenChain {
    fn new() -> SeenChain {
        SeenChain {
            buffer: SmallVec::new(),
            promoted: None,
        }
    }

    fn insert(&mut self, r: ClassRef) {
        if let Some(set) = &mut self.promoted {
            set.insert(r);
            return;
        }
        self.buffer.push(r);
        if self.buffer.len() > CLASS_CHAIN_SET_PROMOTION_THRESHOLD {
            self.promoted = Some(self.buffer.drain(..).collect());
        }
    }

    fn contains(&self, r: ClassRef) -> bool {
        match &self.promoted {
            Some(set) => set.contains(&r),
            None => self.buffer.contains(&r),
        }
    }
}

/// Most specific common superclass of `a` and `b`.
///
/// Interfaces never reach this point: a value of declared interface type is
/// anchored at the root and carries the interface in its interface set.
pub fn compute_least_upper_bound_of_classes(
    graph: &ClassGraph,
    a: ClassRef,
    b: ClassRef,
) -> ClassRef {
    debug_assert!(
        !graph.is_interface(a) && !graph.is_interface(b),
        "class lub takes class refs, got an interface"
    );
    if a == b {
        return a;
    }
    let object = graph.object();
    if a == object || b == object {
        return object;
    }

    // First walk: record a's chain, root excluded.
    let mut seen = SeenChain::new();
    let mut current = a;
    loop {
        if current == object {
            break;
        }
        seen.insert(current);
        let Some(def) = graph.definition_or_missing(current) else {
            diagnostics::emit_missing_class(graph.name(current));
            break;
        };
        match def.superclass {
            Some(sup) => current = sup,
            None => break,
        }
    }

    // Second walk: climb from b until the chains intersect. Membership is
    // checked before advancing so `b` itself can be the answer.
    let mut current = b;
    loop {
        if seen.contains(current) {
            return current;
        }
        let Some(def) = graph.definition_or_missing(current) else {
            diagnostics::emit_missing_class(graph.name(current));
            diagnostics::emit_conservative_class_lub(graph.name(a), graph.name(b));
            return object;
        };
        match def.superclass {
            Some(sup) => current = sup,
            None => return object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticReason, DiagnosticsCollector};
    use crate::hierarchy::graph::ClassGraph;

    fn animal_graph() -> ClassGraph {
        let mut b = ClassGraph::builder();
        let object = b.object();
        let animal = b.add_class("Animal", object, &[]).unwrap();
        let cat = b.add_class("Cat", animal, &[]).unwrap();
        b.add_class("Dog", animal, &[]).unwrap();
        b.add_class("Tabby", cat, &[]).unwrap();
        b.add_class("Rock", object, &[]).unwrap();
        b.build()
    }

    fn named(g: &ClassGraph, name: &str) -> ClassRef {
        g.by_name(name).unwrap()
    }

    #[test]
    fn test_identical_classes() {
        let g = animal_graph();
        let cat = named(&g, "Cat");
        assert_eq!(compute_least_upper_bound_of_classes(&g, cat, cat), cat);
    }

    #[test]
    fn test_object_absorbs() {
        let g = animal_graph();
        let cat = named(&g, "Cat");
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, g.object(), cat),
            g.object()
        );
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, cat, g.object()),
            g.object()
        );
    }

    #[test]
    fn test_siblings_meet_at_parent() {
        let g = animal_graph();
        let cat = named(&g, "Cat");
        let dog = named(&g, "Dog");
        let animal = named(&g, "Animal");
        assert_eq!(compute_least_upper_bound_of_classes(&g, cat, dog), animal);
        assert_eq!(compute_least_upper_bound_of_classes(&g, dog, cat), animal);
    }

    #[test]
    fn test_super_of_sub_is_super() {
        let g = animal_graph();
        let tabby = named(&g, "Tabby");
        let animal = named(&g, "Animal");
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, tabby, animal),
            animal
        );
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, animal, tabby),
            animal
        );
    }

    #[test]
    fn test_unrelated_trees_meet_at_root() {
        let g = animal_graph();
        let tabby = named(&g, "Tabby");
        let rock = named(&g, "Rock");
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, tabby, rock),
            g.object()
        );
    }

    #[test]
    fn test_missing_definition_degrades_to_root() {
        let mut b = ClassGraph::builder();
        let object = b.object();
        let ghost = b.intern("Ghost");
        let known = b.add_class("Known", object, &[]).unwrap();
        let g = b.build();

        DiagnosticsCollector::enable();
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, known, ghost),
            g.object()
        );
        let diags = DiagnosticsCollector::take();
        DiagnosticsCollector::disable();
        assert!(diags
            .iter()
            .any(|d| matches!(&d.reason, DiagnosticReason::MissingClass(name) if name == "Ghost")));
        assert!(diags
            .iter()
            .any(|d| matches!(&d.reason, DiagnosticReason::ConservativeClassLub(_, _))));
    }

    #[test]
    fn test_missing_class_can_still_anchor_a_chain() {
        // Ghost has no definition but Derived names it as superclass, so a
        // walk from Derived still intersects the first chain at Ghost.
        let mut b = ClassGraph::builder();
        let ghost = b.intern("Ghost");
        b.add_class("Derived", ghost, &[]).unwrap();
        let g = b.build();
        let derived = g.by_name("Derived").unwrap();
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, ghost, derived),
            ghost
        );
    }

    #[test]
    fn test_deep_chain_promotes_to_set() {
        // 30 links comfortably exceeds the promotion threshold.
        let mut b = ClassGraph::builder();
        let mut chain = vec![b.object()];
        for depth in 0..30 {
            let parent = *chain.last().unwrap();
            chain.push(b.add_class(&format!("Depth{depth}"), parent, &[]).unwrap());
        }
        let fork_point = chain[25];
        let fork = b.add_class("Fork", fork_point, &[]).unwrap();
        let g = b.build();
        let leaf = *chain.last().unwrap();
        assert_eq!(
            compute_least_upper_bound_of_classes(&g, leaf, fork),
            fork_point
        );
    }
}
