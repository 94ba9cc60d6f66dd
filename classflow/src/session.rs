//! Analysis session: the class graph plus all caches shared across method
//! analyses.
//!
//! One [`Session`] is created per compilation and borrowed immutably by
//! every analysis thread. All interior state lives in concurrent maps with
//! lock-free reads; the only writes are cache inserts, which lock a single
//! shard briefly. Nothing is ever removed or replaced, so a value observed
//! once stays valid for the lifetime of the session.

use dashmap::DashMap;

use crate::hierarchy::graph::{ClassGraph, ClassRef};
use crate::lattice::interfaces::{compute_implemented_interfaces, InterfaceSet};
use crate::lattice::nullability::Nullability;
use crate::lattice::types::{ArrayType, ClassType, TypeElement};

/// Session-wide configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// With the whole program visible, reference types carry interface sets
    /// and joins consult the class hierarchy. Without it (per-file
    /// compilation) interface sets stay empty and any join of distinct
    /// classes falls back to the root.
    pub whole_program: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            whole_program: true,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    graph: ClassGraph,
    options: Options,
    /// Interfaces every array type implements, empty in per-file mode.
    array_interfaces: InterfaceSet,
    class_variants: DashMap<(ClassRef, InterfaceSet, Nullability), ClassType>,
    array_variants: DashMap<(TypeElement, Nullability), ArrayType>,
    interface_lub_memo: DashMap<(InterfaceSet, InterfaceSet), InterfaceSet>,
    implemented_memo: DashMap<ClassRef, InterfaceSet>,
}

impl Session {
    pub fn new(graph: ClassGraph, options: Options) -> Session {
        let array_interfaces = if options.whole_program {
            InterfaceSet::new(vec![graph.cloneable(), graph.serializable()])
        } else {
            InterfaceSet::empty()
        };
        Session {
            graph,
            options,
            array_interfaces,
            class_variants: DashMap::new(),
            array_variants: DashMap::new(),
            interface_lub_memo: DashMap::new(),
            implemented_memo: DashMap::new(),
        }
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn whole_program(&self) -> bool {
        self.options.whole_program
    }

    /// `{Cloneable, Serializable}` in whole-program mode, empty otherwise.
    pub fn array_interfaces(&self) -> &InterfaceSet {
        &self.array_interfaces
    }

    /// Returns the shared instance for this class shape, creating it on
    /// first use. Equal shapes alias the same allocation, which is what
    /// makes identity checks after `fixup_class_refs` meaningful.
    pub(crate) fn intern_class_type(
        &self,
        class_ref: ClassRef,
        interfaces: InterfaceSet,
        nullability: Nullability,
    ) -> ClassType {
        self.class_variants
            .entry((class_ref, interfaces.clone(), nullability))
            .or_insert_with(|| ClassType::create(class_ref, interfaces, nullability))
            .clone()
    }

    pub(crate) fn intern_array_type(
        &self,
        member: TypeElement,
        nullability: Nullability,
    ) -> ArrayType {
        self.array_variants
            .entry((member.clone(), nullability))
            .or_insert_with(|| ArrayType::create(member, nullability))
            .clone()
    }

    /// Memo read for the interface least upper bound, tried under both
    /// argument orderings.
    pub(crate) fn cached_interface_lub(
        &self,
        a: &InterfaceSet,
        b: &InterfaceSet,
    ) -> Option<InterfaceSet> {
        let key = (a.clone(), b.clone());
        if let Some(hit) = self.interface_lub_memo.get(&key) {
            return Some(hit.value().clone());
        }
        let reversed = (key.1, key.0);
        self.interface_lub_memo
            .get(&reversed)
            .map(|hit| hit.value().clone())
    }

    /// Memo insert. A concurrent insert of the reversed ordering wins; the
    /// operation commutes, so both entries would hold the same set anyway.
    pub(crate) fn memoize_interface_lub(
        &self,
        a: &InterfaceSet,
        b: &InterfaceSet,
        result: InterfaceSet,
    ) {
        let reversed = (b.clone(), a.clone());
        if self.interface_lub_memo.contains_key(&reversed) {
            return;
        }
        self.interface_lub_memo
            .entry((a.clone(), b.clone()))
            .or_insert(result);
    }

    /// Interfaces `class` is known to implement. Forced empty in per-file
    /// mode, cached per class otherwise.
    pub fn implemented_interfaces(&self, class: ClassRef) -> InterfaceSet {
        if !self.options.whole_program {
            return InterfaceSet::empty();
        }
        if let Some(cached) = self.implemented_memo.get(&class) {
            return cached.value().clone();
        }
        let computed = compute_implemented_interfaces(&self.graph, class);
        self.implemented_memo
            .entry(class)
            .or_insert(computed)
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn interface_lub_memo_len(&self) -> usize {
        self.interface_lub_memo.len()
    }
}
