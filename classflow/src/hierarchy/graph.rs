//! The class universe the analysis runs against.
//!
//! A [`ClassGraph`] is built once per compilation from whatever class
//! definitions the enclosing compiler has loaded, then shared read-only
//! across every method analysis. Class names are interned to [`ClassRef`]
//! indices; a ref may exist *without* a definition, which models a classpath
//! gap (see `is_missing_or_has_missing_supertype`). The graph never treats a
//! missing definition as an error: lookups return `None` and the lattice
//! machinery degrades conservatively.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::GraphError;

/// Interned class name. Copyable index into the owning [`ClassGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassRef(pub(crate) u32);

impl ClassRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Definition of one class or interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    /// Direct superclass. `None` only for the root. Interfaces report the
    /// root here, matching the classfile encoding.
    pub superclass: Option<ClassRef>,
    /// Directly declared interfaces (super-interfaces for an interface).
    pub interfaces: Vec<ClassRef>,
    pub is_interface: bool,
    /// No subclasses exist in the known universe, so exact-type tracking
    /// against this class is sound.
    pub is_effectively_final: bool,
}

/// Refs the analysis itself needs, pre-interned by the builder.
///
/// Only the root and the two array marker interfaces are pre-*defined*;
/// `string` and `throwable` are interned names the enclosing compiler (or a
/// test fixture) defines along with the rest of its universe.
#[derive(Clone, Copy, Debug)]
pub struct WellKnownRefs {
    pub object: ClassRef,
    pub cloneable: ClassRef,
    pub serializable: ClassRef,
    pub string: ClassRef,
    pub throwable: ClassRef,
}

/// Immutable class hierarchy snapshot.
#[derive(Debug)]
pub struct ClassGraph {
    names: Vec<String>,
    by_name: HashMap<String, ClassRef>,
    defs: HashMap<ClassRef, ClassDef>,
    well_known: WellKnownRefs,
}

impl ClassGraph {
    pub fn builder() -> ClassGraphBuilder {
        ClassGraphBuilder::new()
    }

    pub fn name(&self, r: ClassRef) -> &str {
        &self.names[r.index()]
    }

    pub fn by_name(&self, name: &str) -> Option<ClassRef> {
        self.by_name.get(name).copied()
    }

    pub fn well_known(&self) -> &WellKnownRefs {
        &self.well_known
    }

    /// The hierarchy root (`java.lang.Object`).
    pub fn object(&self) -> ClassRef {
        self.well_known.object
    }

    pub fn cloneable(&self) -> ClassRef {
        self.well_known.cloneable
    }

    pub fn serializable(&self) -> ClassRef {
        self.well_known.serializable
    }

    pub fn string(&self) -> ClassRef {
        self.well_known.string
    }

    pub fn throwable(&self) -> ClassRef {
        self.well_known.throwable
    }

    /// `None` is the classpath-gap case, not an error.
    pub fn definition_or_missing(&self, r: ClassRef) -> Option<&ClassDef> {
        self.defs.get(&r)
    }

    /// Direct superclass, or `None` for the root and for missing
    /// definitions.
    pub fn superclass_of(&self, r: ClassRef) -> Option<ClassRef> {
        self.defs.get(&r).and_then(|d| d.superclass)
    }

    /// Directly declared interfaces; empty for missing definitions.
    pub fn declared_interfaces_of(&self, r: ClassRef) -> &[ClassRef] {
        self.defs.get(&r).map_or(&[], |d| d.interfaces.as_slice())
    }

    /// False for missing definitions.
    pub fn is_interface(&self, r: ClassRef) -> bool {
        self.defs.get(&r).is_some_and(|d| d.is_interface)
    }

    /// False for missing definitions.
    pub fn is_effectively_final(&self, r: ClassRef) -> bool {
        self.defs.get(&r).is_some_and(|d| d.is_effectively_final)
    }

    /// True when `r` or anything on its supertype closure has no
    /// definition. This is the predicate behind
    /// `TypeElement::is_based_on_missing_class`.
    pub fn is_missing_or_has_missing_supertype(&self, r: ClassRef) -> bool {
        let mut visited = HashSet::new();
        let mut worklist = vec![r];
        while let Some(current) = worklist.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(def) = self.defs.get(&current) else {
                return true;
            };
            if let Some(sup) = def.superclass {
                worklist.push(sup);
            }
            worklist.extend(def.interfaces.iter().copied());
        }
        false
    }

    /// Strict subtyping over both superclass and interface edges.
    ///
    /// Missing definitions contribute no edges, so the answer is
    /// conservatively `false` across a classpath gap.
    pub fn is_strict_subtype_of(&self, sub: ClassRef, sup: ClassRef) -> bool {
        if sub == sup {
            return false;
        }
        let mut visited = HashSet::new();
        let mut worklist = VecDeque::new();
        worklist.push_back(sub);
        while let Some(current) = worklist.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if current == sup {
                return true;
            }
            if let Some(def) = self.defs.get(&current) {
                if let Some(s) = def.superclass {
                    worklist.push_back(s);
                }
                worklist.extend(def.interfaces.iter().copied());
            }
        }
        false
    }

    pub fn is_subtype_of(&self, sub: ClassRef, sup: ClassRef) -> bool {
        sub == sup || self.is_strict_subtype_of(sub, sup)
    }
}

/// Builder for [`ClassGraph`]. The root, `Cloneable` and `Serializable` are
/// pre-defined; duplicate definitions are rejected.
#[derive(Debug)]
pub struct ClassGraphBuilder {
    names: Vec<String>,
    by_name: HashMap<String, ClassRef>,
    defs: HashMap<ClassRef, ClassDef>,
    well_known: WellKnownRefs,
}

impl ClassGraphBuilder {
    pub fn new() -> Self {
        let mut builder = ClassGraphBuilder {
            names: Vec::new(),
            by_name: HashMap::new(),
            defs: HashMap::new(),
            well_known: WellKnownRefs {
                object: ClassRef(0),
                cloneable: ClassRef(0),
                serializable: ClassRef(0),
                string: ClassRef(0),
                throwable: ClassRef(0),
            },
        };
        let object = builder.intern("java.lang.Object");
        let cloneable = builder.intern("java.lang.Cloneable");
        let serializable = builder.intern("java.io.Serializable");
        let string = builder.intern("java.lang.String");
        let throwable = builder.intern("java.lang.Throwable");
        builder.well_known = WellKnownRefs {
            object,
            cloneable,
            serializable,
            string,
            throwable,
        };
        builder.defs.insert(
            object,
            ClassDef {
                superclass: None,
                interfaces: Vec::new(),
                is_interface: false,
                is_effectively_final: false,
            },
        );
        for marker in [cloneable, serializable] {
            builder.defs.insert(
                marker,
                ClassDef {
                    superclass: Some(object),
                    interfaces: Vec::new(),
                    is_interface: true,
                    is_effectively_final: false,
                },
            );
        }
        builder
    }

    /// Interns a name without defining it. Safe to call repeatedly.
    pub fn intern(&mut self, name: &str) -> ClassRef {
        if let Some(&r) = self.by_name.get(name) {
            return r;
        }
        let r = ClassRef(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), r);
        r
    }

    pub fn object(&self) -> ClassRef {
        self.well_known.object
    }

    pub fn cloneable(&self) -> ClassRef {
        self.well_known.cloneable
    }

    pub fn serializable(&self) -> ClassRef {
        self.well_known.serializable
    }

    /// Defines a class extending `superclass` and implementing `interfaces`.
    pub fn add_class(
        &mut self,
        name: &str,
        superclass: ClassRef,
        interfaces: &[ClassRef],
    ) -> Result<ClassRef, GraphError> {
        self.define(
            name,
            ClassDef {
                superclass: Some(superclass),
                interfaces: interfaces.to_vec(),
                is_interface: false,
                is_effectively_final: false,
            },
        )
    }

    /// Defines a class known to have no subclasses.
    pub fn add_final_class(
        &mut self,
        name: &str,
        superclass: ClassRef,
        interfaces: &[ClassRef],
    ) -> Result<ClassRef, GraphError> {
        self.define(
            name,
            ClassDef {
                superclass: Some(superclass),
                interfaces: interfaces.to_vec(),
                is_interface: false,
                is_effectively_final: true,
            },
        )
    }

    /// Defines an interface extending `super_interfaces`.
    pub fn add_interface(
        &mut self,
        name: &str,
        super_interfaces: &[ClassRef],
    ) -> Result<ClassRef, GraphError> {
        let object = self.well_known.object;
        self.define(
            name,
            ClassDef {
                superclass: Some(object),
                interfaces: super_interfaces.to_vec(),
                is_interface: true,
                is_effectively_final: false,
            },
        )
    }

    /// Low-level entry: interns `name` and attaches `def` to it.
    pub fn define(&mut self, name: &str, def: ClassDef) -> Result<ClassRef, GraphError> {
        let r = self.intern(name);
        if self.defs.contains_key(&r) {
            return Err(GraphError::DuplicateClass {
                name: name.to_string(),
            });
        }
        self.defs.insert(r, def);
        Ok(r)
    }

    pub fn build(self) -> ClassGraph {
        ClassGraph {
            names: self.names,
            by_name: self.by_name,
            defs: self.defs,
            well_known: self.well_known,
        }
    }
}

impl Default for ClassGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
