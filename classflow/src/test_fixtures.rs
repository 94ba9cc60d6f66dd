//! Shared class hierarchy fixture for tests.
//!
//! A small slice of the Java platform hierarchy, large enough to exercise
//! interface sets, class chains and the collection interfaces without
//! loading anything real.

use crate::hierarchy::graph::{ClassGraph, ClassRef};
use crate::session::{Options, Session};

fn java_graph() -> ClassGraph {
    let mut b = ClassGraph::builder();
    let object = b.object();
    let serializable = b.serializable();
    let cloneable = b.cloneable();

    let comparable = b.add_interface("java.lang.Comparable", &[]).unwrap();
    let char_sequence = b.add_interface("java.lang.CharSequence", &[]).unwrap();
    let appendable = b.add_interface("java.lang.Appendable", &[]).unwrap();
    let iterable = b.add_interface("java.lang.Iterable", &[]).unwrap();
    let collection = b.add_interface("java.util.Collection", &[iterable]).unwrap();
    let list = b.add_interface("java.util.List", &[collection]).unwrap();
    let queue = b.add_interface("java.util.Queue", &[collection]).unwrap();
    let deque = b.add_interface("java.util.Deque", &[queue]).unwrap();

    b.add_final_class(
        "java.lang.String",
        object,
        &[serializable, comparable, char_sequence],
    )
    .unwrap();
    b.add_class(
        "java.lang.StringBuffer",
        object,
        &[appendable, char_sequence, serializable],
    )
    .unwrap();

    let throwable = b
        .add_class("java.lang.Throwable", object, &[serializable])
        .unwrap();
    let exception = b.add_class("java.lang.Exception", throwable, &[]).unwrap();
    b.add_class("java.lang.RuntimeException", exception, &[])
        .unwrap();

    b.add_class("java.util.ArrayList", object, &[list]).unwrap();
    b.add_class(
        "java.util.LinkedList",
        object,
        &[list, deque, cloneable, serializable],
    )
    .unwrap();

    b.build()
}

/// Whole-program session over the fixture hierarchy.
pub(crate) fn java_session() -> Session {
    Session::new(java_graph(), Options { whole_program: true })
}

/// Per-file session over the same hierarchy; interface sets stay empty.
pub(crate) fn d8_session() -> Session {
    Session::new(
        java_graph(),
        Options {
            whole_program: false,
        },
    )
}

/// Looks a fixture class up by name.
pub(crate) fn named(session: &Session, name: &str) -> ClassRef {
    session
        .graph()
        .by_name(name)
        .unwrap_or_else(|| panic!("fixture has no class named {}", name))
}
