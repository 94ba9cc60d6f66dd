//! Shared helpers for integration tests
// Not every test target uses every helper.
#![allow(dead_code)]

use classflow::{
    ClassGraph, ClassGraphBuilder, ClassRef, MethodSignature, Options, Session, TypeRef,
};

/// A slice of the Java platform hierarchy shared by the scenario tests.
pub fn sample_graph() -> ClassGraph {
    let mut b = ClassGraphBuilder::new();
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

/// Whole-program session over [`sample_graph`].
pub fn sample_session() -> Session {
    Session::new(sample_graph(), Options { whole_program: true })
}

/// Per-file session over [`sample_graph`]; interface sets stay empty.
pub fn per_file_session() -> Session {
    Session::new(
        sample_graph(),
        Options {
            whole_program: false,
        },
    )
}

pub fn named(session: &Session, name: &str) -> ClassRef {
    session
        .graph()
        .by_name(name)
        .unwrap_or_else(|| panic!("sample hierarchy has no class named {}", name))
}

/// Static method signature on `java.lang.String` with the given parameters.
pub fn static_sig(session: &Session, params: Vec<TypeRef>) -> MethodSignature {
    MethodSignature {
        holder: named(session, "java.lang.String"),
        is_static: true,
        params,
        return_type: None,
    }
}

/// Instance method signature; argument 0 becomes the receiver.
pub fn instance_sig(session: &Session, holder: &str, params: Vec<TypeRef>) -> MethodSignature {
    MethodSignature {
        holder: named(session, holder),
        is_static: false,
        params,
        return_type: None,
    }
}
