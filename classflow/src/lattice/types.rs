//! The type lattice's value model.
//!
//! Every SSA value is abstracted by one [`TypeElement`]:
//!
//! ```text
//!                    top
//!           /         |         \
//!       single       wide      class / array
//!      /  |    \     /   \          |
//!    int float ...  long double    null
//!       \     |      |    |        /
//!                  bottom
//! ```
//!
//! `bottom` means "no runtime value seen yet" and doubles as the nullability
//! bottom: there is no contradictory reference type, only the contradictory
//! value. Reference elements are immutable and interned per [`Session`], so
//! equal shapes share one allocation and nullability variants are cheap to
//! hand out. A value of declared interface type `I` is anchored at the root
//! class and carries `{I}` in its interface set; the class position always
//! names an actual class.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::hierarchy::graph::{ClassGraph, ClassRef};
use crate::hierarchy::lub::compute_least_upper_bound_of_classes;
use crate::lattice::interfaces::{minimize_interfaces, InterfaceSet};
use crate::lattice::nullability::Nullability;
use crate::session::Session;

/// Primitive lattice elements. `Single` and `Wide` are the imprecise
/// per-width joins; the rest are concrete source-level primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Float,
    Long,
    Double,
    /// Any one-slot primitive.
    Single,
    /// Any two-slot primitive.
    Wide,
}

impl PrimitiveType {
    pub fn is_single_slot(self) -> bool {
        !self.is_wide_slot()
    }

    pub fn is_wide_slot(self) -> bool {
        matches!(
            self,
            PrimitiveType::Long | PrimitiveType::Double | PrimitiveType::Wide
        )
    }

    /// False for the per-width markers, true for concrete primitives.
    pub fn is_precise(self) -> bool {
        !matches!(self, PrimitiveType::Single | PrimitiveType::Wide)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Float => "float",
            PrimitiveType::Long => "long",
            PrimitiveType::Double => "double",
            PrimitiveType::Single => "single",
            PrimitiveType::Wide => "wide",
        };
        f.write_str(name)
    }
}

/// Declared (source-level) type, as it appears in signatures and on
/// instructions. Distinct from [`TypeElement`]: a declared type has no
/// nullability and no interface set of its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Class(ClassRef),
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn class(r: ClassRef) -> TypeRef {
        TypeRef::Class(r)
    }

    pub fn array(member: TypeRef) -> TypeRef {
        TypeRef::Array(Box::new(member))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeRef::Class(_) | TypeRef::Array(_))
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct ClassTypeData {
    class_ref: ClassRef,
    nullability: Nullability,
    interfaces: InterfaceSet,
}

/// Interned class-shaped reference type: an anchor class, the interfaces
/// the value is known to implement, and a nullability.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    data: Arc<ClassTypeData>,
}

impl ClassType {
    pub(crate) fn create(
        class_ref: ClassRef,
        interfaces: InterfaceSet,
        nullability: Nullability,
    ) -> ClassType {
        ClassType {
            data: Arc::new(ClassTypeData {
                class_ref,
                nullability,
                interfaces,
            }),
        }
    }

    pub fn class_ref(&self) -> ClassRef {
        self.data.class_ref
    }

    pub fn nullability(&self) -> Nullability {
        self.data.nullability
    }

    pub fn interfaces(&self) -> &InterfaceSet {
        &self.data.interfaces
    }

    pub fn ptr_eq(&self, other: &ClassType) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct ArrayTypeData {
    member: TypeElement,
    nullability: Nullability,
}

/// Interned array reference type. The member is the element type as read
/// out of the array, so reference members are always maybe-null.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArrayType {
    data: Arc<ArrayTypeData>,
}

impl ArrayType {
    pub(crate) fn create(member: TypeElement, nullability: Nullability) -> ArrayType {
        ArrayType {
            data: Arc::new(ArrayTypeData {
                member,
                nullability,
            }),
        }
    }

    pub fn member(&self) -> &TypeElement {
        &self.data.member
    }

    pub fn nullability(&self) -> Nullability {
        self.data.nullability
    }

    /// Number of array dimensions.
    pub fn nesting(&self) -> usize {
        match self.member() {
            TypeElement::Array(inner) => 1 + inner.nesting(),
            _ => 1,
        }
    }

    /// Innermost non-array member.
    pub fn base_member(&self) -> &TypeElement {
        match self.member() {
            TypeElement::Array(inner) => inner.base_member(),
            other => other,
        }
    }

    pub fn ptr_eq(&self, other: &ArrayType) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// One point of the type lattice.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeElement {
    /// No value flows here (yet). Also the contradiction element.
    Bottom,
    /// Anything; values of unknown or conflicting kind.
    Top,
    Primitive(PrimitiveType),
    /// The type of the `null` constant, definitely null by construction.
    Null,
    Class(ClassType),
    Array(ArrayType),
}

impl TypeElement {
    pub const BOTTOM: TypeElement = TypeElement::Bottom;
    pub const TOP: TypeElement = TypeElement::Top;
    pub const NULL: TypeElement = TypeElement::Null;
    pub const BOOLEAN: TypeElement = TypeElement::Primitive(PrimitiveType::Boolean);
    pub const BYTE: TypeElement = TypeElement::Primitive(PrimitiveType::Byte);
    pub const SHORT: TypeElement = TypeElement::Primitive(PrimitiveType::Short);
    pub const CHAR: TypeElement = TypeElement::Primitive(PrimitiveType::Char);
    pub const INT: TypeElement = TypeElement::Primitive(PrimitiveType::Int);
    pub const FLOAT: TypeElement = TypeElement::Primitive(PrimitiveType::Float);
    pub const LONG: TypeElement = TypeElement::Primitive(PrimitiveType::Long);
    pub const DOUBLE: TypeElement = TypeElement::Primitive(PrimitiveType::Double);
    pub const SINGLE: TypeElement = TypeElement::Primitive(PrimitiveType::Single);
    pub const WIDE: TypeElement = TypeElement::Primitive(PrimitiveType::Wide);

    /// Element for a value of declared class or interface type `class_ref`.
    ///
    /// In whole-program mode an interface ref is anchored at the root with
    /// itself as the interface set, and a class ref picks up the interfaces
    /// it implements. In per-file mode the ref is kept as-is with an empty
    /// set.
    pub fn class_type(
        session: &Session,
        class_ref: ClassRef,
        nullability: Nullability,
    ) -> TypeElement {
        let graph = session.graph();
        let (anchor, interfaces) = if session.whole_program() {
            let interfaces = session.implemented_interfaces(class_ref);
            let anchor = if graph.is_interface(class_ref) {
                graph.object()
            } else {
                class_ref
            };
            (anchor, interfaces)
        } else {
            (class_ref, InterfaceSet::empty())
        };
        TypeElement::Class(session.intern_class_type(anchor, interfaces, nullability))
    }

    /// Array element with the given member. Reference members are
    /// normalized to maybe-null before interning.
    pub fn array_type(
        session: &Session,
        member: TypeElement,
        nullability: Nullability,
    ) -> TypeElement {
        let member = member.as_maybe_null(session);
        TypeElement::Array(session.intern_array_type(member, nullability))
    }

    /// Element for a declared type, recursing through array dimensions.
    pub fn from_type_ref(
        session: &Session,
        type_ref: &TypeRef,
        nullability: Nullability,
    ) -> TypeElement {
        match type_ref {
            TypeRef::Primitive(p) => TypeElement::Primitive(*p),
            TypeRef::Class(r) => TypeElement::class_type(session, *r, nullability),
            TypeRef::Array(member) => {
                let member =
                    TypeElement::from_type_ref(session, member, Nullability::MaybeNull);
                TypeElement::array_type(session, member, nullability)
            }
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, TypeElement::Bottom)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, TypeElement::Top)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypeElement::Null)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeElement::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            TypeElement::Null | TypeElement::Class(_) | TypeElement::Array(_)
        )
    }

    pub fn is_class(&self) -> bool {
        matches!(self, TypeElement::Class(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeElement::Array(_))
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            TypeElement::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            TypeElement::Array(a) => Some(a),
            _ => None,
        }
    }

    /// True for every element except `top` and the per-width primitive
    /// markers.
    pub fn is_precise(&self) -> bool {
        match self {
            TypeElement::Top => false,
            TypeElement::Primitive(p) => p.is_precise(),
            _ => true,
        }
    }

    /// Nullability of this element. Primitives are never null; `top` and
    /// `bottom` answer maybe-null, no code path gives that answer weight.
    pub fn nullability(&self) -> Nullability {
        match self {
            TypeElement::Bottom | TypeElement::Top => Nullability::MaybeNull,
            TypeElement::Primitive(_) => Nullability::DefinitelyNotNull,
            TypeElement::Null => Nullability::DefinitelyNull,
            TypeElement::Class(c) => c.nullability(),
            TypeElement::Array(a) => a.nullability(),
        }
    }

    /// Same shape with the given nullability. Returns `self` unchanged (the
    /// same interned instance) when nothing would change, and leaves
    /// non-reference elements and `null` alone.
    pub fn get_or_create_variant(
        &self,
        session: &Session,
        nullability: Nullability,
    ) -> TypeElement {
        match self {
            TypeElement::Class(c) => {
                if c.nullability() == nullability {
                    self.clone()
                } else {
                    TypeElement::Class(session.intern_class_type(
                        c.class_ref(),
                        c.interfaces().clone(),
                        nullability,
                    ))
                }
            }
            TypeElement::Array(a) => {
                if a.nullability() == nullability {
                    self.clone()
                } else {
                    TypeElement::Array(
                        session.intern_array_type(a.member().clone(), nullability),
                    )
                }
            }
            _ => self.clone(),
        }
    }

    pub fn as_maybe_null(&self, session: &Session) -> TypeElement {
        self.get_or_create_variant(session, Nullability::MaybeNull)
    }

    /// Joins the current nullability with `other`, keeping the shape.
    pub fn join_nullability(&self, session: &Session, other: Nullability) -> TypeElement {
        self.get_or_create_variant(session, self.nullability().join(other))
    }

    /// True if this element mentions a class whose definition (or any of
    /// whose supertypes) is absent from the graph.
    pub fn is_based_on_missing_class(&self, graph: &ClassGraph) -> bool {
        match self {
            TypeElement::Class(c) => {
                graph.is_missing_or_has_missing_supertype(c.class_ref())
                    || c.interfaces()
                        .iter()
                        .any(|itf| graph.is_missing_or_has_missing_supertype(itf))
            }
            TypeElement::Array(a) => a.member().is_based_on_missing_class(graph),
            _ => false,
        }
    }

    /// Identity comparison: interned payloads compare by pointer, carriers
    /// without payload by value.
    pub fn ptr_eq(&self, other: &TypeElement) -> bool {
        match (self, other) {
            (TypeElement::Class(a), TypeElement::Class(b)) => a.ptr_eq(b),
            (TypeElement::Array(a), TypeElement::Array(b)) => a.ptr_eq(b),
            _ => self == other,
        }
    }

    /// Rewrites every class ref through `mapping`, preserving instance
    /// identity when the mapping leaves this element untouched.
    ///
    /// An interface that the mapping turns into a class (interfaces can be
    /// merged into their unique implementation) is moved out of the
    /// interface set and folded into the anchor.
    pub fn fixup_class_refs<F>(&self, session: &Session, mapping: &F) -> TypeElement
    where
        F: Fn(ClassRef) -> ClassRef,
    {
        match self {
            TypeElement::Class(c) => {
                let graph = session.graph();
                let mapped_anchor = mapping(c.class_ref());
                let mut changed = mapped_anchor != c.class_ref();
                let mut still_interfaces: Vec<ClassRef> = Vec::new();
                let mut turned_classes: Vec<ClassRef> = Vec::new();
                for itf in c.interfaces().iter() {
                    let mapped = mapping(itf);
                    changed |= mapped != itf;
                    // A missing definition cannot prove the mapped ref
                    // stopped being an interface, so it stays in the set.
                    let known_class = graph
                        .definition_or_missing(mapped)
                        .is_some_and(|def| !def.is_interface);
                    if known_class {
                        turned_classes.push(mapped);
                    } else {
                        still_interfaces.push(mapped);
                    }
                }
                if !changed {
                    return self.clone();
                }
                let object = graph.object();
                let mut anchor = mapped_anchor;
                for turned in turned_classes {
                    anchor = if anchor == object {
                        turned
                    } else {
                        compute_least_upper_bound_of_classes(graph, anchor, turned)
                    };
                }
                let interfaces = minimize_interfaces(graph, still_interfaces);
                TypeElement::Class(session.intern_class_type(
                    anchor,
                    interfaces,
                    c.nullability(),
                ))
            }
            TypeElement::Array(a) => {
                let member = a.member().fixup_class_refs(session, mapping);
                if member.ptr_eq(a.member()) {
                    self.clone()
                } else {
                    TypeElement::Array(session.intern_array_type(member, a.nullability()))
                }
            }
            _ => self.clone(),
        }
    }

    /// Renders with class names resolved through `graph`.
    pub fn display<'a>(&'a self, graph: &'a ClassGraph) -> DisplayTypeElement<'a> {
        DisplayTypeElement { ty: self, graph }
    }
}

#[derive(Debug)]
pub struct DisplayTypeElement<'a> {
    ty: &'a TypeElement,
    graph: &'a ClassGraph,
}

impl fmt::Display for DisplayTypeElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            TypeElement::Bottom => f.write_str("bottom"),
            TypeElement::Top => f.write_str("top"),
            TypeElement::Primitive(p) => write!(f, "{p}"),
            TypeElement::Null => f.write_str("null"),
            TypeElement::Class(c) => {
                write!(
                    f,
                    "{} {}",
                    c.nullability(),
                    self.graph.name(c.class_ref())
                )?;
                if !c.interfaces().is_empty() {
                    write!(f, " {}", c.interfaces().display(self.graph))?;
                }
                Ok(())
            }
            TypeElement::Array(a) => {
                write!(
                    f,
                    "{} {}[]",
                    a.nullability(),
                    a.member().display(self.graph)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Options;

    fn session_with(whole_program: bool) -> Session {
        let mut b = ClassGraph::builder();
        let object = b.object();
        let closeable = b.add_interface("Closeable", &[]).unwrap();
        let channel = b.add_interface("Channel", &[closeable]).unwrap();
        b.add_class("Socket", object, &[channel]).unwrap();
        b.add_class("Plain", object, &[]).unwrap();
        Session::new(b.build(), Options { whole_program })
    }

    fn named(session: &Session, name: &str) -> ClassRef {
        session.graph().by_name(name).unwrap()
    }

    #[test]
    fn test_interface_type_is_anchored_at_the_root() {
        let session = session_with(true);
        let channel = named(&session, "Channel");
        let ty = TypeElement::class_type(&session, channel, Nullability::MaybeNull);
        let class = ty.as_class().unwrap();
        assert_eq!(class.class_ref(), session.graph().object());
        assert_eq!(class.interfaces(), &InterfaceSet::singleton(channel));
    }

    #[test]
    fn test_class_type_picks_up_implemented_interfaces() {
        let session = session_with(true);
        let socket = named(&session, "Socket");
        let channel = named(&session, "Channel");
        let ty = TypeElement::class_type(&session, socket, Nullability::MaybeNull);
        let class = ty.as_class().unwrap();
        assert_eq!(class.class_ref(), socket);
        // Closeable is implied by Channel and pruned.
        assert_eq!(class.interfaces(), &InterfaceSet::singleton(channel));
    }

    #[test]
    fn test_per_file_mode_keeps_refs_bare() {
        let session = session_with(false);
        let channel = named(&session, "Channel");
        let ty = TypeElement::class_type(&session, channel, Nullability::MaybeNull);
        let class = ty.as_class().unwrap();
        assert_eq!(class.class_ref(), channel);
        assert!(class.interfaces().is_empty());
    }

    #[test]
    fn test_array_members_read_as_maybe_null() {
        let session = session_with(true);
        let socket = named(&session, "Socket");
        let ty = TypeElement::from_type_ref(
            &session,
            &TypeRef::array(TypeRef::class(socket)),
            Nullability::DefinitelyNotNull,
        );
        let array = ty.as_array().unwrap();
        assert_eq!(array.nullability(), Nullability::DefinitelyNotNull);
        assert_eq!(array.member().nullability(), Nullability::MaybeNull);
        assert_eq!(array.nesting(), 1);
    }

    #[test]
    fn test_nesting_and_base_member() {
        let session = session_with(true);
        let int_matrix = TypeElement::from_type_ref(
            &session,
            &TypeRef::array(TypeRef::array(TypeRef::Primitive(PrimitiveType::Int))),
            Nullability::MaybeNull,
        );
        let array = int_matrix.as_array().unwrap();
        assert_eq!(array.nesting(), 2);
        assert_eq!(array.base_member(), &TypeElement::INT);
    }

    #[test]
    fn test_variant_requests_preserve_identity_when_unchanged() {
        let session = session_with(true);
        let socket = named(&session, "Socket");
        let ty = TypeElement::class_type(&session, socket, Nullability::MaybeNull);
        let same = ty.get_or_create_variant(&session, Nullability::MaybeNull);
        assert!(same.ptr_eq(&ty));
        let not_null = ty.get_or_create_variant(&session, Nullability::DefinitelyNotNull);
        assert!(!not_null.ptr_eq(&ty));
        assert_eq!(not_null.nullability(), Nullability::DefinitelyNotNull);
        // The variant is interned: asking again yields the same instance.
        let again = ty.get_or_create_variant(&session, Nullability::DefinitelyNotNull);
        assert!(again.ptr_eq(&not_null));
    }

    #[test]
    fn test_null_and_primitives_have_fixed_nullability() {
        let session = session_with(true);
        assert_eq!(TypeElement::NULL.nullability(), Nullability::DefinitelyNull);
        assert_eq!(TypeElement::INT.nullability(), Nullability::DefinitelyNotNull);
        let same = TypeElement::NULL.get_or_create_variant(&session, Nullability::MaybeNull);
        assert_eq!(same, TypeElement::NULL);
    }

    #[test]
    fn test_is_precise() {
        assert!(TypeElement::BOTTOM.is_precise());
        assert!(TypeElement::NULL.is_precise());
        assert!(TypeElement::INT.is_precise());
        assert!(!TypeElement::TOP.is_precise());
        assert!(!TypeElement::SINGLE.is_precise());
        assert!(!TypeElement::WIDE.is_precise());
    }

    #[test]
    fn test_missing_class_detection() {
        let mut b = ClassGraph::builder();
        let ghost = b.intern("Ghost");
        let hollow_super = b.intern("HollowSuper");
        let gappy = b.add_interface("Gappy", &[hollow_super]).unwrap();
        let solid_itf = b.add_interface("SolidItf", &[]).unwrap();
        b.add_class("Shaky", b.object(), &[gappy]).unwrap();
        b.add_class("Solid", b.object(), &[solid_itf]).unwrap();
        let session = Session::new(b.build(), Options::default());
        let graph = session.graph();

        let ghost_ty = TypeElement::class_type(&session, ghost, Nullability::MaybeNull);
        assert!(ghost_ty.is_based_on_missing_class(graph));

        let ghost_array = TypeElement::array_type(&session, ghost_ty, Nullability::MaybeNull);
        assert!(ghost_array.is_based_on_missing_class(graph));

        // Shaky itself resolves, but its interface set reaches a gap.
        let shaky = graph.by_name("Shaky").unwrap();
        let shaky_ty = TypeElement::class_type(&session, shaky, Nullability::MaybeNull);
        assert!(shaky_ty.is_based_on_missing_class(graph));

        let solid = graph.by_name("Solid").unwrap();
        let solid_ty = TypeElement::class_type(&session, solid, Nullability::MaybeNull);
        assert!(!solid_ty.is_based_on_missing_class(graph));
        assert!(!TypeElement::INT.is_based_on_missing_class(graph));
    }

    #[test]
    fn test_fixup_identity_mapping_returns_same_instance() {
        let session = session_with(true);
        let socket = named(&session, "Socket");
        let ty = TypeElement::class_type(&session, socket, Nullability::MaybeNull);
        let fixed = ty.fixup_class_refs(&session, &|r| r);
        assert!(fixed.ptr_eq(&ty));

        let array = TypeElement::array_type(&session, ty, Nullability::DefinitelyNotNull);
        let fixed = array.fixup_class_refs(&session, &|r| r);
        assert!(fixed.ptr_eq(&array));
    }

    #[test]
    fn test_fixup_renames_anchor_and_interfaces() {
        let session = session_with(true);
        let socket = named(&session, "Socket");
        let plain = named(&session, "Plain");
        let ty = TypeElement::class_type(&session, socket, Nullability::MaybeNull);
        let fixed = ty.fixup_class_refs(&session, &|r| if r == socket { plain } else { r });
        let class = fixed.as_class().unwrap();
        assert_eq!(class.class_ref(), plain);
        assert_eq!(class.interfaces(), ty.as_class().unwrap().interfaces());
    }

    #[test]
    fn test_fixup_absorbs_interface_merged_into_class() {
        let session = session_with(true);
        let channel = named(&session, "Channel");
        let socket = named(&session, "Socket");
        let itf_ty = TypeElement::class_type(&session, channel, Nullability::MaybeNull);
        // Channel collapses into its lone implementation.
        let fixed =
            itf_ty.fixup_class_refs(&session, &|r| if r == channel { socket } else { r });
        let class = fixed.as_class().unwrap();
        assert_eq!(class.class_ref(), socket);
        assert!(class.interfaces().is_empty());
        assert_eq!(class.nullability(), Nullability::MaybeNull);
    }

    #[test]
    fn test_display() {
        let session = session_with(true);
        let graph = session.graph();
        assert_eq!(TypeElement::BOTTOM.display(graph).to_string(), "bottom");
        assert_eq!(TypeElement::INT.display(graph).to_string(), "int");
        let socket = named(&session, "Socket");
        let ty = TypeElement::class_type(&session, socket, Nullability::DefinitelyNotNull);
        assert_eq!(ty.display(graph).to_string(), "@NotNull Socket {Channel}");
        let arr = TypeElement::array_type(&session, TypeElement::INT, Nullability::MaybeNull);
        assert_eq!(arr.display(graph).to_string(), "@Nullable int[]");
    }
}
