//! Method bodies in SSA form.
//!
//! A [`MethodBody`] is a flat arena of blocks, instructions, phis and
//! values, built once through [`MethodBodyBuilder`] and then mutated only in
//! its value types. Def-use edges are recorded eagerly at construction, so
//! the flow analysis never scans instructions to find users.
//!
//! The per-instruction transfer function lives here too
//! ([`MethodBody::compute_instruction_type`]): given the current operand
//! types it answers the output type, monotone in every operand. Exception
//! edges are not modeled; a handler entry receives its exception through
//! [`InstrKind::MoveException`] and everything else flows through ordinary
//! block edges.
//!
//! # Module structure
//!
//! - `builder`: construction and structural validation

use std::collections::BTreeSet;
use std::fmt;

use crate::diagnostics;
use crate::hierarchy::graph::ClassRef;
use crate::lattice::nullability::Nullability;
use crate::lattice::types::{PrimitiveType, TypeElement, TypeRef};
use crate::session::Session;

pub mod builder;

pub use builder::MethodBodyBuilder;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Index of an SSA value in its [`MethodBody`].
    ValueId,
    "v"
);
id_type!(
    /// Index of an instruction in its [`MethodBody`].
    InstrId,
    "i"
);
id_type!(
    /// Index of a phi in its [`MethodBody`].
    PhiId,
    "p"
);
id_type!(
    /// Index of a basic block in its [`MethodBody`].
    BlockId,
    "b"
);

/// What defines a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueDef {
    /// The i-th method argument, receiver first for instance methods.
    Argument(usize),
    Instr(InstrId),
    Phi(PhiId),
}

/// An SSA value: its definition, its current lattice element, and the
/// instructions and phis reading it.
#[derive(Clone, Debug)]
pub struct Value {
    def: ValueDef,
    ty: TypeElement,
    users: BTreeSet<InstrId>,
    phi_users: BTreeSet<PhiId>,
}

impl Value {
    pub fn def(&self) -> ValueDef {
        self.def
    }

    pub fn ty(&self) -> &TypeElement {
        &self.ty
    }

    pub fn users(&self) -> &BTreeSet<InstrId> {
        &self.users
    }

    pub fn phi_users(&self) -> &BTreeSet<PhiId> {
        &self.phi_users
    }
}

#[derive(Clone, Debug)]
pub struct Phi {
    block: BlockId,
    operands: Vec<ValueId>,
    out: ValueId,
}

impl Phi {
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Operands in predecessor order (ascending source block index).
    pub fn operands(&self) -> &[ValueId] {
        &self.operands
    }

    pub fn out(&self) -> ValueId {
        self.out
    }
}

#[derive(Clone, Debug)]
pub struct Instruction {
    kind: InstrKind,
    operands: Vec<ValueId>,
    out: Option<ValueId>,
    block: BlockId,
}

impl Instruction {
    pub fn kind(&self) -> &InstrKind {
        &self.kind
    }

    pub fn operands(&self) -> &[ValueId] {
        &self.operands
    }

    pub fn out(&self) -> Option<ValueId> {
        self.out
    }

    pub fn block(&self) -> BlockId {
        self.block
    }
}

#[derive(Clone, Debug)]
pub struct BasicBlock {
    predecessors: Vec<BlockId>,
    successors: Vec<BlockId>,
    phis: Vec<PhiId>,
    instructions: Vec<InstrId>,
}

impl BasicBlock {
    /// Predecessors in ascending block order; phi operands line up with
    /// this ordering.
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    pub fn phis(&self) -> &[PhiId] {
        &self.phis
    }

    pub fn instructions(&self) -> &[InstrId] {
        &self.instructions
    }
}

/// Signature of the method a body belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    pub holder: ClassRef,
    pub is_static: bool,
    pub params: Vec<TypeRef>,
    pub return_type: Option<TypeRef>,
}

impl MethodSignature {
    /// Number of argument values, receiver included.
    pub fn argument_count(&self) -> usize {
        self.params.len() + usize::from(!self.is_static)
    }
}

/// Instruction kinds, reduced to what drives typing. Operand shapes are
/// noted per kind; terminators carry their targets inline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstrKind {
    /// Materializes the i-th argument. No operands.
    Argument { index: usize },
    /// Numeric constant; `value` holds the raw bits. No operands.
    ConstNumber { ty: PrimitiveType, value: i64 },
    /// The `null` constant. No operands.
    ConstNull,
    /// String constant. No operands.
    ConstString { value: String },
    /// Allocation of `class`. No operands.
    NewInstance { class: ClassRef },
    /// Allocation of the array type `ty`. Operand: length.
    NewArray { ty: TypeRef },
    /// Read of an array element. Operands: array, index.
    ArrayGet,
    /// Operand: array.
    ArrayLength,
    /// Operand: the value to cast.
    CheckCast { target: TypeRef },
    /// Operand: the value to test.
    InstanceOf { target: TypeRef },
    /// Call; produces a value only for non-void `return_type`. Operands:
    /// any number of call arguments.
    InvokeMethod { return_type: Option<TypeRef> },
    /// Field read. Operands: the receiver for an instance field, none for
    /// a static one.
    FieldGet { ty: TypeRef },
    /// Two-operand arithmetic on `ty`.
    Binop { ty: PrimitiveType },
    /// Numeric conversion. Operand: the value to convert.
    NumberConversion {
        from: PrimitiveType,
        to: PrimitiveType,
    },
    /// First instruction of a handler; materializes the caught exception
    /// of class `ty`. No operands.
    MoveException { ty: ClassRef },
    /// Refinement fact: the operand is not null past this point.
    AssumeNotNull,
    /// Instruction the analysis knows nothing about. Any operands.
    Opaque,
    /// Terminator. No operands.
    Goto { target: BlockId },
    /// Terminator. Operand: condition.
    If {
        then_target: BlockId,
        else_target: BlockId,
    },
    /// Terminator. Operand: the returned value, absent for void.
    Return,
    /// Terminator. Operand: the thrown exception.
    Throw,
}

impl InstrKind {
    pub fn name(&self) -> &'static str {
        match self {
            InstrKind::Argument { .. } => "argument",
            InstrKind::ConstNumber { .. } => "const-number",
            InstrKind::ConstNull => "const-null",
            InstrKind::ConstString { .. } => "const-string",
            InstrKind::NewInstance { .. } => "new-instance",
            InstrKind::NewArray { .. } => "new-array",
            InstrKind::ArrayGet => "array-get",
            InstrKind::ArrayLength => "array-length",
            InstrKind::CheckCast { .. } => "check-cast",
            InstrKind::InstanceOf { .. } => "instance-of",
            InstrKind::InvokeMethod { .. } => "invoke-method",
            InstrKind::FieldGet { .. } => "field-get",
            InstrKind::Binop { .. } => "binop",
            InstrKind::NumberConversion { .. } => "number-conversion",
            InstrKind::MoveException { .. } => "move-exception",
            InstrKind::AssumeNotNull => "assume-not-null",
            InstrKind::Opaque => "opaque",
            InstrKind::Goto { .. } => "goto",
            InstrKind::If { .. } => "if",
            InstrKind::Return => "return",
            InstrKind::Throw => "throw",
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstrKind::Goto { .. } | InstrKind::If { .. } | InstrKind::Return | InstrKind::Throw
        )
    }

    /// Branch targets of a terminator, empty otherwise.
    pub fn targets(&self) -> Vec<BlockId> {
        match self {
            InstrKind::Goto { target } => vec![*target],
            InstrKind::If {
                then_target,
                else_target,
            } => vec![*then_target, *else_target],
            _ => Vec::new(),
        }
    }

    pub fn produces_value(&self) -> bool {
        match self {
            InstrKind::InvokeMethod { return_type } => return_type.is_some(),
            _ => !self.is_terminator(),
        }
    }

    /// True when the output type never depends on operand types, so one
    /// evaluation at seeding time is final.
    pub fn has_invariant_out_type(&self) -> bool {
        !matches!(
            self,
            InstrKind::Argument { .. }
                | InstrKind::ArrayGet
                | InstrKind::CheckCast { .. }
                | InstrKind::AssumeNotNull
        ) && self.produces_value()
    }

    /// Exact operand count where one exists; `None` for variable shapes.
    fn expected_operands(&self) -> Option<usize> {
        match self {
            InstrKind::Argument { .. }
            | InstrKind::ConstNumber { .. }
            | InstrKind::ConstNull
            | InstrKind::ConstString { .. }
            | InstrKind::NewInstance { .. }
            | InstrKind::MoveException { .. }
            | InstrKind::Goto { .. } => Some(0),
            InstrKind::NewArray { .. }
            | InstrKind::ArrayLength
            | InstrKind::CheckCast { .. }
            | InstrKind::InstanceOf { .. }
            | InstrKind::NumberConversion { .. }
            | InstrKind::AssumeNotNull
            | InstrKind::If { .. }
            | InstrKind::Throw => Some(1),
            InstrKind::ArrayGet | InstrKind::Binop { .. } => Some(2),
            InstrKind::InvokeMethod { .. }
            | InstrKind::FieldGet { .. }
            | InstrKind::Opaque
            | InstrKind::Return => None,
        }
    }
}

#[derive(Debug)]
pub struct MethodBody {
    signature: MethodSignature,
    blocks: Vec<BasicBlock>,
    instructions: Vec<Instruction>,
    values: Vec<Value>,
    phis: Vec<Phi>,
    arguments: Vec<ValueId>,
}

impl MethodBody {
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    pub fn instruction(&self, id: InstrId) -> &Instruction {
        &self.instructions[id.index()]
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn value_type(&self, id: ValueId) -> &TypeElement {
        self.values[id.index()].ty()
    }

    pub fn value_ids(&self) -> impl Iterator<Item = ValueId> {
        (0..self.values.len() as u32).map(ValueId)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn phi(&self, id: PhiId) -> &Phi {
        &self.phis[id.index()]
    }

    pub fn phi_ids(&self) -> impl Iterator<Item = PhiId> {
        (0..self.phis.len() as u32).map(PhiId)
    }

    /// Argument values in argument order.
    pub fn arguments(&self) -> &[ValueId] {
        &self.arguments
    }

    pub(crate) fn set_value_type(&mut self, id: ValueId, ty: TypeElement) {
        self.values[id.index()].ty = ty;
    }

    /// Declared type of the i-th argument. The receiver of an instance
    /// method is its holder, known not-null on entry; parameters start
    /// maybe-null.
    pub fn argument_type(&self, session: &Session, index: usize) -> TypeElement {
        if !self.signature.is_static && index == 0 {
            return TypeElement::class_type(
                session,
                self.signature.holder,
                Nullability::DefinitelyNotNull,
            );
        }
        let param = &self.signature.params[index - usize::from(!self.signature.is_static)];
        TypeElement::from_type_ref(session, param, Nullability::MaybeNull)
    }

    /// Output type of `id` under the current operand types.
    pub fn compute_instruction_type(&self, session: &Session, id: InstrId) -> TypeElement {
        let instr = self.instruction(id);
        let operand = |i: usize| self.value_type(instr.operands[i]);
        match instr.kind() {
            InstrKind::Argument { index } => self.argument_type(session, *index),
            InstrKind::ConstNumber { ty, .. } => TypeElement::Primitive(*ty),
            InstrKind::ConstNull => TypeElement::NULL,
            InstrKind::ConstString { .. } => TypeElement::class_type(
                session,
                session.graph().string(),
                Nullability::DefinitelyNotNull,
            ),
            InstrKind::NewInstance { class } => {
                TypeElement::class_type(session, *class, Nullability::DefinitelyNotNull)
            }
            InstrKind::NewArray { ty } => {
                TypeElement::from_type_ref(session, ty, Nullability::DefinitelyNotNull)
            }
            InstrKind::ArrayGet => match operand(0) {
                TypeElement::Array(a) => a.member().clone(),
                // Reading from definitely-null (or not-yet-seen) arrays
                // yields no value.
                TypeElement::Null | TypeElement::Bottom => TypeElement::Bottom,
                other => {
                    diagnostics::emit_imprecise_array_access(
                        &other.display(session.graph()).to_string(),
                    );
                    TypeElement::Top
                }
            },
            InstrKind::ArrayLength | InstrKind::InstanceOf { .. } => TypeElement::INT,
            InstrKind::CheckCast { target } => {
                let in_type = operand(0);
                if in_type.is_bottom() {
                    TypeElement::Bottom
                } else {
                    TypeElement::from_type_ref(session, target, in_type.nullability())
                }
            }
            InstrKind::InvokeMethod { return_type } => match return_type {
                Some(ty) => TypeElement::from_type_ref(session, ty, Nullability::MaybeNull),
                None => {
                    debug_assert!(false, "void invoke has no output value");
                    TypeElement::Bottom
                }
            },
            InstrKind::FieldGet { ty } => {
                TypeElement::from_type_ref(session, ty, Nullability::MaybeNull)
            }
            InstrKind::Binop { ty } => TypeElement::Primitive(*ty),
            InstrKind::NumberConversion { to, .. } => TypeElement::Primitive(*to),
            InstrKind::MoveException { ty } => {
                TypeElement::class_type(session, *ty, Nullability::DefinitelyNotNull)
            }
            InstrKind::AssumeNotNull => {
                let in_type = operand(0);
                if in_type.is_bottom() {
                    TypeElement::Bottom
                } else {
                    in_type.as_meet_with_not_null(session)
                }
            }
            InstrKind::Opaque => {
                diagnostics::emit_opaque_instruction();
                TypeElement::Top
            }
            InstrKind::Goto { .. }
            | InstrKind::If { .. }
            | InstrKind::Return
            | InstrKind::Throw => {
                debug_assert!(false, "terminators have no output value");
                TypeElement::Bottom
            }
        }
    }

    /// Join of the phi's operand types.
    pub fn compute_phi_type(&self, session: &Session, id: PhiId) -> TypeElement {
        let phi = self.phi(id);
        TypeElement::join_many(
            session,
            phi.operands.iter().map(|&v| self.value_type(v)),
        )
    }

    /// Rewrites every class ref in the body (value types, instruction
    /// payloads and the signature) through `mapping`.
    ///
    /// Returns the phis whose value type changed; their strongly-connected
    /// neighborhoods need the cycle repair in
    /// [`crate::analysis::repair_phi_cycles`] before the types are trusted
    /// again.
    pub fn apply_class_mapping<F>(&mut self, session: &Session, mapping: &F) -> Vec<PhiId>
    where
        F: Fn(ClassRef) -> ClassRef,
    {
        let mut changed_phis = Vec::new();
        for idx in 0..self.values.len() {
            let old = self.values[idx].ty.clone();
            let new = old.fixup_class_refs(session, mapping);
            if !new.ptr_eq(&old) {
                if let ValueDef::Phi(phi) = self.values[idx].def {
                    changed_phis.push(phi);
                }
                self.values[idx].ty = new;
            }
        }
        for instr in &mut self.instructions {
            match &mut instr.kind {
                InstrKind::NewInstance { class } => *class = mapping(*class),
                InstrKind::NewArray { ty } => map_type_ref_in_place(ty, mapping),
                InstrKind::CheckCast { target } | InstrKind::InstanceOf { target } => {
                    map_type_ref_in_place(target, mapping)
                }
                InstrKind::InvokeMethod {
                    return_type: Some(ty),
                }
                | InstrKind::FieldGet { ty } => map_type_ref_in_place(ty, mapping),
                InstrKind::MoveException { ty } => *ty = mapping(*ty),
                _ => {}
            }
        }
        self.signature.holder = mapping(self.signature.holder);
        for param in &mut self.signature.params {
            map_type_ref_in_place(param, mapping);
        }
        if let Some(ret) = &mut self.signature.return_type {
            map_type_ref_in_place(ret, mapping);
        }
        changed_phis
    }
}

fn map_type_ref_in_place<F>(ty: &mut TypeRef, mapping: &F)
where
    F: Fn(ClassRef) -> ClassRef,
{
    match ty {
        TypeRef::Primitive(_) => {}
        TypeRef::Class(r) => *r = mapping(*r),
        TypeRef::Array(member) => map_type_ref_in_place(member, mapping),
    }
}
