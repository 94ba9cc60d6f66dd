//! Recovery pass for phi types after an external rewrite.
//!
//! [`MethodBody::apply_class_mapping`] rewrites every stored type through a
//! class mapping, value by value. A phi whose type changed may sit on a
//! cycle of phis, and the stale joins along that cycle cannot be fixed by
//! local recomputation in either single direction. The repair runs in
//! three phases:
//!
//! ```text
//!   1. expand   follow phi-to-phi user edges from the changed phis and
//!               reset every reached phi to bottom
//!   2. rebuild  widen the reset region to its fixed point, with
//!               propagation restricted to the region
//!   3. settle   narrow the instruction users of the region so downstream
//!               types follow the rebuilt phis
//! ```
//!
//! Everything outside the region was already rewritten consistently, so
//! the restriction in phase 2 keeps the rebuild from disturbing it.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::analysis::type_analysis::{is_at_fixed_point, TypeAnalysis};
use crate::ir::{MethodBody, PhiId, ValueId};
use crate::lattice::types::TypeElement;
use crate::session::Session;

/// Rebuilds the types of the phi cycles reachable from `seeds` and
/// re-settles their downstream users. `seeds` are the phis whose stored
/// type was changed by a rewrite; passing no seeds is a no-op.
pub fn repair_phi_cycles<I>(session: &Session, body: &mut MethodBody, seeds: I)
where
    I: IntoIterator<Item = PhiId>,
{
    let mut affected_phis: HashSet<PhiId> = HashSet::new();
    let mut pending: VecDeque<PhiId> = seeds.into_iter().collect();
    while let Some(phi_id) = pending.pop_front() {
        if !affected_phis.insert(phi_id) {
            continue;
        }
        let out = body.phi(phi_id).out();
        for &user in body.value(out).phi_users() {
            if !affected_phis.contains(&user) {
                pending.push_back(user);
            }
        }
    }
    if affected_phis.is_empty() {
        return;
    }

    let affected_values: HashSet<ValueId> = affected_phis
        .iter()
        .map(|&phi_id| body.phi(phi_id).out())
        .collect();
    for &value in &affected_values {
        body.set_value_type(value, TypeElement::Bottom);
    }

    let mut analysis = TypeAnalysis::new(session);
    analysis.widen_restricted(body, &affected_values);

    // Phi users of the region are inside it already; only instruction
    // users can still hold a stale type.
    let mut downstream: BTreeSet<ValueId> = BTreeSet::new();
    for &value in &affected_values {
        for &instr_id in body.value(value).users() {
            if let Some(out) = body.instruction(instr_id).out() {
                downstream.insert(out);
            }
        }
    }
    analysis.narrow_values(body, downstream);

    debug_assert!(
        is_at_fixed_point(session, body),
        "phi repair must leave the body at a fixed point"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InstrKind, MethodBodyBuilder, MethodSignature, ValueDef};
    use crate::lattice::nullability::Nullability;
    use crate::lattice::types::{PrimitiveType, TypeRef};
    use crate::test_fixtures::{java_session, named};

    /// Two phis feeding each other across a loop, typed, then broken by
    /// hand and repaired.
    #[test]
    fn test_repair_rebuilds_a_phi_cycle() {
        let session = java_session();
        let runtime_exception = named(&session, "java.lang.RuntimeException");
        let mut builder = MethodBodyBuilder::new(MethodSignature {
            holder: named(&session, "java.lang.String"),
            is_static: true,
            params: vec![
                TypeRef::class(runtime_exception),
                TypeRef::Primitive(PrimitiveType::Int),
            ],
            return_type: None,
        });
        let entry = builder.entry_block();
        let start = builder.argument_values()[0];
        let cond = builder.argument_values()[1];
        let header = builder.add_block();
        let latch = builder.add_block();
        let exit = builder.add_block();
        builder
            .add_instr(entry, InstrKind::Goto { target: header }, &[])
            .unwrap();
        let carried = builder.add_phi_placeholder(header);
        builder
            .add_instr(
                header,
                InstrKind::If {
                    then_target: latch,
                    else_target: exit,
                },
                &[cond],
            )
            .unwrap();
        let round_trip = builder.add_phi(latch, &[carried]).unwrap();
        builder
            .add_instr(latch, InstrKind::Goto { target: header }, &[])
            .unwrap();
        builder
            .set_phi_operands(carried, &[start, round_trip])
            .unwrap();
        let observed = builder
            .add_instr(exit, InstrKind::AssumeNotNull, &[carried])
            .unwrap()
            .unwrap();
        builder
            .add_instr(exit, InstrKind::Return, &[observed])
            .unwrap();
        let mut body = builder.finish().unwrap();

        let mut analysis = TypeAnalysis::new(&session);
        analysis.widen_method(&mut body);
        let typed = body.value_type(carried).clone();
        assert_eq!(
            typed.as_class().unwrap().class_ref(),
            runtime_exception
        );
        assert!(is_at_fixed_point(&session, &body));

        // Poison the cycle the way a careless rewrite would.
        body.set_value_type(carried, TypeElement::TOP);
        body.set_value_type(round_trip, TypeElement::TOP);
        assert!(!is_at_fixed_point(&session, &body));

        let ValueDef::Phi(seed) = body.value(carried).def() else {
            panic!("carried must be a phi");
        };
        repair_phi_cycles(&session, &mut body, [seed]);
        assert_eq!(body.value_type(carried), &typed);
        assert_eq!(body.value_type(round_trip), &typed);
        assert_eq!(
            body.value_type(observed).nullability(),
            Nullability::DefinitelyNotNull
        );
        assert!(is_at_fixed_point(&session, &body));
    }

    #[test]
    fn test_repair_with_no_seeds_is_a_no_op() {
        let session = java_session();
        let mut builder = MethodBodyBuilder::new(MethodSignature {
            holder: named(&session, "java.lang.String"),
            is_static: true,
            params: vec![TypeRef::Primitive(PrimitiveType::Int)],
            return_type: None,
        });
        let entry = builder.entry_block();
        let arg = builder.argument_values()[0];
        builder.add_instr(entry, InstrKind::Return, &[arg]).unwrap();
        let mut body = builder.finish().unwrap();
        TypeAnalysis::new(&session).widen_method(&mut body);

        repair_phi_cycles(&session, &mut body, std::iter::empty::<PhiId>());
        assert!(is_at_fixed_point(&session, &body));
    }
}
