//! The worklist solver computing a type for every SSA value.
//!
//! The solver runs in one of two directions and enforces it:
//!
//! - **Widening** moves values up the lattice from `bottom` toward a fixed
//!   point. Used for the initial typing of a body.
//! - **Narrowing** moves values down, after a refinement made some input
//!   more precise.
//!
//! The initial widening seeds in block order: argument instructions get
//! their declared types directly (the receiver known not-null),
//! instructions whose output type cannot depend on operands are evaluated
//! exactly once, and everything else starts at `bottom` and is enqueued.
//! From there each dequeued value is re-derived from its definition; when
//! its type changes, the outputs of its users are enqueued. The queue
//! holds each value at most once.
//!
//! A transfer function sees `bottom` operands while their definitions wait
//! in the queue, and answers `bottom` in kind, so no value ever moves
//! against the direction of the pass.

use std::collections::{HashSet, VecDeque};

use crate::ir::{InstrKind, MethodBody, ValueDef, ValueId};
use crate::lattice::types::TypeElement;
use crate::lattice::widening::WORKLIST_GROWTH_SANITY_FACTOR;
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Widening,
    Narrowing,
}

enum Seed {
    Direct(ValueId, TypeElement),
    Enqueue(ValueId),
}

/// Reusable solver state. One instance per thread; the session it borrows
/// is shared.
#[derive(Debug)]
pub struct TypeAnalysis<'s> {
    session: &'s Session,
    mode: Mode,
    worklist: VecDeque<ValueId>,
    queued: HashSet<ValueId>,
    restriction: Option<HashSet<ValueId>>,
}

impl<'s> TypeAnalysis<'s> {
    pub fn new(session: &'s Session) -> TypeAnalysis<'s> {
        TypeAnalysis {
            session,
            mode: Mode::Widening,
            worklist: VecDeque::new(),
            queued: HashSet::new(),
            restriction: None,
        }
    }

    /// Types every value of `body` from scratch, up to the least fixed
    /// point.
    pub fn widen_method(&mut self, body: &mut MethodBody) {
        self.prepare(Mode::Widening, None);
        let mut seeds = Vec::with_capacity(body.value_count());
        for block_id in body.block_ids() {
            let block = body.block(block_id);
            for &phi_id in block.phis() {
                seeds.push(Seed::Enqueue(body.phi(phi_id).out()));
            }
            for &instr_id in block.instructions() {
                let instr = body.instruction(instr_id);
                let Some(out) = instr.out() else { continue };
                if let InstrKind::Argument { index } = instr.kind() {
                    seeds.push(Seed::Direct(out, body.argument_type(self.session, *index)));
                } else if instr.kind().has_invariant_out_type() {
                    seeds.push(Seed::Direct(
                        out,
                        body.compute_instruction_type(self.session, instr_id),
                    ));
                } else {
                    seeds.push(Seed::Enqueue(out));
                }
            }
        }
        for seed in seeds {
            match seed {
                Seed::Direct(value, ty) => self.update(body, value, ty),
                Seed::Enqueue(value) => self.enqueue(value),
            }
        }
        self.drain(body);
    }

    /// Re-derives the given values and everything downstream, upward.
    pub fn widen_values<I>(&mut self, body: &mut MethodBody, values: I)
    where
        I: IntoIterator<Item = ValueId>,
    {
        self.prepare(Mode::Widening, None);
        for v in values {
            self.enqueue(v);
        }
        self.drain(body);
    }

    /// Re-derives the given values and everything downstream, downward.
    pub fn narrow_values<I>(&mut self, body: &mut MethodBody, values: I)
    where
        I: IntoIterator<Item = ValueId>,
    {
        self.prepare(Mode::Narrowing, None);
        for v in values {
            self.enqueue(v);
        }
        self.drain(body);
    }

    /// Widening pass that never propagates outside `affected`. Used by the
    /// phi cycle repair to rebuild a reset region without disturbing its
    /// surroundings.
    pub(crate) fn widen_restricted(&mut self, body: &mut MethodBody, affected: &HashSet<ValueId>) {
        self.prepare(Mode::Widening, Some(affected.clone()));
        for &v in affected {
            self.enqueue(v);
        }
        self.drain(body);
    }

    fn prepare(&mut self, mode: Mode, restriction: Option<HashSet<ValueId>>) {
        self.mode = mode;
        self.restriction = restriction;
        self.worklist.clear();
        self.queued.clear();
    }

    fn enqueue(&mut self, value: ValueId) {
        if self.queued.insert(value) {
            self.worklist.push_back(value);
        }
    }

    fn drain(&mut self, body: &mut MethodBody) {
        let mut processed = 0usize;
        while let Some(value) = self.worklist.pop_front() {
            self.queued.remove(&value);
            processed += 1;
            debug_assert!(
                processed <= WORKLIST_GROWTH_SANITY_FACTOR * body.value_count().max(1),
                "worklist is not converging, a transfer function oscillates"
            );
            let derived = match body.value(value).def() {
                ValueDef::Argument(index) => body.argument_type(self.session, index),
                ValueDef::Instr(instr) => body.compute_instruction_type(self.session, instr),
                ValueDef::Phi(phi) => body.compute_phi_type(self.session, phi),
            };
            self.update(body, value, derived);
        }
    }

    /// Installs `derived` for `value` if it differs, then enqueues the
    /// outputs of the value's users.
    fn update(&mut self, body: &mut MethodBody, value: ValueId, derived: TypeElement) {
        let current = body.value_type(value);
        if *current == derived {
            return;
        }
        match self.mode {
            Mode::Widening => debug_assert!(
                current.less_than_or_equal(self.session, &derived),
                "widening may only move a value up"
            ),
            Mode::Narrowing => debug_assert!(
                derived.less_than_or_equal(self.session, current),
                "narrowing may only move a value down"
            ),
        }
        body.set_value_type(value, derived);
        let mut user_outs: Vec<ValueId> = Vec::new();
        let changed = body.value(value);
        for &instr_id in changed.users() {
            if let Some(out) = body.instruction(instr_id).out() {
                user_outs.push(out);
            }
        }
        for &phi_id in changed.phi_users() {
            user_outs.push(body.phi(phi_id).out());
        }
        for out in user_outs {
            if let Some(allowed) = &self.restriction {
                if !allowed.contains(&out) {
                    continue;
                }
            }
            self.enqueue(out);
        }
    }
}

/// Every value agrees with a fresh derivation from its definition.
pub fn is_at_fixed_point(session: &Session, body: &MethodBody) -> bool {
    body.value_ids().all(|value| {
        let derived = match body.value(value).def() {
            ValueDef::Argument(index) => body.argument_type(session, index),
            ValueDef::Instr(instr) => body.compute_instruction_type(session, instr),
            ValueDef::Phi(phi) => body.compute_phi_type(session, phi),
        };
        derived == *body.value_type(value)
    })
}
