//! Construction of [`MethodBody`] values.
//!
//! The builder validates structure eagerly where it can (operand counts,
//! id validity, one terminator per block) and defers what needs the whole
//! body (control-flow edges, phi arity) to [`MethodBodyBuilder::finish`].
//! Loop phis are created as placeholders first and completed once their
//! back-edge operands exist.

use std::collections::BTreeSet;

use crate::error::IrError;
use crate::ir::{
    BasicBlock, BlockId, InstrId, InstrKind, Instruction, MethodBody, MethodSignature, Phi,
    PhiId, Value, ValueDef, ValueId,
};
use crate::lattice::types::TypeElement;

#[derive(Debug)]
pub struct MethodBodyBuilder {
    body: MethodBody,
    terminated: Vec<bool>,
    pending_phis: Vec<bool>,
}

impl MethodBodyBuilder {
    /// Starts a body with its entry block and one argument instruction per
    /// signature argument, receiver included.
    pub fn new(signature: MethodSignature) -> MethodBodyBuilder {
        let mut builder = MethodBodyBuilder {
            body: MethodBody {
                signature,
                blocks: Vec::new(),
                instructions: Vec::new(),
                values: Vec::new(),
                phis: Vec::new(),
                arguments: Vec::new(),
            },
            terminated: Vec::new(),
            pending_phis: Vec::new(),
        };
        let entry = builder.add_block();
        for index in 0..builder.body.signature.argument_count() {
            let instr_id = InstrId(builder.body.instructions.len() as u32);
            let value_id = ValueId(builder.body.values.len() as u32);
            builder.body.values.push(Value {
                def: ValueDef::Argument(index),
                ty: TypeElement::Bottom,
                users: BTreeSet::new(),
                phi_users: BTreeSet::new(),
            });
            builder.body.instructions.push(Instruction {
                kind: InstrKind::Argument { index },
                operands: Vec::new(),
                out: Some(value_id),
                block: entry,
            });
            builder.body.blocks[entry.index()].instructions.push(instr_id);
            builder.body.arguments.push(value_id);
        }
        builder
    }

    pub fn entry_block(&self) -> BlockId {
        BlockId(0)
    }

    /// Values of the argument instructions, in argument order.
    pub fn argument_values(&self) -> &[ValueId] {
        &self.body.arguments
    }

    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId(self.body.blocks.len() as u32);
        self.body.blocks.push(BasicBlock {
            predecessors: Vec::new(),
            successors: Vec::new(),
            phis: Vec::new(),
            instructions: Vec::new(),
        });
        self.terminated.push(false);
        id
    }

    /// Appends an instruction, returning its output value if it has one.
    pub fn add_instr(
        &mut self,
        block: BlockId,
        kind: InstrKind,
        operands: &[ValueId],
    ) -> Result<Option<ValueId>, IrError> {
        debug_assert!(block.index() < self.body.blocks.len(), "foreign block id");
        if self.terminated[block.index()] {
            return Err(IrError::BlockTerminated { block: block.0 });
        }
        if let Some(expected) = kind.expected_operands() {
            if operands.len() != expected {
                return Err(IrError::OperandCount {
                    kind: kind.name(),
                    expected,
                    found: operands.len(),
                });
            }
        }
        self.check_values(operands)?;
        for target in kind.targets() {
            if target.index() >= self.body.blocks.len() {
                return Err(IrError::UnknownBlock {
                    block: block.0,
                    target: target.0,
                });
            }
        }
        let is_terminator = kind.is_terminator();
        let instr_id = InstrId(self.body.instructions.len() as u32);
        let out = if kind.produces_value() {
            let value_id = ValueId(self.body.values.len() as u32);
            self.body.values.push(Value {
                def: ValueDef::Instr(instr_id),
                ty: TypeElement::Bottom,
                users: BTreeSet::new(),
                phi_users: BTreeSet::new(),
            });
            Some(value_id)
        } else {
            None
        };
        for &v in operands {
            self.body.values[v.index()].users.insert(instr_id);
        }
        self.body.instructions.push(Instruction {
            kind,
            operands: operands.to_vec(),
            out,
            block,
        });
        self.body.blocks[block.index()].instructions.push(instr_id);
        if is_terminator {
            self.terminated[block.index()] = true;
        }
        Ok(out)
    }

    /// Adds a phi with all operands known up front. The value it defines
    /// is returned for use as an operand.
    pub fn add_phi(&mut self, block: BlockId, operands: &[ValueId]) -> Result<ValueId, IrError> {
        let out = self.add_phi_placeholder(block);
        self.set_phi_operands(out, operands)?;
        Ok(out)
    }

    /// Adds a phi whose operands are not all available yet (a loop header
    /// phi before its back edge exists). The operands must be supplied via
    /// [`MethodBodyBuilder::set_phi_operands`] before `finish`.
    pub fn add_phi_placeholder(&mut self, block: BlockId) -> ValueId {
        debug_assert!(block.index() < self.body.blocks.len(), "foreign block id");
        let phi_id = PhiId(self.body.phis.len() as u32);
        let value_id = ValueId(self.body.values.len() as u32);
        self.body.values.push(Value {
            def: ValueDef::Phi(phi_id),
            ty: TypeElement::Bottom,
            users: BTreeSet::new(),
            phi_users: BTreeSet::new(),
        });
        self.body.phis.push(Phi {
            block,
            operands: Vec::new(),
            out: value_id,
        });
        self.body.blocks[block.index()].phis.push(phi_id);
        self.pending_phis.push(true);
        value_id
    }

    /// Sets (or replaces) the operands of the phi defining `phi_value`, in
    /// predecessor order.
    pub fn set_phi_operands(
        &mut self,
        phi_value: ValueId,
        operands: &[ValueId],
    ) -> Result<(), IrError> {
        if phi_value.index() >= self.body.values.len() {
            return Err(IrError::UnknownValue { value: phi_value.0 });
        }
        let ValueDef::Phi(phi_id) = self.body.values[phi_value.index()].def else {
            return Err(IrError::NotAPhi {
                value: phi_value.0,
            });
        };
        self.check_values(operands)?;
        let previous =
            std::mem::replace(&mut self.body.phis[phi_id.index()].operands, operands.to_vec());
        for old in previous {
            self.body.values[old.index()].phi_users.remove(&phi_id);
        }
        for &v in operands {
            self.body.values[v.index()].phi_users.insert(phi_id);
        }
        self.pending_phis[phi_id.index()] = false;
        Ok(())
    }

    /// Validates the whole body, wires up control-flow edges, and checks
    /// phi arity against predecessor counts.
    pub fn finish(self) -> Result<MethodBody, IrError> {
        let mut body = self.body;
        for (idx, terminated) in self.terminated.iter().enumerate() {
            if !terminated {
                return Err(IrError::MissingTerminator { block: idx as u32 });
            }
        }
        for (idx, pending) in self.pending_phis.iter().enumerate() {
            if *pending {
                return Err(IrError::UnsetPhi {
                    block: body.phis[idx].block.0,
                });
            }
        }
        // Every block is terminated, so the targets of its last
        // instruction are its successors. Walking sources in ascending
        // order keeps each predecessor list ascending too, the order phi
        // operands are defined against.
        let mut all_targets: Vec<Vec<BlockId>> = Vec::with_capacity(body.blocks.len());
        for block in &body.blocks {
            let targets = block
                .instructions
                .last()
                .map(|&i| body.instructions[i.index()].kind.targets())
                .unwrap_or_default();
            all_targets.push(targets);
        }
        for (source, targets) in all_targets.into_iter().enumerate() {
            for target in targets {
                body.blocks[target.index()]
                    .predecessors
                    .push(BlockId(source as u32));
                body.blocks[source].successors.push(target);
            }
        }
        for phi in &body.phis {
            let predecessors = body.blocks[phi.block.index()].predecessors.len();
            if phi.operands.len() != predecessors {
                return Err(IrError::PhiArity {
                    block: phi.block.0,
                    operands: phi.operands.len(),
                    predecessors,
                });
            }
        }
        Ok(body)
    }

    fn check_values(&self, values: &[ValueId]) -> Result<(), IrError> {
        for &v in values {
            if v.index() >= self.body.values.len() {
                return Err(IrError::UnknownValue { value: v.0 });
            }
        }
        Ok(())
    }
}
