//! Serializable summary of a typed method body.
//!
//! The report is a flat list of rows, one per SSA value in definition
//! order, with the type and nullability rendered as text. It exists for
//! test assertions and for dumping analysis results without handing out
//! the IR itself.

use serde::Serialize;

use crate::ir::{MethodBody, ValueDef};
use crate::session::Session;

/// One row per SSA value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValueReport {
    /// Raw value number.
    pub value: u32,
    /// What defines the value: `argument N`, an instruction name, or
    /// `phi bN`.
    pub defined_by: String,
    /// The rendered static type.
    pub ty: String,
    /// The rendered nullability.
    pub nullability: String,
}

/// The typing of a whole method body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeReport {
    pub values: Vec<ValueReport>,
}

impl TypeReport {
    /// Renders the current value types of `body`. Run the analysis first;
    /// an untyped body reports every value at `bottom`.
    pub fn of(session: &Session, body: &MethodBody) -> TypeReport {
        let graph = session.graph();
        let values = body
            .value_ids()
            .map(|value_id| {
                let value = body.value(value_id);
                let defined_by = match value.def() {
                    ValueDef::Argument(index) => format!("argument {}", index),
                    ValueDef::Instr(instr) => {
                        body.instruction(instr).kind().name().to_string()
                    }
                    ValueDef::Phi(phi) => format!("phi {}", body.phi(phi).block()),
                };
                let ty = body.value_type(value_id);
                ValueReport {
                    value: value_id.index() as u32,
                    defined_by,
                    ty: ty.display(graph).to_string(),
                    nullability: ty.nullability().to_string(),
                }
            })
            .collect();
        TypeReport { values }
    }
}

impl std::fmt::Display for TypeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.values {
            writeln!(
                f,
                "v{}: {} <- {}",
                row.value, row.ty, row.defined_by
            )?;
        }
        Ok(())
    }
}
