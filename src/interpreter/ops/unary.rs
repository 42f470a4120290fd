//! Unary operators and increment/decrement

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::memory::Memory;
use crate::parser::ast::BinOp;
use crate::transform::instrumented::{Place, UnaryOp};

use super::binary::evaluate_binary_op;

/// Apply `-` or `!` to an already evaluated operand
pub(crate) fn evaluate_unary_op(op: UnaryOp, value: Value, line: usize) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Float(x) => Ok(Value::Float(-x)),
            other => match other.as_int() {
                Some(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                    RuntimeError::IntegerOverflow {
                        operation: format!("-{}", n),
                        line,
                    }
                }),
                None => Err(RuntimeError::type_error(
                    format!("cannot negate {}", other.type_name()),
                    line,
                )),
            },
        },
    }
}

impl Machine {
    /// `++x` / `x--` on any assignable place
    ///
    /// Prefix forms yield the updated value, postfix forms the previous one.
    pub(crate) fn evaluate_inc_dec(
        &mut self,
        place: &Place,
        delta: i64,
        prefix: bool,
        memory: &mut Memory,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let slot = self.resolve_place(place, memory, line)?;
        let current = self.read_slot(&slot, memory, line)?;
        if !current.is_defined() {
            return Err(RuntimeError::type_error(
                "cannot increment or decrement undefined",
                line,
            ));
        }

        let updated = evaluate_binary_op(BinOp::Add, &current, &Value::Int(delta), line)?;
        self.write_slot(&slot, updated.clone(), memory, line)?;

        Ok(if prefix { updated } else { current })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_yields_bool() {
        assert_eq!(evaluate_unary_op(UnaryOp::Not, Value::Int(0), 1), Ok(Value::Bool(true)));
        assert_eq!(evaluate_unary_op(UnaryOp::Not, Value::Null, 1), Ok(Value::Bool(true)));
        assert_eq!(evaluate_unary_op(UnaryOp::Not, Value::from("s"), 1), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_negation() {
        assert_eq!(evaluate_unary_op(UnaryOp::Neg, Value::Int(4), 1), Ok(Value::Int(-4)));
        assert_eq!(evaluate_unary_op(UnaryOp::Neg, Value::Float(1.5), 1), Ok(Value::Float(-1.5)));
        assert!(matches!(
            evaluate_unary_op(UnaryOp::Neg, Value::Int(i64::MIN), 3),
            Err(RuntimeError::IntegerOverflow { line: 3, .. })
        ));
        assert!(matches!(
            evaluate_unary_op(UnaryOp::Neg, Value::Null, 3),
            Err(RuntimeError::TypeError { .. })
        ));
    }
}
